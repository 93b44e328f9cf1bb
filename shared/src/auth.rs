use crate::error::ApiError;
use crate::store::Store;
use crate::types::{LoginRequest, User};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check a password against a PHC-format hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| format!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Handle user login
pub async fn login(store: &dyn Store, body: &[u8]) -> Result<User, ApiError> {
    let req: LoginRequest = serde_json::from_slice(body).map_err(ApiError::invalid_body)?;

    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    tracing::info!("Authenticating user: {}", req.username.trim());

    let invalid = || ApiError::Unauthorized("Incorrect username or password".to_string());

    let record = store.get_user(&req.username).await?.ok_or_else(invalid)?;

    match verify_password(&req.password, &record.password_hash) {
        Ok(true) => {
            tracing::info!("Authentication successful for user: {}", record.user.username);
            Ok(record.user)
        }
        Ok(false) => Err(invalid()),
        Err(e) => {
            tracing::error!("Stored hash for {} is unusable: {}", record.user.username, e);
            Err(invalid())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::users;

    async fn store_with_user() -> MemoryStore {
        let store = MemoryStore::new();
        let body = serde_json::json!({
            "username": "ana",
            "email": "ana@uni.edu",
            "password": "correct horse"
        });
        users::register(&store, body.to_string().as_bytes())
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let store = store_with_user().await;
        let body = serde_json::json!({"username": "ana", "password": "wrong"});
        let err = login(&store, body.to_string().as_bytes()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_unknown_user_is_unauthorized() {
        let store = store_with_user().await;
        let body = serde_json::json!({"username": "nobody", "password": "correct horse"});
        let err = login(&store, body.to_string().as_bytes()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_is_case_insensitive_on_username() {
        let store = store_with_user().await;
        let body = serde_json::json!({"username": "ANA", "password": "correct horse"});
        let user = login(&store, body.to_string().as_bytes()).await.unwrap();
        assert_eq!(user.username, "ana");
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let store = MemoryStore::new();
        let err = login(&store, br#"{"username": "ana"}"#).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
