use crate::auth;
use crate::error::ApiError;
use crate::store::Store;
use crate::types::{RegisterRequest, Role, User, UserRecord};

const SEARCH_LIMIT: usize = 20;

/// Names that collide with fixed `/users/...` routes.
const RESERVED_USERNAMES: &[&str] = &["search"];

/// Register a new user
pub async fn register(store: &dyn Store, body: &[u8]) -> Result<User, ApiError> {
    let req: RegisterRequest = serde_json::from_slice(body).map_err(ApiError::invalid_body)?;

    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username, email and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Username '{}' is reserved",
            username
        )));
    }

    let role = match req.role.as_deref() {
        None => Role::default(),
        Some(r) => Role::parse(r)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown role: {}", r)))?,
    };

    let password_hash = auth::hash_password(&req.password).map_err(ApiError::Internal)?;

    let user = User {
        username: username.to_string(),
        email: email.to_string(),
        date_of_birth: req.date_of_birth,
        is_admin: role == Role::Admin,
        role,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    store
        .create_user(&UserRecord {
            user: user.clone(),
            password_hash,
        })
        .await?;

    tracing::info!("Registered user: {}", user.username);
    Ok(user)
}

/// Get a single user by username
pub async fn get_user(store: &dyn Store, username: &str) -> Result<User, ApiError> {
    store
        .get_user(username)
        .await?
        .map(|r| r.user)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// List all users, sorted by username
pub async fn list_users(store: &dyn Store) -> Result<Vec<User>, ApiError> {
    let mut users: Vec<User> = store
        .list_users()
        .await?
        .into_iter()
        .map(|r| r.user)
        .collect();
    users.sort_by_key(|u| u.username.to_lowercase());
    Ok(users)
}

/// Find users whose username or email contains `query`
pub async fn search_users(store: &dyn Store, query: Option<&str>) -> Result<Vec<User>, ApiError> {
    let needle = query.unwrap_or("").trim().to_lowercase();
    if needle.is_empty() {
        return Err(ApiError::BadRequest("Missing search query".to_string()));
    }

    let mut users: Vec<User> = list_users(store)
        .await?
        .into_iter()
        .filter(|u| {
            u.username.to_lowercase().contains(&needle) || u.email.to_lowercase().contains(&needle)
        })
        .collect();
    users.truncate(SEARCH_LIMIT);
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn body(username: &str, email: &str) -> Vec<u8> {
        serde_json::json!({
            "username": username,
            "email": email,
            "password": "pw",
            "role": "teacher"
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        register(&store, &body("ana", "ana@uni.edu")).await.unwrap();

        let err = register(&store, &body("Ana", "ana2@uni.edu")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        register(&store, &body("ana", "ana@uni.edu")).await.unwrap();

        let err = register(&store, &body("bea", "ANA@uni.edu")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_sets_role_and_admin_flag() {
        let store = MemoryStore::new();
        let teacher = register(&store, &body("tom", "tom@uni.edu")).await.unwrap();
        assert_eq!(teacher.role, Role::Teacher);
        assert!(!teacher.is_admin);

        let admin_body = serde_json::json!({
            "username": "root",
            "email": "root@uni.edu",
            "password": "pw",
            "role": "admin"
        });
        let admin = register(&store, admin_body.to_string().as_bytes()).await.unwrap();
        assert!(admin.is_admin);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let store = MemoryStore::new();
        let missing = register(&store, br#"{"username": "ana"}"#).await.unwrap_err();
        assert!(matches!(missing, ApiError::BadRequest(_)));

        let bad_email = register(&store, &body("ana", "not-an-email")).await.unwrap_err();
        assert!(matches!(bad_email, ApiError::BadRequest(_)));

        let reserved = register(&store, &body("Search", "s@uni.edu")).await.unwrap_err();
        assert!(matches!(reserved, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_get_user() {
        let store = MemoryStore::new();
        register(&store, &body("ana", "ana@uni.edu")).await.unwrap();

        assert_eq!(get_user(&store, "ANA").await.unwrap().username, "ana");
        assert!(matches!(
            get_user(&store, "ghost").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_returns_at_most_twenty() {
        let store = MemoryStore::new();
        // inserted directly to skip password hashing
        for i in 0..25 {
            let username = format!("user{:02}", i);
            let record = UserRecord {
                user: User {
                    email: format!("{}@uni.edu", username),
                    username,
                    date_of_birth: None,
                    is_admin: false,
                    role: Role::Student,
                    created_at: String::new(),
                },
                password_hash: String::new(),
            };
            store.create_user(&record).await.unwrap();
        }

        let found = search_users(&store, Some("user")).await.unwrap();
        assert_eq!(found.len(), SEARCH_LIMIT);
        assert_eq!(found[0].username, "user00");
        assert_eq!(found[19].username, "user19");
    }

    #[tokio::test]
    async fn test_search_matches_username_or_email() {
        let store = MemoryStore::new();
        register(&store, &body("ana", "ana@uni.edu")).await.unwrap();
        register(&store, &body("bea", "bea@college.org")).await.unwrap();
        register(&store, &body("carla", "carla@uni.edu")).await.unwrap();

        let found = search_users(&store, Some("UNI")).await.unwrap();
        let names: Vec<_> = found.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["ana", "carla"]);

        assert!(matches!(
            search_users(&store, Some("  ")).await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
