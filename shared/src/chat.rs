use crate::access;
use crate::error::ApiError;
use crate::projects::load_project;
use crate::store::Store;
use crate::types::{ChatMessage, PostMessageRequest};

/// Post a chat message to a project
pub async fn post_message(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<ChatMessage, ApiError> {
    let req: PostMessageRequest = serde_json::from_slice(body).map_err(ApiError::invalid_body)?;

    let sender = req.sender.trim();
    let text = req.text.trim();
    if sender.is_empty() || text.is_empty() {
        return Err(ApiError::BadRequest(
            "Message sender and text are required".to_string(),
        ));
    }

    let project = load_project(store, project_id).await?;
    access::require_access(&project, caller)?;

    let message = ChatMessage {
        sender: sender.to_string(),
        text: text.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        phase: project.phase,
    };

    store.append_chat(project_id, &message).await?;
    Ok(message)
}

/// Chat history in posting order
pub async fn list_messages(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
) -> Result<Vec<ChatMessage>, ApiError> {
    let project = load_project(store, project_id).await?;
    access::require_access(&project, caller)?;
    Ok(project.chat)
}
