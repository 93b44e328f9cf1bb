use crate::error::ApiError;
use crate::types::{Permission, Project};

fn same_user(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub fn is_owner(project: &Project, username: &str) -> bool {
    same_user(&project.owner, username)
}

/// Owner or anyone on the shared-with list.
pub fn can_access(project: &Project, username: &str) -> bool {
    is_owner(project, username)
        || project
            .shared_with
            .iter()
            .any(|c| same_user(&c.username, username))
}

/// Owner or a collaborator with edit permission.
pub fn can_edit(project: &Project, username: &str) -> bool {
    is_owner(project, username)
        || project
            .shared_with
            .iter()
            .any(|c| c.permission == Permission::Edit && same_user(&c.username, username))
}

pub fn require_access(project: &Project, username: &str) -> Result<(), ApiError> {
    if can_access(project, username) {
        Ok(())
    } else {
        tracing::warn!(
            "{} denied access to project {}",
            username,
            project.project_id
        );
        Err(ApiError::Forbidden(
            "You do not have access to this project".to_string(),
        ))
    }
}

pub fn require_edit(project: &Project, username: &str) -> Result<(), ApiError> {
    if can_edit(project, username) {
        Ok(())
    } else {
        tracing::warn!(
            "{} denied edit on project {}",
            username,
            project.project_id
        );
        Err(ApiError::Forbidden(
            "You are not allowed to modify this project".to_string(),
        ))
    }
}

pub fn require_owner(project: &Project, username: &str) -> Result<(), ApiError> {
    if is_owner(project, username) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only the project owner can do this".to_string(),
        ))
    }
}
