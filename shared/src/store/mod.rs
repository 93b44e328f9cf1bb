pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::types::{ChatMessage, Project, ProjectSection, UserRecord};
use async_trait::async_trait;

/// Document store for users and projects.
///
/// Usernames and emails are keyed case-insensitively. Project updates touch a
/// single attribute so writers of different sections never clobber each other.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::Conflict`] when the
    /// username or email is taken.
    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError>;

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Insert a project and link it to its owner.
    async fn create_project(&self, project: &Project) -> Result<(), StoreError>;

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, StoreError>;

    /// Projects linked to `username`, as owner or collaborator.
    async fn list_projects(&self, username: &str) -> Result<Vec<Project>, StoreError>;

    /// Overwrite one section and return the project as stored after the write.
    ///
    /// With `expected_updated_at`, the write only lands if the project's
    /// `updated_at` still has that value, otherwise [`StoreError::Stale`].
    /// Unknown ids fail with [`StoreError::NotFound`].
    async fn update_section(
        &self,
        project_id: &str,
        section: &ProjectSection,
        updated_at: &str,
        expected_updated_at: Option<&str>,
    ) -> Result<Project, StoreError>;

    /// Make the project show up in `username`'s project list.
    async fn link_member(&self, project_id: &str, username: &str) -> Result<(), StoreError>;

    /// Append to the chat history.
    async fn append_chat(&self, project_id: &str, message: &ChatMessage) -> Result<(), StoreError>;
}

pub(crate) fn user_key(username: &str) -> String {
    username.trim().to_lowercase()
}

pub(crate) fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
