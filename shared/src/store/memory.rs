use super::{email_key, user_key, Store};
use crate::error::StoreError;
use crate::types::{ChatMessage, Project, ProjectSection, UserRecord};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    emails: HashMap<String, String>,
    projects: HashMap<String, Project>,
    // username key -> project ids
    members: HashMap<String, BTreeSet<String>>,
}

/// In-memory Store for tests and local runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let key = user_key(&record.user.username);
        let email = email_key(&record.user.email);

        if inner.users.contains_key(&key) {
            return Err(StoreError::Conflict("username".to_string()));
        }
        if inner.emails.contains_key(&email) {
            return Err(StoreError::Conflict("email".to_string()));
        }

        inner.emails.insert(email, key.clone());
        inner.users.insert(key, record.clone());
        Ok(())
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock()?.users.get(&user_key(username)).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    async fn create_project(&self, project: &Project) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.projects.contains_key(&project.project_id) {
            return Err(StoreError::Conflict("project".to_string()));
        }
        inner
            .members
            .entry(user_key(&project.owner))
            .or_default()
            .insert(project.project_id.clone());
        inner.projects.insert(project.project_id.clone(), project.clone());
        Ok(())
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, StoreError> {
        Ok(self.lock()?.projects.get(project_id).cloned())
    }

    async fn list_projects(&self, username: &str) -> Result<Vec<Project>, StoreError> {
        let inner = self.lock()?;
        let projects = inner
            .members
            .get(&user_key(username))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.projects.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(projects)
    }

    async fn update_section(
        &self,
        project_id: &str,
        section: &ProjectSection,
        updated_at: &str,
        expected_updated_at: Option<&str>,
    ) -> Result<Project, StoreError> {
        let mut inner = self.lock()?;
        let project = inner
            .projects
            .get_mut(project_id)
            .ok_or(StoreError::NotFound)?;
        if expected_updated_at.is_some_and(|expected| project.updated_at != expected) {
            return Err(StoreError::Stale);
        }
        section.clone().apply(project);
        project.updated_at = updated_at.to_string();
        Ok(project.clone())
    }

    async fn link_member(&self, project_id: &str, username: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if !inner.projects.contains_key(project_id) {
            return Err(StoreError::NotFound);
        }
        inner
            .members
            .entry(user_key(username))
            .or_default()
            .insert(project_id.to_string());
        Ok(())
    }

    async fn append_chat(&self, project_id: &str, message: &ChatMessage) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let project = inner
            .projects
            .get_mut(project_id)
            .ok_or(StoreError::NotFound)?;
        project.chat.push(message.clone());
        Ok(())
    }
}
