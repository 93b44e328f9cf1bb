use crate::access;
use crate::error::{ApiError, StoreError};
use crate::store::Store;
use crate::types::{
    Collaborator, CreateProjectRequest, Permission, Phase, Project, ProjectSection,
    SetPhaseRequest, ShareProjectRequest,
};

const SHARE_ATTEMPTS: usize = 3;

/// Fetch a project or fail with 404.
pub async fn load_project(store: &dyn Store, project_id: &str) -> Result<Project, ApiError> {
    store
        .get_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Write one section and return the project as the store now holds it.
pub(crate) async fn save_section(
    store: &dyn Store,
    project_id: &str,
    section: ProjectSection,
) -> Result<Project, ApiError> {
    let now = chrono::Utc::now().to_rfc3339();
    let project = store
        .update_section(project_id, &section, &now, None)
        .await?;
    tracing::info!("Saved {} for project {}", section.attribute(), project_id);
    Ok(project)
}

/// Add `username` to the collaborators, or change their permission if present.
fn with_collaborator(
    shared_with: &[Collaborator],
    username: &str,
    permission: Permission,
) -> Vec<Collaborator> {
    let mut shared_with = shared_with.to_vec();
    let key = username.to_lowercase();
    match shared_with
        .iter()
        .position(|c| c.username.to_lowercase() == key)
    {
        Some(i) => shared_with[i].permission = permission,
        None => shared_with.push(Collaborator {
            username: username.to_string(),
            permission,
        }),
    }
    shared_with
}

/// Create a new project owned by the caller
pub async fn create_project(
    store: &dyn Store,
    caller: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let req: CreateProjectRequest =
        serde_json::from_slice(body).map_err(ApiError::invalid_body)?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let project = Project {
        project_id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        phase: Phase::default(),
        owner: caller.trim().to_string(),
        shared_with: Vec::new(),
        chat: Vec::new(),
        empathy_map: Default::default(),
        constraints: Vec::new(),
        point_of_view: None,
        ideas: Vec::new(),
        prioritization: Default::default(),
        tech_spec: None,
        created_at: now.clone(),
        updated_at: now,
    };

    store.create_project(&project).await?;
    tracing::info!("[CREATE] Project {} created by {}", project.project_id, caller);

    Ok(project)
}

/// List projects the caller owns or is shared on, newest first
pub async fn list_projects(store: &dyn Store, caller: &str) -> Result<Vec<Project>, ApiError> {
    let mut projects: Vec<Project> = store
        .list_projects(caller)
        .await?
        .into_iter()
        // a link can outlive a removed share
        .filter(|p| access::can_access(p, caller))
        .collect();
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(projects)
}

/// Get a specific project
pub async fn get_project(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
) -> Result<Project, ApiError> {
    let project = load_project(store, project_id).await?;
    access::require_access(&project, caller)?;
    Ok(project)
}

/// Share a project with another user. Owner only.
pub async fn share_project(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let req: ShareProjectRequest =
        serde_json::from_slice(body).map_err(ApiError::invalid_body)?;
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }

    let project = load_project(store, project_id).await?;
    access::require_owner(&project, caller)?;

    if access::is_owner(&project, &req.username) {
        return Err(ApiError::BadRequest(
            "Project is already owned by this user".to_string(),
        ));
    }

    let target = store
        .get_user(&req.username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let username = target.user.username;

    store.link_member(project_id, &username).await?;

    // shared_with is written whole, so only write over the copy we read
    let mut project = project;
    let mut attempt = 1;
    loop {
        let section = ProjectSection::SharedWith(with_collaborator(
            &project.shared_with,
            &username,
            req.permission,
        ));
        let now = chrono::Utc::now().to_rfc3339();

        match store
            .update_section(project_id, &section, &now, Some(project.updated_at.as_str()))
            .await
        {
            Ok(updated) => {
                tracing::info!("Project {} shared with {}", project_id, username);
                return Ok(updated);
            }
            Err(StoreError::Stale) if attempt < SHARE_ATTEMPTS => {
                tracing::warn!(
                    "Project {} changed while sharing with {}, retrying ({}/{})",
                    project_id,
                    username,
                    attempt,
                    SHARE_ATTEMPTS
                );
                project = load_project(store, project_id).await?;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Move the project to another phase
pub async fn set_phase(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let req: SetPhaseRequest = serde_json::from_slice(body).map_err(ApiError::invalid_body)?;
    let phase = Phase::parse(&req.phase)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown phase: {}", req.phase)))?;

    let project = load_project(store, project_id).await?;
    access::require_edit(&project, caller)?;

    save_section(store, project_id, ProjectSection::Phase(phase)).await
}
