//! Save endpoints for the per-phase sections of a project.
//!
//! Every save overwrites exactly one attribute of the project document, so two
//! collaborators saving different sections at the same time do not lose each
//! other's work.

use crate::access;
use crate::error::ApiError;
use crate::projects::{load_project, save_section};
use crate::store::Store;
use crate::types::{
    Project, ProjectSection, SaveConstraintsRequest, SaveEmpathyMapRequest, SaveIdeasRequest,
    SavePointOfViewRequest, SavePrioritizationRequest, SaveTechSpecRequest,
};
use serde::de::DeserializeOwned;

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::invalid_body)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn save(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    section: ProjectSection,
) -> Result<Project, ApiError> {
    let project = load_project(store, project_id).await?;
    access::require_edit(&project, caller)?;
    save_section(store, project_id, section).await
}

pub async fn save_empathy_map(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let mut map = parse::<SaveEmpathyMapRequest>(body)?.empathy_map;
    map.says = clean_list(map.says);
    map.thinks = clean_list(map.thinks);
    map.does = clean_list(map.does);
    map.feels = clean_list(map.feels);
    save(store, caller, project_id, ProjectSection::EmpathyMap(map)).await
}

pub async fn save_constraints(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let constraints = clean_list(parse::<SaveConstraintsRequest>(body)?.constraints);
    save(store, caller, project_id, ProjectSection::Constraints(constraints)).await
}

pub async fn save_point_of_view(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let pov = parse::<SavePointOfViewRequest>(body)?.point_of_view;
    save(store, caller, project_id, ProjectSection::PointOfView(pov)).await
}

/// Save the brainstormed ideas. Ideas without an id get a fresh one.
pub async fn save_ideas(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let mut ideas = parse::<SaveIdeasRequest>(body)?.ideas;

    for idea in ideas.iter_mut() {
        idea.text = idea.text.trim().to_string();
        if idea.text.is_empty() {
            return Err(ApiError::BadRequest("Ideas must have text".to_string()));
        }
        if idea.id.trim().is_empty() {
            idea.id = uuid::Uuid::new_v4().to_string();
        }
        if idea.author.is_none() {
            idea.author = Some(caller.trim().to_string());
        }
    }

    save(store, caller, project_id, ProjectSection::Ideas(ideas)).await
}

pub async fn save_prioritization(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let mut matrix = parse::<SavePrioritizationRequest>(body)?.prioritization;
    for quadrant in matrix.quadrants_mut() {
        *quadrant = clean_list(std::mem::take(quadrant));
    }
    save(store, caller, project_id, ProjectSection::Prioritization(matrix)).await
}

pub async fn save_tech_spec(
    store: &dyn Store,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<Project, ApiError> {
    let spec = parse::<SaveTechSpecRequest>(body)?.tech_spec;
    save(store, caller, project_id, ProjectSection::TechSpec(spec)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::tests::{seed_project, seed_user, RacingStore};
    use crate::projects::{get_project, share_project};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_outsider_cannot_save() {
        let store = MemoryStore::new();
        let project = seed_project(&store, "ana").await;

        let err = save_constraints(
            &store,
            "mallory",
            &project.project_id,
            br#"{"constraints": ["free"]}"#,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let stored = get_project(&store, "ana", &project.project_id).await.unwrap();
        assert!(stored.constraints.is_empty());
    }

    #[tokio::test]
    async fn test_view_collaborator_cannot_save() {
        let store = MemoryStore::new();
        seed_user(&store, "bea").await;
        let project = seed_project(&store, "ana").await;
        share_project(
            &store,
            "ana",
            &project.project_id,
            br#"{"username": "bea", "permission": "view"}"#,
        )
        .await
        .unwrap();

        let err = save_tech_spec(
            &store,
            "bea",
            &project.project_id,
            br#"{"tech_spec": {"overview": "app"}}"#,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_sections_do_not_overwrite_each_other() {
        let store = MemoryStore::new();
        seed_user(&store, "bea").await;
        let project = seed_project(&store, "ana").await;
        let id = project.project_id.clone();
        share_project(&store, "ana", &id, br#"{"username": "bea"}"#)
            .await
            .unwrap();

        save_constraints(&store, "ana", &id, br#"{"constraints": [" one semester ", ""]}"#)
            .await
            .unwrap();
        save_empathy_map(
            &store,
            "BEA",
            &id,
            br#"{"empathy_map": {"says": ["too loud"], "feels": ["tired"]}}"#,
        )
        .await
        .unwrap();

        let stored = get_project(&store, "ana", &id).await.unwrap();
        assert_eq!(stored.constraints, vec!["one semester".to_string()]);
        assert_eq!(stored.empathy_map.says, vec!["too loud".to_string()]);
        assert!(stored.empathy_map.thinks.is_empty());
    }

    #[tokio::test]
    async fn test_save_returns_stored_project() {
        let inner = MemoryStore::new();
        let project = seed_project(&inner, "ana").await;
        let id = project.project_id.clone();

        // a constraints save from another tab lands first
        let store = RacingStore::new(
            inner.clone(),
            ProjectSection::Constraints(vec!["other tab".to_string()]),
        );

        let saved = save_empathy_map(
            &store,
            "ana",
            &id,
            br#"{"empathy_map": {"thinks": ["is it open?"]}}"#,
        )
        .await
        .unwrap();
        assert_eq!(saved.empathy_map.thinks, vec!["is it open?".to_string()]);
        assert_eq!(saved.constraints, vec!["other tab".to_string()]);

        let stored = get_project(&inner, "ana", &id).await.unwrap();
        assert_eq!(saved, stored);
    }

    #[tokio::test]
    async fn test_save_ideas_assigns_ids_and_authors() {
        let store = MemoryStore::new();
        let project = seed_project(&store, "ana").await;

        let saved = save_ideas(
            &store,
            "ana",
            &project.project_id,
            br#"{"ideas": [{"text": "nap pods"}, {"id": "keep", "text": "quiet car", "author": "bea"}]}"#,
        )
        .await
        .unwrap();

        assert_eq!(saved.ideas.len(), 2);
        assert!(!saved.ideas[0].id.is_empty());
        assert_eq!(saved.ideas[0].author.as_deref(), Some("ana"));
        assert_eq!(saved.ideas[1].id, "keep");
        assert_eq!(saved.ideas[1].author.as_deref(), Some("bea"));

        let err = save_ideas(
            &store,
            "ana",
            &project.project_id,
            br#"{"ideas": [{"text": "  "}]}"#,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let store = MemoryStore::new();
        let project = seed_project(&store, "ana").await;

        let err = save_prioritization(&store, "ana", &project.project_id, b"{not json")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
