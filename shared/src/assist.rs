//! Generation endpoints: build a prompt from the project, ask the configured
//! models in order, and fall back to canned content when none of them answers
//! with something usable. The response shape is the same either way.

use crate::access;
use crate::error::ApiError;
use crate::generation::{fallback, generate_with_fallback, parse, prompt, Source};
use crate::projects::load_project;
use crate::types::{
    AssistantRequest, GenerateIdeasRequest, PointOfView, PrioritizationMatrix, Project, TechSpec,
};
use crate::AppState;
use serde::de::DeserializeOwned;
use serde::Serialize;

const DEFAULT_IDEA_COUNT: usize = 5;
const MAX_IDEA_COUNT: usize = 20;

#[derive(Debug, Serialize)]
pub struct IdeasResponse {
    pub ideas: Vec<String>,
    pub source: Source,
}

#[derive(Debug, Serialize)]
pub struct PointOfViewResponse {
    pub point_of_view: PointOfView,
    pub source: Source,
}

#[derive(Debug, Serialize)]
pub struct PrioritizationResponse {
    pub prioritization: PrioritizationMatrix,
    pub source: Source,
}

#[derive(Debug, Serialize)]
pub struct TechSpecResponse {
    pub tech_spec: TechSpec,
    pub source: Source,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub reply: String,
    pub source: Source,
}

/// Generation requests may be sent without a body.
fn parse_optional<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(ApiError::invalid_body)
}

async fn accessible_project(
    state: &AppState,
    caller: &str,
    project_id: &str,
) -> Result<Project, ApiError> {
    let project = load_project(state.store.as_ref(), project_id).await?;
    access::require_access(&project, caller)?;
    Ok(project)
}

async fn ask(state: &AppState, user_prompt: &str) -> Option<String> {
    generate_with_fallback(
        state.generator.as_ref(),
        &state.config.llm_models,
        prompt::SYSTEM,
        user_prompt,
    )
    .await
}

pub async fn generate_ideas(
    state: &AppState,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<IdeasResponse, ApiError> {
    let req: GenerateIdeasRequest = parse_optional(body)?;
    let count = req
        .count
        .unwrap_or(DEFAULT_IDEA_COUNT)
        .clamp(1, MAX_IDEA_COUNT);

    let project = accessible_project(state, caller, project_id).await?;
    let raw = ask(state, &prompt::ideas(&project, count, req.focus.as_deref())).await;

    match raw.and_then(|r| parse::parse_string_list(&r, "ideas")) {
        Some(mut ideas) => {
            ideas.truncate(count);
            Ok(IdeasResponse {
                ideas,
                source: Source::Model,
            })
        }
        None => Ok(IdeasResponse {
            ideas: fallback::ideas(count),
            source: Source::Fallback,
        }),
    }
}

pub async fn generate_point_of_view(
    state: &AppState,
    caller: &str,
    project_id: &str,
) -> Result<PointOfViewResponse, ApiError> {
    let project = accessible_project(state, caller, project_id).await?;
    let raw = ask(state, &prompt::persona(&project)).await;

    let parsed = raw
        .and_then(|r| parse::parse_object::<PointOfView>(&r))
        .filter(|pov| !pov.need.trim().is_empty());

    Ok(match parsed {
        Some(point_of_view) => PointOfViewResponse {
            point_of_view,
            source: Source::Model,
        },
        None => PointOfViewResponse {
            point_of_view: fallback::point_of_view(),
            source: Source::Fallback,
        },
    })
}

pub async fn generate_prioritization(
    state: &AppState,
    caller: &str,
    project_id: &str,
) -> Result<PrioritizationResponse, ApiError> {
    let project = accessible_project(state, caller, project_id).await?;

    if project.ideas.is_empty() {
        return Ok(PrioritizationResponse {
            prioritization: PrioritizationMatrix::default(),
            source: Source::Fallback,
        });
    }

    let raw = ask(state, &prompt::prioritization(&project)).await;

    Ok(
        match raw.and_then(|r| parse::parse_object::<PrioritizationMatrix>(&r)) {
            Some(matrix) => PrioritizationResponse {
                prioritization: parse::sanitize_matrix(matrix, &project.ideas),
                source: Source::Model,
            },
            None => PrioritizationResponse {
                prioritization: fallback::prioritization(&project.ideas),
                source: Source::Fallback,
            },
        },
    )
}

pub async fn generate_tech_spec(
    state: &AppState,
    caller: &str,
    project_id: &str,
) -> Result<TechSpecResponse, ApiError> {
    let project = accessible_project(state, caller, project_id).await?;
    let raw = ask(state, &prompt::tech_spec(&project)).await;

    let parsed = raw
        .and_then(|r| parse::parse_object::<TechSpec>(&r))
        .filter(|spec| !spec.overview.trim().is_empty());

    Ok(match parsed {
        Some(tech_spec) => TechSpecResponse {
            tech_spec,
            source: Source::Model,
        },
        None => TechSpecResponse {
            tech_spec: fallback::tech_spec(&project.name),
            source: Source::Fallback,
        },
    })
}

pub async fn assistant_reply(
    state: &AppState,
    caller: &str,
    project_id: &str,
    body: &[u8],
) -> Result<AssistantResponse, ApiError> {
    let req: AssistantRequest = parse_optional(body)?;
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let project = accessible_project(state, caller, project_id).await?;

    Ok(match ask(state, &prompt::assistant(&project, message)).await {
        Some(reply) => AssistantResponse {
            reply: reply.trim().to_string(),
            source: Source::Model,
        },
        None => AssistantResponse {
            reply: fallback::assistant(project.phase),
            source: Source::Fallback,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generation::tests::ScriptedGenerator;
    use crate::generation::TextGenerator;
    use crate::phases::save_ideas;
    use crate::projects::tests::seed_project;
    use crate::store::MemoryStore;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn state(store: MemoryStore, generator: impl TextGenerator + 'static) -> AppState {
        let config = Config::from_lookup(|k| {
            let vars: HashMap<&str, &str> = [("LLM_MODELS", "m1,m2")].into_iter().collect();
            vars.get(k).map(|v| v.to_string())
        });
        AppState {
            store: Arc::new(store),
            generator: Arc::new(generator),
            config,
        }
    }

    async fn project_with_ideas(store: &MemoryStore) -> String {
        let project = seed_project(store, "ana").await;
        save_ideas(
            store,
            "ana",
            &project.project_id,
            br#"{"ideas": [{"text": "Nap pods"}, {"text": "Quiet car"}]}"#,
        )
        .await
        .unwrap();
        project.project_id
    }

    #[tokio::test]
    async fn test_failing_models_still_return_documented_shapes() {
        let store = MemoryStore::new();
        let id = project_with_ideas(&store).await;
        let state = state(store, ScriptedGenerator::failing());

        let ideas = generate_ideas(&state, "ana", &id, b"").await.unwrap();
        assert_eq!(ideas.source, Source::Fallback);
        assert_eq!(ideas.ideas.len(), DEFAULT_IDEA_COUNT);

        let pov = generate_point_of_view(&state, "ana", &id).await.unwrap();
        assert_eq!(pov.source, Source::Fallback);
        assert!(!pov.point_of_view.need.is_empty());

        let matrix = generate_prioritization(&state, "ana", &id).await.unwrap();
        assert_eq!(matrix.source, Source::Fallback);
        assert_eq!(matrix.prioritization.fill_ins, vec!["Nap pods", "Quiet car"]);

        let spec = generate_tech_spec(&state, "ana", &id).await.unwrap();
        assert_eq!(spec.source, Source::Fallback);
        assert!(spec.tech_spec.overview.contains("Campus food"));

        let reply = assistant_reply(&state, "ana", &id, br#"{"message": "help"}"#)
            .await
            .unwrap();
        assert_eq!(reply.source, Source::Fallback);
        assert!(reply.reply.contains("Tip for this phase"));

        let json = serde_json::to_value(&ideas).unwrap();
        assert_eq!(json["source"], "fallback");
        assert!(json["ideas"].is_array());
    }

    #[tokio::test]
    async fn test_second_model_answer_is_used() {
        let store = MemoryStore::new();
        let id = project_with_ideas(&store).await;
        let state = state(
            store,
            ScriptedGenerator::with_reply("m2", "```json\n[\"Swap shelf\", \"Night bus\"]\n```"),
        );

        let ideas = generate_ideas(&state, "ana", &id, br#"{"count": 1}"#)
            .await
            .unwrap();
        assert_eq!(ideas.source, Source::Model);
        assert_eq!(ideas.ideas, vec!["Swap shelf"]);
    }

    #[tokio::test]
    async fn test_unparseable_output_falls_back() {
        let store = MemoryStore::new();
        let id = project_with_ideas(&store).await;
        let state = state(
            store,
            ScriptedGenerator::with_reply("m1", "Sorry, I can't do JSON today."),
        );

        let spec = generate_tech_spec(&state, "ana", &id).await.unwrap();
        assert_eq!(spec.source, Source::Fallback);
    }

    #[tokio::test]
    async fn test_model_matrix_is_sanitized() {
        let store = MemoryStore::new();
        let id = project_with_ideas(&store).await;
        let state = state(
            store,
            ScriptedGenerator::with_reply(
                "m1",
                r#"{"quick_wins": ["quiet car", "Hoverboards"], "major_projects": []}"#,
            ),
        );

        let matrix = generate_prioritization(&state, "ana", &id).await.unwrap();
        assert_eq!(matrix.source, Source::Model);
        assert_eq!(matrix.prioritization.quick_wins, vec!["Quiet car"]);
        assert_eq!(matrix.prioritization.fill_ins, vec!["Nap pods"]);
    }

    #[tokio::test]
    async fn test_generation_requires_access_and_message() {
        let store = MemoryStore::new();
        let id = project_with_ideas(&store).await;
        let state = state(store, ScriptedGenerator::failing());

        assert!(matches!(
            generate_ideas(&state, "eve", &id, b"").await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            assistant_reply(&state, "ana", &id, br#"{"message": "  "}"#).await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
