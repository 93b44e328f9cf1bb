use design_studio_shared::{
    assist, auth, chat, error::ApiError, phases, projects, response, users, AppState,
};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use std::sync::Arc;

/// Username supplied by the client in the `X-Username` header.
fn caller(event: &Request) -> Result<String, ApiError> {
    event
        .headers()
        .get("X-Username")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-Username header".to_string()))
}

/// Paths that exist for some method; used to tell 405 from 404.
fn known_path(parts: &[&str]) -> bool {
    matches!(
        parts,
        ["login"]
            | ["users"]
            | ["users", _]
            | ["projects"]
            | ["projects", _]
            | ["projects", _, "share"]
            | ["projects", _, "phase"]
            | ["projects", _, "empathy-map"]
            | ["projects", _, "constraints"]
            | ["projects", _, "point-of-view"]
            | ["projects", _, "ideas"]
            | ["projects", _, "prioritization"]
            | ["projects", _, "tech-spec"]
            | ["projects", _, "chat"]
            | ["projects", _, "generate", _]
    )
}

/// Whether `method` is served on a known `/projects` path.
fn project_method_allowed(method: &Method, parts: &[&str]) -> bool {
    match parts {
        ["projects"] | ["projects", _, "chat"] => {
            *method == Method::GET || *method == Method::POST
        }
        ["projects", _] => *method == Method::GET,
        ["projects", _, "share"] | ["projects", _, "generate", _] => *method == Method::POST,
        // the per-section saves
        ["projects", _, _] => *method == Method::PUT,
        _ => false,
    }
}

/// Main Lambda handler - routes requests to the domain operations
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body: &[u8] = event.body();
    tracing::info!("API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        return response::preflight();
    }

    let store = state.store.as_ref();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, parts.as_slice()) {
        // --- AUTH ---
        (&Method::POST, ["login"]) => response::respond(StatusCode::OK, auth::login(store, body).await),

        // --- USERS ---
        (&Method::POST, ["users"]) => {
            response::respond(StatusCode::CREATED, users::register(store, body).await)
        }
        (&Method::GET, ["users"]) => response::respond(StatusCode::OK, users::list_users(store).await),
        // GET /users/search?q= - find users by username or email
        (&Method::GET, ["users", "search"]) => {
            let query = event
                .query_string_parameters_ref()
                .and_then(|params| params.first("q"))
                .map(|q| q.to_string());
            response::respond(
                StatusCode::OK,
                users::search_users(store, query.as_deref()).await,
            )
        }
        (&Method::GET, ["users", username]) => {
            response::respond(StatusCode::OK, users::get_user(store, username).await)
        }

        // --- PROJECTS --- (all require a caller)
        (_, ["projects", ..]) if known_path(&parts) => {
            if !project_method_allowed(method, &parts) {
                tracing::warn!("Method {} not allowed on {}", method, path);
                return response::method_not_allowed();
            }
            let caller = match caller(&event) {
                Ok(c) => c,
                Err(e) => return response::error(&e),
            };
            route_project(&state, method, &parts, &caller, body).await
        }

        _ if known_path(&parts) => {
            tracing::warn!("Method {} not allowed on {}", method, path);
            response::method_not_allowed()
        }
        _ => {
            tracing::warn!("No route matched - Method: {} Path: {}", method, path);
            response::not_found()
        }
    }
}

async fn route_project(
    state: &AppState,
    method: &Method,
    parts: &[&str],
    caller: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let store = state.store.as_ref();

    match (method, parts) {
        // POST /projects - create project
        (&Method::POST, ["projects"]) => response::respond(
            StatusCode::CREATED,
            projects::create_project(store, caller, body).await,
        ),
        // GET /projects - list caller's projects
        (&Method::GET, ["projects"]) => {
            response::respond(StatusCode::OK, projects::list_projects(store, caller).await)
        }
        // GET /projects/{id} - get project
        (&Method::GET, ["projects", project_id]) => response::respond(
            StatusCode::OK,
            projects::get_project(store, caller, project_id).await,
        ),
        // POST /projects/{id}/share - add or update a collaborator
        (&Method::POST, ["projects", project_id, "share"]) => response::respond(
            StatusCode::OK,
            projects::share_project(store, caller, project_id, body).await,
        ),
        // PUT /projects/{id}/phase - move to another phase
        (&Method::PUT, ["projects", project_id, "phase"]) => response::respond(
            StatusCode::OK,
            projects::set_phase(store, caller, project_id, body).await,
        ),

        // --- PHASE SECTIONS ---
        (&Method::PUT, ["projects", project_id, "empathy-map"]) => response::respond(
            StatusCode::OK,
            phases::save_empathy_map(store, caller, project_id, body).await,
        ),
        (&Method::PUT, ["projects", project_id, "constraints"]) => response::respond(
            StatusCode::OK,
            phases::save_constraints(store, caller, project_id, body).await,
        ),
        (&Method::PUT, ["projects", project_id, "point-of-view"]) => response::respond(
            StatusCode::OK,
            phases::save_point_of_view(store, caller, project_id, body).await,
        ),
        (&Method::PUT, ["projects", project_id, "ideas"]) => response::respond(
            StatusCode::OK,
            phases::save_ideas(store, caller, project_id, body).await,
        ),
        (&Method::PUT, ["projects", project_id, "prioritization"]) => response::respond(
            StatusCode::OK,
            phases::save_prioritization(store, caller, project_id, body).await,
        ),
        (&Method::PUT, ["projects", project_id, "tech-spec"]) => response::respond(
            StatusCode::OK,
            phases::save_tech_spec(store, caller, project_id, body).await,
        ),

        // --- CHAT ---
        (&Method::GET, ["projects", project_id, "chat"]) => response::respond(
            StatusCode::OK,
            chat::list_messages(store, caller, project_id).await,
        ),
        (&Method::POST, ["projects", project_id, "chat"]) => response::respond(
            StatusCode::CREATED,
            chat::post_message(store, caller, project_id, body).await,
        ),

        // --- GENERATION ---
        (&Method::POST, ["projects", project_id, "generate", "ideas"]) => response::respond(
            StatusCode::OK,
            assist::generate_ideas(state, caller, project_id, body).await,
        ),
        (&Method::POST, ["projects", project_id, "generate", "point-of-view"]) => {
            response::respond(
                StatusCode::OK,
                assist::generate_point_of_view(state, caller, project_id).await,
            )
        }
        (&Method::POST, ["projects", project_id, "generate", "prioritization"]) => {
            response::respond(
                StatusCode::OK,
                assist::generate_prioritization(state, caller, project_id).await,
            )
        }
        (&Method::POST, ["projects", project_id, "generate", "tech-spec"]) => response::respond(
            StatusCode::OK,
            assist::generate_tech_spec(state, caller, project_id).await,
        ),
        (&Method::POST, ["projects", project_id, "generate", "assistant"]) => response::respond(
            StatusCode::OK,
            assist::assistant_reply(state, caller, project_id, body).await,
        ),
        (&Method::POST, ["projects", _, "generate", _]) => response::not_found(),

        _ => response::method_not_allowed(),
    }
}
