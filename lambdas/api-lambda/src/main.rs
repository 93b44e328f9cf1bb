use design_studio_shared::{config::Config, AppState};
use lambda_http::{run, service_fn, tracing, Error, Request};
use std::sync::Arc;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    // Clients and config are built once per cold start
    let config = Config::from_env();
    tracing::info!(
        "Starting with table {} ({:?}), models {:?}",
        config.table_name,
        config.store_backend,
        config.llm_models
    );
    let state = AppState::from_config(config).await;

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
