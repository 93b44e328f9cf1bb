pub mod access;
pub mod assist;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod generation;
pub mod phases;
pub mod projects;
pub mod response;
pub mod store;
pub mod types;
pub mod users;

use config::{Config, StoreBackend};
use generation::engine::LlmGenerator;
use generation::TextGenerator;
use std::sync::Arc;
use store::{DynamoStore, MemoryStore, Store};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub generator: Arc<dyn TextGenerator>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        generator: Arc<dyn TextGenerator>,
        config: Config,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            generator,
            config,
        })
    }

    /// Build the production state from configuration.
    pub async fn from_config(config: Config) -> Arc<Self> {
        let store: Arc<dyn Store> = match config.store_backend {
            StoreBackend::DynamoDb => {
                let aws_config = aws_config::load_from_env().await;
                Arc::new(DynamoStore::new(
                    aws_sdk_dynamodb::Client::new(&aws_config),
                    config.table_name.clone(),
                ))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        if config.llm_api_key.is_empty() {
            tracing::warn!("LLM_API_KEY not set; generation will use fallback content");
        }
        let generator = Arc::new(LlmGenerator::new(
            config.llm_provider.clone(),
            config.llm_api_key.clone(),
        ));

        Self::new(store, generator, config)
    }
}
