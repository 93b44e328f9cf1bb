use std::env;

const DEFAULT_TABLE_NAME: &str = "design-thinking";
const DEFAULT_PROVIDER: &str = "google";
const DEFAULT_MODELS: &str = "gemini-1.5-flash,gemini-1.5-pro,gemini-1.0-pro";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

/// Settings read once at cold start.
#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub store_backend: StoreBackend,
    pub llm_provider: String,
    pub llm_api_key: String,
    /// Tried in order until one returns output.
    pub llm_models: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND").as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("dynamodb") | None => StoreBackend::DynamoDb,
            Some(other) => {
                tracing::warn!("Unknown STORE_BACKEND '{}', using dynamodb", other);
                StoreBackend::DynamoDb
            }
        };

        let models = lookup("LLM_MODELS").unwrap_or_else(|| DEFAULT_MODELS.to_string());
        let mut llm_models: Vec<String> = models
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if llm_models.is_empty() {
            llm_models = DEFAULT_MODELS.split(',').map(str::to_string).collect();
        }

        Self {
            table_name: lookup("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            store_backend,
            llm_provider: lookup("LLM_PROVIDER").unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            llm_api_key: lookup("LLM_API_KEY").unwrap_or_default(),
            llm_models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.table_name, "design-thinking");
        assert_eq!(config.store_backend, StoreBackend::DynamoDb);
        assert_eq!(config.llm_models.len(), 3);
        assert_eq!(config.llm_models[0], "gemini-1.5-flash");
    }

    #[test]
    fn test_model_list_is_trimmed_in_order() {
        let config = config_from(&[
            ("LLM_MODELS", " gpt-4o-mini , ,gpt-4o"),
            ("STORE_BACKEND", "memory"),
        ]);
        assert_eq!(config.llm_models, vec!["gpt-4o-mini", "gpt-4o"]);
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn test_blank_model_list_falls_back_to_defaults() {
        let config = config_from(&[("LLM_MODELS", " , ")]);
        assert_eq!(config.llm_models[0], "gemini-1.5-flash");
    }
}
