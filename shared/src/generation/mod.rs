pub mod engine;
pub mod fallback;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use serde::Serialize;

/// A text-generation backend addressed by model identifier.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, system: &str, prompt: &str) -> Result<String, String>;
}

/// Where a generated payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Model,
    Fallback,
}

/// Try each model in order and return the first non-empty output.
/// No backoff between attempts; `None` when every model failed.
pub async fn generate_with_fallback(
    generator: &dyn TextGenerator,
    models: &[String],
    system: &str,
    prompt: &str,
) -> Option<String> {
    for model in models {
        match generator.generate(model, system, prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!("Generated {} chars with {}", text.len(), model);
                return Some(text);
            }
            Ok(_) => tracing::warn!("Model {} returned empty output", model),
            Err(e) => tracing::warn!("Model {} failed: {}", model, e),
        }
    }
    tracing::warn!("All {} models failed, using fallback content", models.len());
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replies per model; models without an entry fail. Records call order.
    #[derive(Default)]
    pub(crate) struct ScriptedGenerator {
        pub replies: HashMap<String, String>,
        pub calls: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn failing() -> Self {
            Self::default()
        }

        pub(crate) fn with_reply(model: &str, reply: &str) -> Self {
            let mut replies = HashMap::new();
            replies.insert(model.to_string(), reply.to_string());
            Self {
                replies,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, model: &str, _system: &str, _prompt: &str) -> Result<String, String> {
            self.calls.lock().unwrap().push(model.to_string());
            self.replies
                .get(model)
                .cloned()
                .ok_or_else(|| format!("model {} unavailable", model))
        }
    }

    fn models() -> Vec<String> {
        vec!["fast".to_string(), "pro".to_string(), "legacy".to_string()]
    }

    #[tokio::test]
    async fn test_tries_models_in_order_until_success() {
        let generator = ScriptedGenerator::with_reply("pro", "hello");
        let out = generate_with_fallback(&generator, &models(), "sys", "prompt").await;

        assert_eq!(out.as_deref(), Some("hello"));
        assert_eq!(*generator.calls.lock().unwrap(), vec!["fast", "pro"]);
    }

    #[tokio::test]
    async fn test_blank_output_counts_as_failure() {
        let generator = ScriptedGenerator::with_reply("fast", "   ");
        let out = generate_with_fallback(&generator, &models(), "sys", "prompt").await;

        assert!(out.is_none());
        assert_eq!(generator.calls.lock().unwrap().len(), 3);
    }
}
