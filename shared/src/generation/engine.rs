use super::TextGenerator;
use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;

fn map_backend(provider: &str) -> Result<LLMBackend, String> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(format!("unknown provider: {other}")),
    }
}

/// Calls a hosted model through the `llm` crate.
pub struct LlmGenerator {
    provider: String,
    api_key: String,
}

impl LlmGenerator {
    pub fn new(provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, model: &str, system: &str, prompt: &str) -> Result<String, String> {
        let backend = map_backend(&self.provider)?;

        let mut builder = LLMBuilder::new().backend(backend).model(model).system(system);

        if !self.api_key.is_empty() {
            builder = builder.api_key(&self.api_key);
        }

        let llm = builder.build().map_err(|e| format!("build LLM: {e}"))?;

        let messages = vec![ChatMessage::user().content(prompt).build()];

        let response = llm.chat(&messages).await.map_err(|e| format!("chat: {e}"))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err("LLM returned empty text".to_string()),
            None => Err("LLM returned no text".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(map_backend("google").is_ok());
        assert_eq!(
            map_backend("palm").err().as_deref(),
            Some("unknown provider: palm")
        );
    }
}
