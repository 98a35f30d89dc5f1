use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use tracing::info;

use flowsmith_core::{ai_configured, AiSettings, Error, Result};

/// A hosted text-completion capability: one system prompt, one user message, one answer.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

fn map_backend(provider: &str) -> Result<LLMBackend> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(Error::Config(format!("unknown provider: {other}"))),
    }
}

/// Completion client backed by the `llm` crate. Temperature is pinned to 0.
pub struct LlmEngine {
    settings: AiSettings,
}

impl LlmEngine {
    /// Validate `settings` up front so a bad provider or missing key fails at startup.
    pub fn new(settings: AiSettings) -> Result<Self> {
        map_backend(&settings.provider)?;
        if !ai_configured(&settings) {
            return Err(Error::Config(format!(
                "AI settings incomplete for provider '{}': model and API key are required",
                settings.provider
            )));
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionClient for LlmEngine {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let settings = &self.settings;
        let backend = map_backend(&settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&settings.model)
            .temperature(0.0)
            .system(system);

        if !settings.api_key.is_empty() {
            builder = builder.api_key(&settings.api_key);
        }
        if let Some(url) = &settings.base_url {
            builder = builder.base_url(url);
        }

        let llm = builder
            .build()
            .map_err(|e| Error::Completion(format!("build LLM: {e}")))?;

        info!(provider = %settings.provider, model = %settings.model, "sending completion request");

        let messages = vec![ChatMessage::user().content(user).build()];
        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| Error::Completion(format!("chat: {e}")))?;

        response
            .text()
            .ok_or_else(|| Error::Completion("LLM returned no text".to_string()))
    }
}
