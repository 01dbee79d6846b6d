use async_trait::async_trait;
use campaign_engine::{ContentGenerator, FailureKind, GenerationFailed, ProviderFailure};
use llm_client::{LlmClient, LlmError};

/// Classify a client error for the fallback executor. HTTP status wins; the
/// message decides when there is none.
pub fn classify_llm_error(err: &LlmError) -> ProviderFailure {
    let message = err.to_string();
    match err.status().and_then(FailureKind::from_status) {
        Some(kind) => ProviderFailure::new(kind, message),
        None => ProviderFailure::classified(message),
    }
}

/// Serves generation requests with one LLM account; the provider identifier
/// passed by the engine is the model name.
pub struct LlmGenerator {
    client: LlmClient,
}

impl LlmGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentGenerator for LlmGenerator {
    async fn generate(&self, provider: &str, prompt: &str) -> Result<String, GenerationFailed> {
        self.client
            .generate(provider, prompt)
            .await
            .map_err(|e| classify_llm_error(&e))
    }
}
