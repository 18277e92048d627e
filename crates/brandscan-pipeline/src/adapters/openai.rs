use async_trait::async_trait;
use brandscan_llm::{LlmError, OpenAiClient};

use crate::analysis::SYSTEM_PROMPT;
use crate::error::ProviderError;
use crate::providers::LanguageModel;

/// Chat-completions model with the analysis system prompt fixed.
pub struct OpenAiModel {
    client: OpenAiClient,
}

impl OpenAiModel {
    #[must_use]
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.client
            .complete(SYSTEM_PROMPT, prompt)
            .await
            .map_err(provider_error)
    }
}

fn provider_error(err: LlmError) -> ProviderError {
    match err {
        LlmError::RateLimited { .. } => ProviderError::RateLimited(err.to_string()),
        LlmError::Auth { .. } => ProviderError::Auth(err.to_string()),
        _ if err.is_retryable() => ProviderError::Unavailable(err.to_string()),
        _ => ProviderError::Rejected(err.to_string()),
    }
}
