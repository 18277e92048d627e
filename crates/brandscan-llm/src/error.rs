use thiserror::Error;

/// Errors returned by the chat-completions client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429. The provider wants us to slow down.
    #[error("rate limited by the language model provider")]
    RateLimited { retry_after_secs: Option<u64> },

    /// HTTP 401/403. The API key is missing, wrong, or lacks access.
    #[error("language model provider rejected the credentials (HTTP {status})")]
    Auth { status: u16 },

    /// Any other non-2xx response.
    #[error("language model API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A 2xx response with no message content in the first choice.
    #[error("language model returned an empty completion")]
    EmptyResponse,

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LlmError {
    /// Whether waiting and trying again could succeed.
    ///
    /// Rate limits, 5xx responses, timeouts and connection failures are
    /// retryable. Credential problems and malformed requests are fatal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            LlmError::Auth { .. } | LlmError::EmptyResponse | LlmError::Deserialize { .. } => {
                false
            }
        }
    }
}
