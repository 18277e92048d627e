use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Apify rejected the API token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("rate limited running actor {actor} (retry after {retry_after_secs}s)")]
    RateLimited { actor: String, retry_after_secs: u64 },

    #[error("Apify API error {status} running actor {actor}: {message}")]
    Api {
        actor: String,
        status: u16,
        message: String,
    },
}
