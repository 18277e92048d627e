use thiserror::Error;

/// Failure reported by an external collaborator (search, scrape, model).
///
/// Adapters map their client errors onto these four buckets so stage logic
/// can tell transient trouble from configuration mistakes.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("credentials rejected: {0}")]
    Auth(String),

    /// Network failures and 5xx responses.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider understood the request and refused it, or answered with
    /// something unparseable.
    #[error("provider rejected the request: {0}")]
    Rejected(String),
}

impl ProviderError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited(_) | ProviderError::Unavailable(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("search provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("search timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Per-URL scrape failure. Isolated inside the scrape stage unless every URL
/// fails, in which case [`ScrapeError::AllFailed`] reaches the orchestrator.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("scraping {url} failed: {source}")]
    Provider {
        url: String,
        #[source]
        source: ProviderError,
    },

    #[error("scraping {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("all {attempted} source URLs failed to scrape (last error: {last_error})")]
    AllFailed {
        attempted: usize,
        last_error: String,
        retryable: bool,
    },
}

impl ScrapeError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Provider { source, .. } => source.is_retryable(),
            ScrapeError::Timeout { .. } => true,
            ScrapeError::AllFailed { retryable, .. } => *retryable,
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis called with no items")]
    EmptyInput,

    #[error("item {index} needs {size} chars, more than the whole {budget}-char batch budget")]
    ItemExceedsBudget {
        index: usize,
        size: usize,
        budget: usize,
    },

    #[error("language model failed on batch {batch}: {source}")]
    Provider {
        batch: usize,
        #[source]
        source: ProviderError,
    },

    #[error("language model timed out on batch {batch} after {secs}s")]
    Timeout { batch: usize, secs: u64 },

    #[error("unusable language model output for batch {batch}: {reason}")]
    UnusableResponse { batch: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Db(#[from] brandscan_db::DbError),

    #[error("store error: {0}")]
    Store(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}

/// Why a prospect ended in `failed`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("no sources found")]
    NoSources,

    #[error("scrape failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("no content scraped")]
    NoContent,

    #[error("no valid content after cleaning")]
    NoValidContent,

    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

impl PipelineError {
    /// Whether re-running the prospect later could plausibly succeed.
    ///
    /// Empty results and oversized items are deterministic; bad credentials
    /// need a human. Everything else is worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Discovery(DiscoveryError::Provider(e)) => e.is_retryable(),
            PipelineError::Discovery(DiscoveryError::Timeout { .. })
            | PipelineError::Persistence(_) => true,
            PipelineError::Scrape(e) => e.is_retryable(),
            PipelineError::Analysis(e) => match e {
                AnalysisError::Provider { source, .. } => source.is_retryable(),
                AnalysisError::Timeout { .. } | AnalysisError::UnusableResponse { .. } => true,
                AnalysisError::EmptyInput | AnalysisError::ItemExceedsBudget { .. } => false,
            },
            PipelineError::NoSources | PipelineError::NoContent | PipelineError::NoValidContent => {
                false
            }
        }
    }
}
