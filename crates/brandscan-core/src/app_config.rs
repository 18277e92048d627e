use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub prospects_path: PathBuf,
    pub apify_api_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Cap on candidate URLs kept per discovery call.
    pub max_source_urls: usize,
    pub max_posts_per_url: u32,
    pub max_comments_per_post: u32,
    pub max_concurrent_prospects: usize,
    pub max_concurrent_scrapes: usize,
    pub insert_chunk_size: usize,
    /// Character budget for one analysis prompt payload.
    pub analysis_batch_chars: usize,
    pub max_item_chars: usize,
    pub search_timeout_secs: u64,
    pub scrape_timeout_secs: u64,
    /// Budget for the whole analysis of one batch, retries included.
    pub llm_timeout_secs: u64,
    /// Timeout for a single chat-completions request.
    pub llm_request_timeout_secs: u64,
    pub db_timeout_secs: u64,
    pub apify_max_retries: u32,
    pub apify_retry_backoff_base_secs: u64,
    pub llm_model: String,
    pub llm_max_retries: u32,
    pub llm_retry_backoff_base_ms: u64,
    pub prospect_retries: u32,
    pub prospect_retry_delay_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("prospects_path", &self.prospects_path)
            .field("database_url", &"[redacted]")
            .field(
                "apify_api_token",
                &self.apify_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("max_source_urls", &self.max_source_urls)
            .field("max_posts_per_url", &self.max_posts_per_url)
            .field("max_comments_per_post", &self.max_comments_per_post)
            .field("max_concurrent_prospects", &self.max_concurrent_prospects)
            .field("max_concurrent_scrapes", &self.max_concurrent_scrapes)
            .field("insert_chunk_size", &self.insert_chunk_size)
            .field("analysis_batch_chars", &self.analysis_batch_chars)
            .field("max_item_chars", &self.max_item_chars)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("scrape_timeout_secs", &self.scrape_timeout_secs)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_request_timeout_secs", &self.llm_request_timeout_secs)
            .field("db_timeout_secs", &self.db_timeout_secs)
            .field("apify_max_retries", &self.apify_max_retries)
            .field(
                "apify_retry_backoff_base_secs",
                &self.apify_retry_backoff_base_secs,
            )
            .field("llm_model", &self.llm_model)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("llm_retry_backoff_base_ms", &self.llm_retry_backoff_base_ms)
            .field("prospect_retries", &self.prospect_retries)
            .field("prospect_retry_delay_secs", &self.prospect_retry_delay_secs)
            .finish()
    }
}
