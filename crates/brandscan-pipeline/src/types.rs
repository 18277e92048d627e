use std::time::Duration;

use brandscan_core::{AnalysisResult, AppConfig};

/// Settings the stages and the orchestrator run with.
///
/// Built once from [`AppConfig`] and handed to the orchestrator; nothing in
/// the pipeline reads the environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Hosts whose discussion threads count as sources. Subdomains match too.
    pub source_hosts: Vec<String>,
    /// Required path prefix on source URLs (community threads).
    pub source_path_prefix: String,
    pub max_source_urls: usize,
    pub max_posts_per_url: u32,
    pub max_comments_per_post: u32,
    pub max_concurrent_prospects: usize,
    pub max_concurrent_scrapes: usize,
    pub min_item_chars: usize,
    pub max_item_chars: usize,
    pub analysis_batch_chars: usize,
    pub search_timeout: Duration,
    pub scrape_timeout: Duration,
    pub llm_timeout: Duration,
    pub db_timeout: Duration,
    pub prospect_retries: u32,
    pub prospect_retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_hosts: vec!["reddit.com".to_string()],
            source_path_prefix: "/r/".to_string(),
            max_source_urls: 10,
            max_posts_per_url: 20,
            max_comments_per_post: 20,
            max_concurrent_prospects: 1,
            max_concurrent_scrapes: 3,
            min_item_chars: 20,
            max_item_chars: 1200,
            analysis_batch_chars: 180_000,
            search_timeout: Duration::from_secs(310),
            scrape_timeout: Duration::from_secs(310),
            llm_timeout: Duration::from_secs(300),
            db_timeout: Duration::from_secs(30),
            prospect_retries: 0,
            prospect_retry_delay: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_source_urls: config.max_source_urls,
            max_posts_per_url: config.max_posts_per_url,
            max_comments_per_post: config.max_comments_per_post,
            max_concurrent_prospects: config.max_concurrent_prospects,
            max_concurrent_scrapes: config.max_concurrent_scrapes,
            max_item_chars: config.max_item_chars,
            analysis_batch_chars: config.analysis_batch_chars,
            search_timeout: Duration::from_secs(config.search_timeout_secs),
            scrape_timeout: Duration::from_secs(config.scrape_timeout_secs),
            llm_timeout: Duration::from_secs(config.llm_timeout_secs),
            db_timeout: Duration::from_secs(config.db_timeout_secs),
            prospect_retries: config.prospect_retries,
            prospect_retry_delay: Duration::from_secs(config.prospect_retry_delay_secs),
            ..Self::default()
        }
    }
}

/// Which prospects a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    AllProspects,
    /// A single brand; the prospect is created if it does not exist yet.
    Brand {
        name: String,
        category: Option<String>,
    },
}

/// Counters reported as a prospect moves through the stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProspectStats {
    pub urls_found: usize,
    pub urls_scraped: usize,
    pub urls_failed: usize,
    pub items_scraped: usize,
    pub items_cleaned: usize,
}

#[derive(Debug, Clone)]
pub enum ProspectOutcome {
    Succeeded(AnalysisResult),
    Failed { reason: String },
    /// The run was cancelled before this prospect started.
    Skipped,
}

/// Result record for one prospect in a run.
#[derive(Debug, Clone)]
pub struct ProspectReport {
    pub brand_name: String,
    pub prospect_id: i64,
    pub outcome: ProspectOutcome,
    pub stats: ProspectStats,
    /// Attempts made, including orchestrator-level retries. Zero when skipped.
    pub attempts: u32,
}

impl ProspectReport {
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self.outcome {
            ProspectOutcome::Succeeded(_) => "succeeded",
            ProspectOutcome::Failed { .. } => "failed",
            ProspectOutcome::Skipped => "skipped",
        }
    }

    #[must_use]
    pub fn insight_summary(&self) -> Option<&str> {
        match &self.outcome {
            ProspectOutcome::Succeeded(result) => Some(result.key_insight.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_reason(&self) -> Option<&str> {
        match &self.outcome {
            ProspectOutcome::Failed { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// Outcomes of one orchestrator run, in the order prospects were resolved.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub prospects: Vec<ProspectReport>,
}

impl RunReport {
    #[must_use]
    pub fn any_failed(&self) -> bool {
        self.prospects
            .iter()
            .any(|p| matches!(p.outcome, ProspectOutcome::Failed { .. }))
    }

    #[must_use]
    pub fn succeeded_count(&self) -> usize {
        self.count(|o| matches!(o, ProspectOutcome::Succeeded(_)))
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, ProspectOutcome::Failed { .. }))
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, ProspectOutcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&ProspectOutcome) -> bool) -> usize {
        self.prospects.iter().filter(|p| pred(&p.outcome)).count()
    }

    #[must_use]
    pub fn get(&self, brand_name: &str) -> Option<&ProspectReport> {
        self.prospects
            .iter()
            .find(|p| p.brand_name.eq_ignore_ascii_case(brand_name))
    }
}
