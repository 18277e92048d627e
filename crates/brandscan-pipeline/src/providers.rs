//! Narrow contracts for the four collaborators the pipeline drives.
//!
//! Stage logic only sees these traits. Production implementations live in
//! [`crate::adapters`]; tests swap in in-memory fakes.

use async_trait::async_trait;
use brandscan_core::{AnalysisResult, ProspectStatus, ScrapedItem};
use brandscan_core::{DiscoveredUrl, Prospect};

use crate::error::{PersistenceError, ProviderError};

/// One search result, in the order the provider ranked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
}

/// A post or comment as returned by a scraping provider, already lifted out
/// of the provider's own record format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    /// `"post"` or `"comment"`; anything else is treated as a post.
    pub kind: String,
    pub id: Option<String>,
    /// For comments, the id of the post they reply to.
    pub parent_id: Option<String>,
    pub author: Option<String>,
    pub community: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub score: i64,
    pub reply_count: i64,
    /// RFC 3339 timestamp as the provider reported it.
    pub created_at: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError>;
}

#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    async fn scrape(
        &self,
        url: &str,
        max_posts: u32,
        max_comments: u32,
    ) -> Result<Vec<RawItem>, ProviderError>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and return the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Typed access to the relational store.
///
/// Each call is atomic for its own entity only. Write paths are idempotent:
/// re-inserting a known URL or item and re-marking a processed URL are no-ops.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn upsert_prospect(
        &self,
        brand_name: &str,
        category: Option<&str>,
    ) -> Result<Prospect, PersistenceError>;

    async fn list_prospects(&self) -> Result<Vec<Prospect>, PersistenceError>;

    async fn set_prospect_status(
        &self,
        prospect_id: i64,
        status: ProspectStatus,
        error: Option<&str>,
    ) -> Result<(), PersistenceError>;

    /// Returns how many URLs were newly recorded.
    async fn insert_discovered_urls(
        &self,
        prospect_id: i64,
        urls: &[String],
    ) -> Result<u64, PersistenceError>;

    async fn list_discovered_urls(
        &self,
        prospect_id: i64,
        only_pending: bool,
    ) -> Result<Vec<DiscoveredUrl>, PersistenceError>;

    async fn mark_urls_processed(
        &self,
        prospect_id: i64,
        urls: &[String],
    ) -> Result<u64, PersistenceError>;

    /// Returns how many items were newly stored.
    async fn bulk_insert_items(&self, items: &[ScrapedItem]) -> Result<u64, PersistenceError>;

    async fn list_items(&self, prospect_id: i64) -> Result<Vec<ScrapedItem>, PersistenceError>;

    async fn insert_analysis_result(
        &self,
        result: &AnalysisResult,
    ) -> Result<i64, PersistenceError>;
}
