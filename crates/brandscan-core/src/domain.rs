//! Entities that flow through the pipeline: prospects, discovered URLs,
//! scraped items, and analysis results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Lifecycle state of a prospect within a run.
///
/// `Pending` is the state of a freshly created prospect; every other state is
/// written by the orchestrator as the prospect moves through the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProspectStatus {
    Pending,
    Discovering,
    Scraping,
    Cleaning,
    Analyzing,
    Done,
    Failed,
}

impl ProspectStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProspectStatus::Pending => "pending",
            ProspectStatus::Discovering => "discovering",
            ProspectStatus::Scraping => "scraping",
            ProspectStatus::Cleaning => "cleaning",
            ProspectStatus::Analyzing => "analyzing",
            ProspectStatus::Done => "done",
            ProspectStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ProspectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProspectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProspectStatus::Pending),
            "discovering" => Ok(ProspectStatus::Discovering),
            "scraping" => Ok(ProspectStatus::Scraping),
            "cleaning" => Ok(ProspectStatus::Cleaning),
            "analyzing" => Ok(ProspectStatus::Analyzing),
            "done" => Ok(ProspectStatus::Done),
            "failed" => Ok(ProspectStatus::Failed),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// A brand under analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    pub id: i64,
    pub brand_name: String,
    pub industry_category: Option<String>,
    pub status: ProspectStatus,
}

/// A candidate discussion URL recorded for a prospect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    pub id: i64,
    pub prospect_id: i64,
    pub url: String,
    pub processed: bool,
    pub discovered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Post => "post",
            ItemKind::Comment => "comment",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ItemKind::Post),
            "comment" => Ok(ItemKind::Comment),
            other => Err(CoreError::UnknownItemKind(other.to_string())),
        }
    }
}

/// One post or comment retrieved from a source URL.
///
/// Threads are flattened: a comment points at its post through
/// `parent_external_id` rather than by nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub source_url: String,
    pub kind: ItemKind,
    /// Identifier assigned by the content platform, when the scraper returns one.
    pub external_id: Option<String>,
    pub parent_external_id: Option<String>,
    pub author: Option<String>,
    pub community: Option<String>,
    pub score: i32,
    pub reply_count: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub text: String,
    pub brand_name: String,
    pub prospect_id: i64,
}

/// A scraped item that survived cleaning, re-tagged with its brand and prospect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedItem {
    pub source_url: String,
    pub kind: ItemKind,
    pub external_id: Option<String>,
    pub author: Option<String>,
    pub community: Option<String>,
    pub score: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub text: String,
    pub brand_name: String,
    pub prospect_id: i64,
}

/// Share of discussion per sentiment, in whole percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: i32,
    pub negative: i32,
    pub neutral: i32,
}

/// Synthesized insight for one prospect. Results are append-only; each run
/// adds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub prospect_id: i64,
    pub key_insight: String,
    pub themes: Vec<String>,
    pub recommendations: Vec<String>,
    /// `None` when no batch reported a breakdown.
    pub sentiment: Option<SentimentBreakdown>,
    pub customer_segments: Vec<String>,
    /// Raw long-form report text from the first batch, if the model produced one.
    pub report: Option<String>,
    pub batch_count: i32,
    pub item_count: i32,
    pub generated_at: DateTime<Utc>,
}
