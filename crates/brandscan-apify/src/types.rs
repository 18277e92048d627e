use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Google search actor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSearchInput {
    pub queries: String,
    pub max_pages_per_query: u32,
}

/// One results page from the Google search actor's dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// Reddit scraper actor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditScraperInput {
    pub start_urls: Vec<StartUrl>,
    pub max_posts: u32,
    pub max_comments: u32,
    pub max_communities_count: u32,
    pub scroll_timeout: u32,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub use_apify_proxy: bool,
}

/// A post or comment record as emitted by the Reddit scraper actor.
///
/// Every field is optional: the actor omits keys freely depending on the
/// record type and what the page exposed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRedditItem {
    /// `"post"` or `"comment"`.
    pub data_type: Option<String>,
    pub id: Option<String>,
    /// For comments, the id of the post they belong to.
    pub post_id: Option<String>,
    pub parent_id: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub community_name: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub up_votes: Option<i64>,
    pub number_of_replies: Option<i64>,
    /// ISO-8601 timestamp string.
    pub created_at: Option<String>,
}
