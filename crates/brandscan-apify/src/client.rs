use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApifyError;
use crate::retry::retry_with_backoff;
use crate::types::{
    GoogleSearchInput, OrganicResult, ProxyConfig, RawRedditItem, RedditScraperInput,
    SearchResultPage, StartUrl,
};

const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

pub const GOOGLE_SEARCH_ACTOR: &str = "apify~google-search-scraper";
pub const REDDIT_SCRAPER_ACTOR: &str = "trudax~reddit-scraper-lite";

/// Seconds the Reddit actor keeps scrolling a page before giving up.
const REDDIT_SCROLL_TIMEOUT_SECS: u32 = 40;

/// Longest error body kept in [`ApifyError::Api`] messages.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// HTTP client for the Apify actor API.
///
/// Actors are invoked through `run-sync-get-dataset-items`, which blocks
/// until the run finishes and returns the dataset in the response body.
/// Rate limits, 5xx responses and network failures are retried with
/// exponential backoff up to `max_retries` additional attempts.
pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ApifyClient {
    /// Creates a client for the production Apify API.
    ///
    /// `timeout_secs` bounds one whole actor run, so it must exceed the
    /// actor's own runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ApifyError> {
        Self::with_base_url(
            token,
            DEFAULT_BASE_URL,
            timeout_secs,
            max_retries,
            backoff_base_secs,
        )
    }

    /// Creates a client against a custom base URL (used in tests).
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        token: &str,
        base_url: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ApifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("brandscan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token: token.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Runs a Google search and returns organic results in ranking order,
    /// flattened across result pages.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError`] if the actor run fails after retries or its
    /// dataset does not parse.
    pub async fn search_google(
        &self,
        query: &str,
        max_pages_per_query: u32,
    ) -> Result<Vec<OrganicResult>, ApifyError> {
        let input = GoogleSearchInput {
            queries: query.to_owned(),
            max_pages_per_query,
        };

        let pages: Vec<SearchResultPage> = self.run_actor(GOOGLE_SEARCH_ACTOR, &input).await?;
        let results: Vec<OrganicResult> = pages
            .into_iter()
            .flat_map(|page| page.organic_results)
            .collect();

        tracing::debug!(query, count = results.len(), "google search completed");
        Ok(results)
    }

    /// Scrapes one Reddit URL, returning posts and comments as flat records.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError`] if the actor run fails after retries or its
    /// dataset does not parse.
    pub async fn scrape_reddit(
        &self,
        url: &str,
        max_posts: u32,
        max_comments: u32,
    ) -> Result<Vec<RawRedditItem>, ApifyError> {
        let input = RedditScraperInput {
            start_urls: vec![StartUrl {
                url: url.to_owned(),
            }],
            max_posts,
            max_comments,
            max_communities_count: 1,
            scroll_timeout: REDDIT_SCROLL_TIMEOUT_SECS,
            proxy: ProxyConfig {
                use_apify_proxy: true,
            },
        };

        let items: Vec<RawRedditItem> = self.run_actor(REDDIT_SCRAPER_ACTOR, &input).await?;
        tracing::debug!(url, count = items.len(), "reddit scrape completed");
        Ok(items)
    }

    /// Runs `actor` synchronously and deserializes its dataset items.
    async fn run_actor<I, T>(&self, actor: &str, input: &I) -> Result<Vec<T>, ApifyError>
    where
        I: Serialize + Sync,
        T: DeserializeOwned,
    {
        let endpoint = format!("{}/acts/{actor}/run-sync-get-dataset-items", self.base_url);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let endpoint = endpoint.clone();
            async move {
                let response = self
                    .client
                    .post(&endpoint)
                    .bearer_auth(&self.token)
                    .json(input)
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(ApifyError::Unauthorized {
                        status: status.as_u16(),
                    });
                }

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(0);
                    return Err(ApifyError::RateLimited {
                        actor: actor.to_owned(),
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ApifyError::Api {
                        actor: actor.to_owned(),
                        status: status.as_u16(),
                        message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<Vec<T>>(&body).map_err(|e| ApifyError::Deserialize {
                    context: format!("dataset items from {actor}"),
                    source: e,
                })
            }
        })
        .await
    }
}
