//! Scrape stage: fetch posts and comments for each source URL.
//!
//! URLs are scraped concurrently up to `max_concurrent_scrapes`. A failing
//! URL is logged and reported in the batch; it does not sink the others.

use brandscan_core::{ItemKind, ScrapedItem};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::ScrapeError;
use crate::providers::{RawItem, ScrapeProvider};
use crate::types::PipelineConfig;

/// Outcome of scraping a single URL.
#[derive(Debug)]
pub struct UrlScrape {
    pub url: String,
    pub result: Result<Vec<ScrapedItem>, ScrapeError>,
}

/// Per-URL outcomes in the order the URLs were given.
#[derive(Debug, Default)]
pub struct ScrapeBatch {
    pub outcomes: Vec<UrlScrape>,
}

impl ScrapeBatch {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &[ScrapedItem])> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(items) => Some((o.url.as_str(), items.as_slice())),
            Err(_) => None,
        })
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.succeeded().map(|(_, items)| items.len()).sum()
    }
}

/// Scrape every URL and tag the resulting items with `brand_name` and
/// `prospect_id`.
///
/// A URL that yields zero items counts as a success.
///
/// # Errors
///
/// Returns [`ScrapeError::AllFailed`] when `urls` is non-empty and every URL
/// failed. Individual failures are otherwise carried in the batch.
pub async fn scrape_urls(
    scraper: &dyn ScrapeProvider,
    config: &PipelineConfig,
    urls: &[String],
    brand_name: &str,
    prospect_id: i64,
) -> Result<ScrapeBatch, ScrapeError> {
    let mut indexed: Vec<(usize, UrlScrape)> = stream::iter(urls.iter().enumerate())
        .map(|(index, url)| async move {
            let result = scrape_one(scraper, config, url, brand_name, prospect_id).await;
            (
                index,
                UrlScrape {
                    url: url.clone(),
                    result,
                },
            )
        })
        .buffer_unordered(config.max_concurrent_scrapes.max(1))
        .collect()
        .await;
    indexed.sort_by_key(|(index, _)| *index);

    let batch = ScrapeBatch {
        outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
    };

    if !batch.outcomes.is_empty() && batch.failed_count() == batch.outcomes.len() {
        let retryable = batch
            .outcomes
            .iter()
            .any(|o| o.result.as_ref().is_err_and(ScrapeError::is_retryable));
        let last_error = batch
            .outcomes
            .iter()
            .rev()
            .find_map(|o| o.result.as_ref().err())
            .map(ToString::to_string)
            .unwrap_or_default();
        return Err(ScrapeError::AllFailed {
            attempted: batch.outcomes.len(),
            last_error,
            retryable,
        });
    }

    Ok(batch)
}

async fn scrape_one(
    scraper: &dyn ScrapeProvider,
    config: &PipelineConfig,
    url: &str,
    brand_name: &str,
    prospect_id: i64,
) -> Result<Vec<ScrapedItem>, ScrapeError> {
    let call = scraper.scrape(url, config.max_posts_per_url, config.max_comments_per_post);
    let raw = match tokio::time::timeout(config.scrape_timeout, call).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(source)) => {
            tracing::warn!(url, error = %source, "scrape failed, skipping URL");
            return Err(ScrapeError::Provider {
                url: url.to_string(),
                source,
            });
        }
        Err(_) => {
            let secs = config.scrape_timeout.as_secs();
            tracing::warn!(url, secs, "scrape timed out, skipping URL");
            return Err(ScrapeError::Timeout {
                url: url.to_string(),
                secs,
            });
        }
    };

    let items: Vec<ScrapedItem> = raw
        .into_iter()
        .map(|item| to_scraped_item(item, url, brand_name, prospect_id))
        .collect();
    tracing::debug!(url, count = items.len(), "scraped URL");
    Ok(items)
}

/// Lift a provider record into a [`ScrapedItem`].
///
/// Text is the body when present, otherwise the title. Only comments keep a
/// parent reference. Counters are clamped into `i32`; unparseable timestamps
/// become `None`.
#[must_use]
pub fn to_scraped_item(
    raw: RawItem,
    source_url: &str,
    brand_name: &str,
    prospect_id: i64,
) -> ScrapedItem {
    let kind = if raw.kind.eq_ignore_ascii_case("comment") {
        ItemKind::Comment
    } else {
        ItemKind::Post
    };
    let text = raw
        .body
        .filter(|b| !b.trim().is_empty())
        .or(raw.title)
        .unwrap_or_default();
    let created_at = raw
        .created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    ScrapedItem {
        source_url: source_url.to_string(),
        kind,
        external_id: raw.id,
        parent_external_id: match kind {
            ItemKind::Comment => raw.parent_id,
            ItemKind::Post => None,
        },
        author: raw.author,
        community: raw.community,
        score: clamp_i32(raw.score),
        reply_count: clamp_i32(raw.reply_count),
        created_at,
        text,
        brand_name: brand_name.to_string(),
        prospect_id,
    }
}

fn clamp_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
