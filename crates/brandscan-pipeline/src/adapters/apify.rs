use async_trait::async_trait;
use brandscan_apify::{ApifyClient, ApifyError, RawRedditItem};

use crate::error::ProviderError;
use crate::providers::{RawItem, ScrapeProvider, SearchHit, SearchProvider};

/// Result pages fetched per search query.
const SEARCH_PAGES: u32 = 1;

/// Search and scrape through Apify actors.
pub struct ApifyProvider {
    client: ApifyClient,
}

impl ApifyProvider {
    #[must_use]
    pub fn new(client: ApifyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchProvider for ApifyProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let results = self
            .client
            .search_google(query, SEARCH_PAGES)
            .await
            .map_err(provider_error)?;
        Ok(results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .map(|r| SearchHit { url: r.url })
            .collect())
    }
}

#[async_trait]
impl ScrapeProvider for ApifyProvider {
    async fn scrape(
        &self,
        url: &str,
        max_posts: u32,
        max_comments: u32,
    ) -> Result<Vec<RawItem>, ProviderError> {
        let items = self
            .client
            .scrape_reddit(url, max_posts, max_comments)
            .await
            .map_err(provider_error)?;
        Ok(items.into_iter().map(raw_item).collect())
    }
}

/// Comments point at their post through `postId`; `parentId` may name
/// another comment, which the flat item model does not track.
fn raw_item(item: RawRedditItem) -> RawItem {
    let kind = item.data_type.unwrap_or_else(|| "post".to_string());
    let parent_id = item.post_id.or(item.parent_id);
    RawItem {
        kind,
        id: item.id,
        parent_id,
        author: item.username,
        community: item.community_name,
        title: item.title,
        body: item.body,
        score: item.up_votes.unwrap_or(0),
        reply_count: item.number_of_replies.unwrap_or(0),
        created_at: item.created_at,
    }
}

fn provider_error(err: ApifyError) -> ProviderError {
    match err {
        ApifyError::RateLimited { .. } => ProviderError::RateLimited(err.to_string()),
        ApifyError::Unauthorized { .. } => ProviderError::Auth(err.to_string()),
        ApifyError::Api { status, .. } if status >= 500 => {
            ProviderError::Unavailable(err.to_string())
        }
        ApifyError::Http(_) => ProviderError::Unavailable(err.to_string()),
        ApifyError::Api { .. } | ApifyError::Deserialize { .. } => {
            ProviderError::Rejected(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_takes_post_id_as_parent() {
        let raw = raw_item(RawRedditItem {
            data_type: Some("comment".into()),
            id: Some("t1_c".into()),
            post_id: Some("t3_p".into()),
            parent_id: Some("t1_other".into()),
            username: Some("alice".into()),
            community_name: Some("r/acme".into()),
            body: Some("great".into()),
            up_votes: Some(12),
            ..RawRedditItem::default()
        });

        assert_eq!(raw.kind, "comment");
        assert_eq!(raw.parent_id.as_deref(), Some("t3_p"));
        assert_eq!(raw.author.as_deref(), Some("alice"));
        assert_eq!(raw.score, 12);
        assert_eq!(raw.reply_count, 0);
    }

    #[test]
    fn missing_type_defaults_to_post() {
        let raw = raw_item(RawRedditItem::default());
        assert_eq!(raw.kind, "post");
    }

    #[test]
    fn errors_map_onto_retry_buckets() {
        let auth = provider_error(ApifyError::Unauthorized { status: 401 });
        assert!(matches!(auth, ProviderError::Auth(_)));
        assert!(!auth.is_retryable());

        let limited = provider_error(ApifyError::RateLimited {
            actor: "a".into(),
            retry_after_secs: 5,
        });
        assert!(limited.is_retryable());

        let server = provider_error(ApifyError::Api {
            actor: "a".into(),
            status: 502,
            message: String::new(),
        });
        assert!(matches!(server, ProviderError::Unavailable(_)));

        let bad = provider_error(ApifyError::Api {
            actor: "a".into(),
            status: 400,
            message: "invalid input".into(),
        });
        assert!(matches!(bad, ProviderError::Rejected(_)));
    }
}
