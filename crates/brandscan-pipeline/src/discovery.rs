//! Discovery stage: one search call per prospect, filtered to community
//! thread URLs, deduplicated and capped.

use std::collections::HashSet;

use reqwest::Url;

use crate::error::DiscoveryError;
use crate::providers::SearchProvider;
use crate::types::PipelineConfig;

/// Search query for a brand, restricted to the target platform.
#[must_use]
pub fn build_query(brand_name: &str, category: Option<&str>) -> String {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => format!("reddit:{} {category}", brand_name.trim()),
        None => format!("reddit:{}", brand_name.trim()),
    }
}

/// Whether `url` points at a community thread on one of the source hosts.
///
/// Requires an http(s) scheme, a host equal to or under a configured source
/// host, and a path starting with the configured prefix.
#[must_use]
pub fn is_source_url(url: &str, config: &PipelineConfig) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let host_matches = config.source_hosts.iter().any(|source| {
        let source = source.to_ascii_lowercase();
        host == source || host.ends_with(&format!(".{source}"))
    });

    host_matches && parsed.path().starts_with(&config.source_path_prefix)
}

/// Find candidate source URLs for a brand.
///
/// Calls the search provider exactly once. Results keep the provider's order;
/// exact-duplicate URLs are dropped before truncating to
/// `config.max_source_urls`.
///
/// # Errors
///
/// Returns [`DiscoveryError::Provider`] if the search fails, or
/// [`DiscoveryError::Timeout`] if it does not answer within
/// `config.search_timeout`.
pub async fn discover_sources(
    search: &dyn SearchProvider,
    config: &PipelineConfig,
    brand_name: &str,
    category: Option<&str>,
) -> Result<Vec<String>, DiscoveryError> {
    let query = build_query(brand_name, category);
    tracing::debug!(brand = brand_name, query = %query, "searching for sources");

    let hits = tokio::time::timeout(config.search_timeout, search.search(&query))
        .await
        .map_err(|_| DiscoveryError::Timeout {
            secs: config.search_timeout.as_secs(),
        })??;

    let returned = hits.len();
    let mut seen = HashSet::new();
    let urls: Vec<String> = hits
        .into_iter()
        .map(|hit| hit.url)
        .filter(|url| is_source_url(url, config))
        .filter(|url| seen.insert(url.clone()))
        .take(config.max_source_urls)
        .collect();

    tracing::info!(
        brand = brand_name,
        returned,
        count = urls.len(),
        "discovery complete"
    );
    Ok(urls)
}
