//! Database operations for the `discovered_urls` table.

use brandscan_core::DiscoveredUrl;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `discovered_urls` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscoveredUrlRow {
    pub id: i64,
    pub prospect_id: i64,
    pub url: String,
    pub processed: bool,
    pub discovered_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<DiscoveredUrlRow> for DiscoveredUrl {
    fn from(row: DiscoveredUrlRow) -> Self {
        DiscoveredUrl {
            id: row.id,
            prospect_id: row.prospect_id,
            url: row.url,
            processed: row.processed,
            discovered_at: row.discovered_at,
        }
    }
}

/// Record candidate URLs for a prospect as pending.
///
/// URLs already on record for the prospect are skipped, as are repeats within
/// `urls`. Rows are inserted in slice order so `id` order matches discovery
/// order. Returns the number of newly inserted rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_discovered_urls(
    pool: &PgPool,
    prospect_id: i64,
    urls: &[String],
) -> Result<u64, DbError> {
    if urls.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "INSERT INTO discovered_urls (prospect_id, url) \
         SELECT $1, t.url \
         FROM UNNEST($2::text[]) WITH ORDINALITY AS t(url, ord) \
         ORDER BY t.ord \
         ON CONFLICT (prospect_id, url) DO NOTHING",
    )
    .bind(prospect_id)
    .bind(urls)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// List a prospect's URLs in discovery order, optionally only those still pending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_discovered_urls(
    pool: &PgPool,
    prospect_id: i64,
    only_pending: bool,
) -> Result<Vec<DiscoveredUrlRow>, DbError> {
    let rows = sqlx::query_as::<_, DiscoveredUrlRow>(
        "SELECT id, prospect_id, url, processed, discovered_at, processed_at \
         FROM discovered_urls \
         WHERE prospect_id = $1 AND (NOT $2 OR processed = false) \
         ORDER BY id",
    )
    .bind(prospect_id)
    .bind(only_pending)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Flip `processed` to true for the given URLs of one prospect.
///
/// Rows that are already processed are left alone, so repeating the call is a
/// no-op. Returns the number of rows that changed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_urls_processed(
    pool: &PgPool,
    prospect_id: i64,
    urls: &[String],
) -> Result<u64, DbError> {
    if urls.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "UPDATE discovered_urls \
         SET processed = true, processed_at = NOW() \
         WHERE prospect_id = $1 AND url = ANY($2) AND processed = false",
    )
    .bind(prospect_id)
    .bind(urls)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
