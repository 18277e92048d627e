//! Database operations for the `scraped_items` table.

use brandscan_core::{ItemKind, ScrapedItem};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `scraped_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapedItemRow {
    pub id: i64,
    pub prospect_id: i64,
    pub source_url: String,
    pub kind: String,
    pub external_id: Option<String>,
    pub parent_external_id: Option<String>,
    pub author: Option<String>,
    pub community: Option<String>,
    pub score: i32,
    pub reply_count: i32,
    pub created_at_source: Option<DateTime<Utc>>,
    pub body: String,
    pub brand_name: String,
    pub content_hash: String,
    pub inserted_at: DateTime<Utc>,
}

impl ScrapedItemRow {
    /// Convert into the domain type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if the stored kind is not `post` or `comment`.
    pub fn into_scraped_item(self) -> Result<ScrapedItem, DbError> {
        Ok(ScrapedItem {
            source_url: self.source_url,
            kind: self.kind.parse::<ItemKind>()?,
            external_id: self.external_id,
            parent_external_id: self.parent_external_id,
            author: self.author,
            community: self.community,
            score: self.score,
            reply_count: self.reply_count,
            created_at: self.created_at_source,
            text: self.body,
            brand_name: self.brand_name,
            prospect_id: self.prospect_id,
        })
    }
}

/// Stable identity of a scraped item within its prospect.
///
/// Hashes provenance and text, so the same post scraped twice from the same
/// URL maps to the same value.
#[must_use]
pub fn content_hash(item: &ScrapedItem) -> String {
    let mut hasher = Sha256::new();
    for part in [
        item.source_url.as_str(),
        item.kind.as_str(),
        item.external_id.as_deref().unwrap_or(""),
        item.author.as_deref().unwrap_or(""),
        item.text.as_str(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert scraped items in chunks of `chunk_size` rows.
///
/// Each chunk is one statement, so it lands entirely or not at all. Items
/// whose content hash is already stored for the prospect are skipped, which
/// makes retrying after a partial failure safe. Returns the number of rows
/// actually inserted.
///
/// # Errors
///
/// Returns [`DbError::ChunkInsert`] naming the first chunk that failed.
/// Earlier chunks stay committed.
pub async fn bulk_insert_items(
    pool: &PgPool,
    items: &[ScrapedItem],
    chunk_size: usize,
) -> Result<u64, DbError> {
    let chunk_size = chunk_size.max(1);
    let chunk_count = items.len().div_ceil(chunk_size);
    let mut inserted = 0u64;

    for (chunk_index, chunk) in items.chunks(chunk_size).enumerate() {
        match insert_chunk(pool, chunk).await {
            Ok(n) => inserted += n,
            Err(source) => {
                tracing::warn!(
                    chunk_index,
                    chunk_count,
                    inserted,
                    error = %source,
                    "scraped item chunk insert failed"
                );
                return Err(DbError::ChunkInsert {
                    chunk_index,
                    chunk_count,
                    inserted,
                    source,
                });
            }
        }
    }

    Ok(inserted)
}

async fn insert_chunk(pool: &PgPool, chunk: &[ScrapedItem]) -> Result<u64, sqlx::Error> {
    let mut prospect_ids = Vec::with_capacity(chunk.len());
    let mut source_urls = Vec::with_capacity(chunk.len());
    let mut kinds = Vec::with_capacity(chunk.len());
    let mut external_ids = Vec::with_capacity(chunk.len());
    let mut parent_ids = Vec::with_capacity(chunk.len());
    let mut authors = Vec::with_capacity(chunk.len());
    let mut communities = Vec::with_capacity(chunk.len());
    let mut scores = Vec::with_capacity(chunk.len());
    let mut reply_counts = Vec::with_capacity(chunk.len());
    let mut created = Vec::with_capacity(chunk.len());
    let mut bodies = Vec::with_capacity(chunk.len());
    let mut brand_names = Vec::with_capacity(chunk.len());
    let mut hashes = Vec::with_capacity(chunk.len());

    for item in chunk {
        prospect_ids.push(item.prospect_id);
        source_urls.push(item.source_url.clone());
        kinds.push(item.kind.as_str().to_string());
        external_ids.push(item.external_id.clone());
        parent_ids.push(item.parent_external_id.clone());
        authors.push(item.author.clone());
        communities.push(item.community.clone());
        scores.push(item.score);
        reply_counts.push(item.reply_count);
        created.push(item.created_at);
        bodies.push(item.text.clone());
        brand_names.push(item.brand_name.clone());
        hashes.push(content_hash(item));
    }

    let result = sqlx::query(
        "INSERT INTO scraped_items \
             (prospect_id, source_url, kind, external_id, parent_external_id, author, \
              community, score, reply_count, created_at_source, body, brand_name, content_hash) \
         SELECT * FROM UNNEST( \
             $1::bigint[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[], \
             $7::text[], $8::int[], $9::int[], $10::timestamptz[], $11::text[], $12::text[], \
             $13::text[]) \
         ON CONFLICT (prospect_id, content_hash) DO NOTHING",
    )
    .bind(&prospect_ids)
    .bind(&source_urls)
    .bind(&kinds)
    .bind(&external_ids)
    .bind(&parent_ids)
    .bind(&authors)
    .bind(&communities)
    .bind(&scores)
    .bind(&reply_counts)
    .bind(&created)
    .bind(&bodies)
    .bind(&brand_names)
    .bind(&hashes)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// All stored items for a prospect in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_items_for_prospect(
    pool: &PgPool,
    prospect_id: i64,
) -> Result<Vec<ScrapedItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapedItemRow>(
        "SELECT id, prospect_id, source_url, kind, external_id, parent_external_id, author, \
                community, score, reply_count, created_at_source, body, brand_name, \
                content_hash, inserted_at \
         FROM scraped_items \
         WHERE prospect_id = $1 \
         ORDER BY id",
    )
    .bind(prospect_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_items_for_prospect(pool: &PgPool, prospect_id: i64) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scraped_items WHERE prospect_id = $1")
        .bind(prospect_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
