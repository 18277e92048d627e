//! Database operations for the `prospects` table.

use brandscan_core::{Prospect, ProspectStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `prospects` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProspectRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_name: String,
    pub industry_category: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProspectRow {
    /// Convert into the domain type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if the stored status is not a known value.
    pub fn into_prospect(self) -> Result<Prospect, DbError> {
        Ok(Prospect {
            id: self.id,
            brand_name: self.brand_name,
            industry_category: self.industry_category,
            status: self.status.parse::<ProspectStatus>()?,
        })
    }
}

const PROSPECT_COLUMNS: &str = "id, public_id, brand_name, industry_category, website, notes, \
                                status, last_error, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Get-or-create a prospect by brand name.
///
/// Identity is the trimmed, lowercased brand name. On conflict the stored
/// optional fields are only overwritten by non-null inputs, and `status` is
/// left untouched so an in-flight or failed prospect keeps its state.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_prospect(
    pool: &PgPool,
    brand_name: &str,
    industry_category: Option<&str>,
    website: Option<&str>,
    notes: Option<&str>,
) -> Result<ProspectRow, DbError> {
    let sql = format!(
        "INSERT INTO prospects (public_id, brand_name, brand_key, industry_category, website, notes) \
         VALUES ($1, $2, lower(trim($2)), $3, $4, $5) \
         ON CONFLICT (brand_key) DO UPDATE SET \
             industry_category = COALESCE(EXCLUDED.industry_category, prospects.industry_category), \
             website = COALESCE(EXCLUDED.website, prospects.website), \
             notes = COALESCE(EXCLUDED.notes, prospects.notes), \
             updated_at = NOW() \
         RETURNING {PROSPECT_COLUMNS}"
    );

    let row = sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(brand_name.trim())
        .bind(industry_category)
        .bind(website)
        .bind(notes)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Look up a prospect by brand name (case-insensitive, whitespace-trimmed).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_prospect_by_name(
    pool: &PgPool,
    brand_name: &str,
) -> Result<Option<ProspectRow>, DbError> {
    let sql = format!("SELECT {PROSPECT_COLUMNS} FROM prospects WHERE brand_key = lower(trim($1))");

    let row = sqlx::query_as::<_, ProspectRow>(&sql)
        .bind(brand_name)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// List every known prospect in creation order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prospects(pool: &PgPool) -> Result<Vec<ProspectRow>, DbError> {
    let sql = format!("SELECT {PROSPECT_COLUMNS} FROM prospects ORDER BY id");

    let rows = sqlx::query_as::<_, ProspectRow>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Record a lifecycle transition.
///
/// `error` is stored in `last_error`; passing `None` clears it, so a prospect
/// that later succeeds does not keep a stale failure reason.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no prospect has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_prospect_status(
    pool: &PgPool,
    id: i64,
    status: ProspectStatus,
    error: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE prospects \
         SET status = $2, last_error = $3, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(error)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
