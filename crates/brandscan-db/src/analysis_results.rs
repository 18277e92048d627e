//! Database operations for the append-only `analysis_results` table.

use brandscan_core::{AnalysisResult, SentimentBreakdown};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from `analysis_results`, joined with the owning prospect's name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisResultRow {
    pub id: i64,
    pub prospect_id: i64,
    pub brand_name: String,
    pub key_insight: String,
    pub themes: Vec<String>,
    pub recommendations: Vec<String>,
    pub sentiment_positive: Option<i32>,
    pub sentiment_negative: Option<i32>,
    pub sentiment_neutral: Option<i32>,
    pub customer_segments: Vec<String>,
    pub report: Option<String>,
    pub batch_count: i32,
    pub item_count: i32,
    pub generated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResultRow {
    /// The stored breakdown, present only when all three columns are set.
    #[must_use]
    pub fn sentiment(&self) -> Option<SentimentBreakdown> {
        Some(SentimentBreakdown {
            positive: self.sentiment_positive?,
            negative: self.sentiment_negative?,
            neutral: self.sentiment_neutral?,
        })
    }
}

impl From<AnalysisResultRow> for AnalysisResult {
    fn from(row: AnalysisResultRow) -> Self {
        let sentiment = row.sentiment();
        AnalysisResult {
            prospect_id: row.prospect_id,
            key_insight: row.key_insight,
            themes: row.themes,
            recommendations: row.recommendations,
            sentiment,
            customer_segments: row.customer_segments,
            report: row.report,
            batch_count: row.batch_count,
            item_count: row.item_count,
            generated_at: row.generated_at,
        }
    }
}

const RESULT_SELECT: &str = "SELECT r.id, r.prospect_id, p.brand_name, r.key_insight, r.themes, \
                                    r.recommendations, r.sentiment_positive, \
                                    r.sentiment_negative, r.sentiment_neutral, \
                                    r.customer_segments, r.report, r.batch_count, r.item_count, \
                                    r.generated_at, r.created_at \
                             FROM analysis_results r \
                             JOIN prospects p ON p.id = r.prospect_id";

/// Append a result and return its generated id. Existing results are never
/// touched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_analysis_result(
    pool: &PgPool,
    result: &AnalysisResult,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO analysis_results \
             (prospect_id, key_insight, themes, recommendations, \
              sentiment_positive, sentiment_negative, sentiment_neutral, \
              customer_segments, report, batch_count, item_count, generated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING id",
    )
    .bind(result.prospect_id)
    .bind(&result.key_insight)
    .bind(&result.themes)
    .bind(&result.recommendations)
    .bind(result.sentiment.map(|s| s.positive))
    .bind(result.sentiment.map(|s| s.negative))
    .bind(result.sentiment.map(|s| s.neutral))
    .bind(&result.customer_segments)
    .bind(&result.report)
    .bind(result.batch_count)
    .bind(result.item_count)
    .bind(result.generated_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// The most recent result for a prospect, or `None` if it has never been analyzed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_analysis_result(
    pool: &PgPool,
    prospect_id: i64,
) -> Result<Option<AnalysisResultRow>, DbError> {
    let sql = format!(
        "{RESULT_SELECT} WHERE r.prospect_id = $1 ORDER BY r.generated_at DESC, r.id DESC LIMIT 1"
    );

    let row = sqlx::query_as::<_, AnalysisResultRow>(&sql)
        .bind(prospect_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// List recent results, newest first, optionally filtered by prospect.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_analysis_results(
    pool: &PgPool,
    prospect_id: Option<i64>,
    limit: i64,
) -> Result<Vec<AnalysisResultRow>, DbError> {
    let rows = match prospect_id {
        Some(id) => {
            let sql = format!(
                "{RESULT_SELECT} WHERE r.prospect_id = $1 \
                 ORDER BY r.generated_at DESC, r.id DESC LIMIT $2"
            );
            sqlx::query_as::<_, AnalysisResultRow>(&sql)
                .bind(id)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{RESULT_SELECT} ORDER BY r.generated_at DESC, r.id DESC LIMIT $1");
            sqlx::query_as::<_, AnalysisResultRow>(&sql)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}
