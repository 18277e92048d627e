use brandscan_core::ProspectConfig;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Upsert prospects from the seed file.
///
/// Returns the number of prospects processed (inserted or updated). All
/// upserts run inside a single transaction; if any fails the whole batch is
/// rolled back. Existing statuses are left as they are.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_prospects(pool: &PgPool, prospects: &[ProspectConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for prospect in prospects {
        sqlx::query(
            "INSERT INTO prospects (public_id, brand_name, brand_key, industry_category, website, notes) \
             VALUES ($1, $2, lower(trim($2)), $3, $4, $5) \
             ON CONFLICT (brand_key) DO UPDATE SET \
                 brand_name = EXCLUDED.brand_name, \
                 industry_category = EXCLUDED.industry_category, \
                 website = EXCLUDED.website, \
                 notes = EXCLUDED.notes, \
                 updated_at = NOW()",
        )
        .bind(Uuid::new_v4())
        .bind(prospect.brand_name.trim())
        .bind(&prospect.industry_category)
        .bind(&prospect.website)
        .bind(&prospect.notes)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    tracing::info!(count, "seeded prospects");
    Ok(count)
}
