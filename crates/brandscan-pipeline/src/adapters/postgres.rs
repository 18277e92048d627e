use async_trait::async_trait;
use brandscan_core::{AnalysisResult, DiscoveredUrl, Prospect, ProspectStatus, ScrapedItem};
use sqlx::PgPool;

use crate::error::PersistenceError;
use crate::providers::PersistenceGateway;

/// Persistence gateway backed by the Postgres schema in `migrations/`.
pub struct PgGateway {
    pool: PgPool,
    insert_chunk_size: usize,
}

impl PgGateway {
    #[must_use]
    pub fn new(pool: PgPool, insert_chunk_size: usize) -> Self {
        Self {
            pool,
            insert_chunk_size: insert_chunk_size.max(1),
        }
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn upsert_prospect(
        &self,
        brand_name: &str,
        category: Option<&str>,
    ) -> Result<Prospect, PersistenceError> {
        let row = brandscan_db::upsert_prospect(&self.pool, brand_name, category, None, None).await?;
        Ok(row.into_prospect()?)
    }

    async fn list_prospects(&self) -> Result<Vec<Prospect>, PersistenceError> {
        let rows = brandscan_db::list_prospects(&self.pool).await?;
        rows.into_iter()
            .map(|row| row.into_prospect().map_err(PersistenceError::from))
            .collect()
    }

    async fn set_prospect_status(
        &self,
        prospect_id: i64,
        status: ProspectStatus,
        error: Option<&str>,
    ) -> Result<(), PersistenceError> {
        brandscan_db::set_prospect_status(&self.pool, prospect_id, status, error).await?;
        Ok(())
    }

    async fn insert_discovered_urls(
        &self,
        prospect_id: i64,
        urls: &[String],
    ) -> Result<u64, PersistenceError> {
        Ok(brandscan_db::insert_discovered_urls(&self.pool, prospect_id, urls).await?)
    }

    async fn list_discovered_urls(
        &self,
        prospect_id: i64,
        only_pending: bool,
    ) -> Result<Vec<DiscoveredUrl>, PersistenceError> {
        let rows = brandscan_db::list_discovered_urls(&self.pool, prospect_id, only_pending).await?;
        Ok(rows.into_iter().map(DiscoveredUrl::from).collect())
    }

    async fn mark_urls_processed(
        &self,
        prospect_id: i64,
        urls: &[String],
    ) -> Result<u64, PersistenceError> {
        Ok(brandscan_db::mark_urls_processed(&self.pool, prospect_id, urls).await?)
    }

    async fn bulk_insert_items(&self, items: &[ScrapedItem]) -> Result<u64, PersistenceError> {
        Ok(brandscan_db::bulk_insert_items(&self.pool, items, self.insert_chunk_size).await?)
    }

    async fn list_items(&self, prospect_id: i64) -> Result<Vec<ScrapedItem>, PersistenceError> {
        let rows = brandscan_db::list_items_for_prospect(&self.pool, prospect_id).await?;
        rows.into_iter()
            .map(|row| row.into_scraped_item().map_err(PersistenceError::from))
            .collect()
    }

    async fn insert_analysis_result(
        &self,
        result: &AnalysisResult,
    ) -> Result<i64, PersistenceError> {
        Ok(brandscan_db::insert_analysis_result(&self.pool, result).await?)
    }
}
