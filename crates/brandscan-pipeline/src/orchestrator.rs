//! Drives prospects through discovery, scrape, clean and analysis.
//!
//! Each prospect runs its own state machine
//! (`discovering → scraping → cleaning → analyzing → done`, or `failed`)
//! and shares nothing with other prospects except the persistence gateway.
//! A prospect's failure is recorded and reported; the run carries on.

use std::future::Future;
use std::sync::Arc;

use brandscan_core::{AnalysisResult, Prospect, ProspectStatus, ScrapedItem};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::analysis::analyze;
use crate::clean::{clean_items, CleanOptions};
use crate::discovery::discover_sources;
use crate::error::{PersistenceError, PipelineError};
use crate::providers::{LanguageModel, PersistenceGateway, ScrapeProvider, SearchProvider};
use crate::scrape::scrape_urls;
use crate::types::{
    PipelineConfig, ProspectOutcome, ProspectReport, ProspectStats, RunReport, Scope,
};

pub struct Orchestrator {
    search: Arc<dyn SearchProvider>,
    scraper: Arc<dyn ScrapeProvider>,
    model: Arc<dyn LanguageModel>,
    store: Arc<dyn PersistenceGateway>,
    config: PipelineConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        search: Arc<dyn SearchProvider>,
        scraper: Arc<dyn ScrapeProvider>,
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn PersistenceGateway>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            search,
            scraper,
            model,
            store,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve `scope` to prospects and run each one.
    ///
    /// Prospects run concurrently up to `max_concurrent_prospects`. Once
    /// `cancel` fires, prospects already in flight finish and the rest are
    /// reported as skipped. The report lists prospects in resolution order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] only if the scope cannot be
    /// resolved. Per-prospect failures are carried in the [`RunReport`].
    pub async fn run(
        &self,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let prospects = self.resolve_scope(scope).await?;
        tracing::info!(count = prospects.len(), "starting run");

        let mut indexed: Vec<(usize, ProspectReport)> =
            stream::iter(prospects.into_iter().enumerate())
                .map(|(index, prospect)| async move {
                    (index, self.run_prospect(prospect, cancel).await)
                })
                .buffer_unordered(self.config.max_concurrent_prospects.max(1))
                .collect()
                .await;
        indexed.sort_by_key(|(index, _)| *index);

        let report = RunReport {
            prospects: indexed.into_iter().map(|(_, report)| report).collect(),
        };
        tracing::info!(
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            skipped = report.skipped_count(),
            "run complete"
        );
        Ok(report)
    }

    async fn resolve_scope(&self, scope: &Scope) -> Result<Vec<Prospect>, PersistenceError> {
        match scope {
            Scope::AllProspects => self.db("list_prospects", self.store.list_prospects()).await,
            Scope::Brand { name, category } => {
                let prospect = self
                    .db(
                        "upsert_prospect",
                        self.store.upsert_prospect(name, category.as_deref()),
                    )
                    .await?;
                Ok(vec![prospect])
            }
        }
    }

    /// Run one prospect, retrying retryable failures per configuration.
    async fn run_prospect(&self, prospect: Prospect, cancel: &CancellationToken) -> ProspectReport {
        let mut report = ProspectReport {
            brand_name: prospect.brand_name.clone(),
            prospect_id: prospect.id,
            outcome: ProspectOutcome::Skipped,
            stats: ProspectStats::default(),
            attempts: 0,
        };
        if cancel.is_cancelled() {
            tracing::info!(brand = %prospect.brand_name, "run cancelled, skipping prospect");
            return report;
        }

        loop {
            report.attempts += 1;
            report.stats = ProspectStats::default();

            let err = match self.process(&prospect, &mut report.stats).await {
                Ok(result) => {
                    tracing::info!(
                        brand = %prospect.brand_name,
                        prospect_id = prospect.id,
                        attempts = report.attempts,
                        "prospect done"
                    );
                    report.outcome = ProspectOutcome::Succeeded(result);
                    return report;
                }
                Err(err) => err,
            };

            let retries_left = report.attempts <= self.config.prospect_retries;
            if err.is_retryable() && retries_left && !cancel.is_cancelled() {
                tracing::warn!(
                    brand = %prospect.brand_name,
                    attempt = report.attempts,
                    error = %err,
                    delay_secs = self.config.prospect_retry_delay.as_secs(),
                    "prospect failed, retrying"
                );
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(self.config.prospect_retry_delay) => continue,
                }
            }

            let reason = err.to_string();
            tracing::error!(
                brand = %prospect.brand_name,
                prospect_id = prospect.id,
                attempts = report.attempts,
                error = %reason,
                "prospect failed"
            );
            self.mark_failed(prospect.id, &reason).await;
            report.outcome = ProspectOutcome::Failed { reason };
            return report;
        }
    }

    async fn process(
        &self,
        prospect: &Prospect,
        stats: &mut ProspectStats,
    ) -> Result<AnalysisResult, PipelineError> {
        let id = prospect.id;
        let brand = prospect.brand_name.as_str();

        // Discovery
        self.set_status(id, ProspectStatus::Discovering).await?;
        let found = discover_sources(
            self.search.as_ref(),
            &self.config,
            brand,
            prospect.industry_category.as_deref(),
        )
        .await?;
        let inserted = self
            .db(
                "insert_discovered_urls",
                self.store.insert_discovered_urls(id, &found),
            )
            .await?;
        let recorded = self
            .db(
                "list_discovered_urls",
                self.store.list_discovered_urls(id, false),
            )
            .await?;
        stats.urls_found = recorded.len();
        tracing::info!(
            brand,
            prospect_id = id,
            count = recorded.len(),
            new = inserted,
            "sources recorded"
        );
        if recorded.is_empty() {
            return Err(PipelineError::NoSources);
        }

        // Scrape
        self.set_status(id, ProspectStatus::Scraping).await?;
        let pending: Vec<String> = recorded
            .into_iter()
            .filter(|u| !u.processed)
            .map(|u| u.url)
            .collect();
        if pending.is_empty() {
            tracing::info!(brand, prospect_id = id, "all sources already processed");
        } else {
            self.scrape_pending(id, brand, &pending, stats).await?;
        }

        // Clean
        self.set_status(id, ProspectStatus::Cleaning).await?;
        let stored = self.db("list_items", self.store.list_items(id)).await?;
        if stored.is_empty() {
            return Err(PipelineError::NoContent);
        }
        let cleaned = clean_items(
            &stored,
            CleanOptions {
                min_chars: self.config.min_item_chars,
                max_chars: self.config.max_item_chars,
            },
        );
        stats.items_cleaned = cleaned.len();
        tracing::info!(
            brand,
            prospect_id = id,
            stored = stored.len(),
            count = cleaned.len(),
            "items cleaned"
        );
        if cleaned.is_empty() {
            return Err(PipelineError::NoValidContent);
        }

        // Analyze
        self.set_status(id, ProspectStatus::Analyzing).await?;
        let result = analyze(self.model.as_ref(), &self.config, &cleaned, brand, id).await?;
        self.db(
            "insert_analysis_result",
            self.store.insert_analysis_result(&result),
        )
        .await?;
        self.set_status(id, ProspectStatus::Done).await?;

        Ok(result)
    }

    /// Scrape pending URLs and persist each success before marking it
    /// processed. A URL whose items fail to persist stays pending.
    async fn scrape_pending(
        &self,
        prospect_id: i64,
        brand: &str,
        pending: &[String],
        stats: &mut ProspectStats,
    ) -> Result<(), PipelineError> {
        let batch = scrape_urls(
            self.scraper.as_ref(),
            &self.config,
            pending,
            brand,
            prospect_id,
        )
        .await?;
        stats.urls_failed = batch.failed_count();

        let mut last_persist_error = None;
        for (url, items) in batch.succeeded() {
            match self.persist_url(prospect_id, url, items).await {
                Ok(()) => {
                    stats.urls_scraped += 1;
                    stats.items_scraped += items.len();
                }
                Err(e) => {
                    tracing::warn!(
                        brand,
                        url,
                        error = %e,
                        "could not persist scraped items, URL stays pending"
                    );
                    stats.urls_failed += 1;
                    last_persist_error = Some(e);
                }
            }
        }

        tracing::info!(
            brand,
            prospect_id,
            scraped = stats.urls_scraped,
            failed = stats.urls_failed,
            count = stats.items_scraped,
            "scrape complete"
        );

        match last_persist_error {
            Some(e) if stats.urls_scraped == 0 => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn persist_url(
        &self,
        prospect_id: i64,
        url: &str,
        items: &[ScrapedItem],
    ) -> Result<(), PersistenceError> {
        if !items.is_empty() {
            self.db("bulk_insert_items", self.store.bulk_insert_items(items))
                .await?;
        }
        let urls = [url.to_string()];
        self.db(
            "mark_urls_processed",
            self.store.mark_urls_processed(prospect_id, &urls),
        )
        .await?;
        Ok(())
    }

    async fn set_status(
        &self,
        prospect_id: i64,
        status: ProspectStatus,
    ) -> Result<(), PersistenceError> {
        tracing::debug!(prospect_id, status = %status, "prospect status");
        self.db(
            "set_prospect_status",
            self.store.set_prospect_status(prospect_id, status, None),
        )
        .await
    }

    /// Best-effort: a failure to record the failure is only logged.
    async fn mark_failed(&self, prospect_id: i64, reason: &str) {
        let write = self
            .store
            .set_prospect_status(prospect_id, ProspectStatus::Failed, Some(reason));
        if let Err(e) = self.db("set_prospect_status", write).await {
            tracing::warn!(prospect_id, error = %e, "could not record prospect failure");
        }
    }

    async fn db<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, PersistenceError>>,
    ) -> Result<T, PersistenceError> {
        tokio::time::timeout(self.config.db_timeout, call)
            .await
            .map_err(|_| PersistenceError::Timeout {
                operation,
                secs: self.config.db_timeout.as_secs(),
            })?
    }
}
