//! In-memory collaborators for orchestrator tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use brandscan_core::{AnalysisResult, DiscoveredUrl, Prospect, ProspectStatus, ScrapedItem};
use brandscan_pipeline::{
    LanguageModel, Orchestrator, PersistenceError, PersistenceGateway, PipelineConfig,
    ProviderError, RawItem, ScrapeProvider, SearchHit, SearchProvider,
};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Calls currently in flight and the highest count seen.
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Hold a slot in `gauge` for `delay`.
async fn occupy(gauge: &InFlight, delay: Duration) {
    gauge.enter();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    gauge.exit();
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    prospects: Vec<Prospect>,
    urls: Vec<DiscoveredUrl>,
    items: Vec<(String, ScrapedItem)>,
    results: Vec<AnalysisResult>,
    history: Vec<(i64, ProspectStatus)>,
    last_error: HashMap<i64, Option<String>>,
}

/// Mirrors the Postgres gateway's uniqueness rules in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    /// Bulk inserts containing an item from one of these URLs fail.
    failing_item_urls: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn fail_items_from(&self, url: &str) {
        self.failing_item_urls
            .lock()
            .unwrap()
            .insert(url.to_string());
    }

    pub fn add_prospect(&self, brand_name: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = i64::try_from(state.prospects.len()).unwrap() + 1;
        state.prospects.push(Prospect {
            id,
            brand_name: brand_name.to_string(),
            industry_category: None,
            status: ProspectStatus::Pending,
        });
        id
    }

    pub fn prospect_id(&self, brand_name: &str) -> i64 {
        self.state
            .lock()
            .unwrap()
            .prospects
            .iter()
            .find(|p| p.brand_name == brand_name)
            .map(|p| p.id)
            .expect("prospect exists")
    }

    pub fn status(&self, prospect_id: i64) -> ProspectStatus {
        self.state
            .lock()
            .unwrap()
            .prospects
            .iter()
            .find(|p| p.id == prospect_id)
            .map(|p| p.status)
            .expect("prospect exists")
    }

    pub fn last_error(&self, prospect_id: i64) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .last_error
            .get(&prospect_id)
            .cloned()
            .flatten()
    }

    pub fn status_history(&self, prospect_id: i64) -> Vec<ProspectStatus> {
        self.state
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|(id, _)| *id == prospect_id)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn urls(&self, prospect_id: i64) -> Vec<DiscoveredUrl> {
        self.state
            .lock()
            .unwrap()
            .urls
            .iter()
            .filter(|u| u.prospect_id == prospect_id)
            .cloned()
            .collect()
    }

    pub fn is_processed(&self, prospect_id: i64, url: &str) -> bool {
        self.urls(prospect_id)
            .iter()
            .any(|u| u.url == url && u.processed)
    }

    pub fn item_count(&self, prospect_id: i64) -> usize {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|(_, i)| i.prospect_id == prospect_id)
            .count()
    }

    pub fn results(&self, prospect_id: i64) -> Vec<AnalysisResult> {
        self.state
            .lock()
            .unwrap()
            .results
            .iter()
            .filter(|r| r.prospect_id == prospect_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn upsert_prospect(
        &self,
        brand_name: &str,
        category: Option<&str>,
    ) -> Result<Prospect, PersistenceError> {
        let mut state = self.state.lock().unwrap();
        let key = brand_name.trim().to_lowercase();
        if let Some(p) = state
            .prospects
            .iter_mut()
            .find(|p| p.brand_name.to_lowercase() == key)
        {
            if category.is_some() {
                p.industry_category = category.map(str::to_string);
            }
            return Ok(p.clone());
        }
        let prospect = Prospect {
            id: i64::try_from(state.prospects.len()).unwrap() + 1,
            brand_name: brand_name.trim().to_string(),
            industry_category: category.map(str::to_string),
            status: ProspectStatus::Pending,
        };
        state.prospects.push(prospect.clone());
        Ok(prospect)
    }

    async fn list_prospects(&self) -> Result<Vec<Prospect>, PersistenceError> {
        Ok(self.state.lock().unwrap().prospects.clone())
    }

    async fn set_prospect_status(
        &self,
        prospect_id: i64,
        status: ProspectStatus,
        error: Option<&str>,
    ) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().unwrap();
        let prospect = state
            .prospects
            .iter_mut()
            .find(|p| p.id == prospect_id)
            .ok_or_else(|| PersistenceError::Store(format!("no prospect {prospect_id}")))?;
        prospect.status = status;
        state.history.push((prospect_id, status));
        state
            .last_error
            .insert(prospect_id, error.map(str::to_string));
        Ok(())
    }

    async fn insert_discovered_urls(
        &self,
        prospect_id: i64,
        urls: &[String],
    ) -> Result<u64, PersistenceError> {
        let mut state = self.state.lock().unwrap();
        let mut inserted = 0;
        for url in urls {
            let exists = state
                .urls
                .iter()
                .any(|u| u.prospect_id == prospect_id && &u.url == url);
            if !exists {
                let id = i64::try_from(state.urls.len()).unwrap() + 1;
                state.urls.push(DiscoveredUrl {
                    id,
                    prospect_id,
                    url: url.clone(),
                    processed: false,
                    discovered_at: Utc::now(),
                });
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_discovered_urls(
        &self,
        prospect_id: i64,
        only_pending: bool,
    ) -> Result<Vec<DiscoveredUrl>, PersistenceError> {
        Ok(self
            .urls(prospect_id)
            .into_iter()
            .filter(|u| !only_pending || !u.processed)
            .collect())
    }

    async fn mark_urls_processed(
        &self,
        prospect_id: i64,
        urls: &[String],
    ) -> Result<u64, PersistenceError> {
        let mut state = self.state.lock().unwrap();
        let mut changed = 0;
        for row in state
            .urls
            .iter_mut()
            .filter(|u| u.prospect_id == prospect_id && !u.processed && urls.contains(&u.url))
        {
            row.processed = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn bulk_insert_items(&self, items: &[ScrapedItem]) -> Result<u64, PersistenceError> {
        {
            let failing = self.failing_item_urls.lock().unwrap();
            if items.iter().any(|i| failing.contains(&i.source_url)) {
                return Err(PersistenceError::Store(
                    "bulk insert failed at chunk 0 of 1".to_string(),
                ));
            }
        }
        let mut state = self.state.lock().unwrap();
        let mut inserted = 0;
        for item in items {
            let hash = brandscan_db::content_hash(item);
            let exists = state
                .items
                .iter()
                .any(|(h, i)| i.prospect_id == item.prospect_id && *h == hash);
            if !exists {
                state.items.push((hash, item.clone()));
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_items(&self, prospect_id: i64) -> Result<Vec<ScrapedItem>, PersistenceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|(_, i)| i.prospect_id == prospect_id)
            .map(|(_, i)| i.clone())
            .collect())
    }

    async fn insert_analysis_result(
        &self,
        result: &AnalysisResult,
    ) -> Result<i64, PersistenceError> {
        let mut state = self.state.lock().unwrap();
        state.results.push(result.clone());
        Ok(i64::try_from(state.results.len()).unwrap())
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Returns canned URLs per query.
#[derive(Default)]
pub struct FakeSearch {
    results: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashMap<String, fn(String) -> ProviderError>>,
    pub calls: AtomicUsize,
    delay: Mutex<Duration>,
    pub in_flight: InFlight,
}

impl FakeSearch {
    pub fn returns(&self, query: &str, urls: &[&str]) {
        self.results.lock().unwrap().insert(
            query.to_string(),
            urls.iter().map(ToString::to_string).collect(),
        );
    }

    pub fn fails(&self, query: &str, error: fn(String) -> ProviderError) {
        self.failing
            .lock()
            .unwrap()
            .insert(query.to_string(), error);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn delay_each_call(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        occupy(&self.in_flight, delay).await;
        if let Some(error) = self.failing.lock().unwrap().get(query) {
            return Err(error(format!("search for {query} failed")));
        }
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(query)
            .map(|urls| {
                urls.iter()
                    .map(|url| SearchHit { url: url.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Scraper
// ---------------------------------------------------------------------------

/// Returns canned items per URL. Unknown URLs yield nothing.
#[derive(Default)]
pub struct FakeScraper {
    items: Mutex<HashMap<String, Vec<RawItem>>>,
    /// URL -> remaining number of calls that fail before succeeding.
    failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Duration>,
    /// Cancelled as soon as any scrape starts.
    cancel_on_scrape: Mutex<Option<CancellationToken>>,
    pub in_flight: InFlight,
}

impl FakeScraper {
    pub fn returns(&self, url: &str, items: Vec<RawItem>) {
        self.items.lock().unwrap().insert(url.to_string(), items);
    }

    pub fn always_fails(&self, url: &str) {
        self.fail_times(url, usize::MAX);
    }

    pub fn fail_times(&self, url: &str, times: usize) {
        self.failures.lock().unwrap().insert(url.to_string(), times);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn delay_each_call(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn cancel_on_scrape(&self, token: &CancellationToken) {
        *self.cancel_on_scrape.lock().unwrap() = Some(token.clone());
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| *u == url)
            .count()
    }
}

#[async_trait]
impl ScrapeProvider for FakeScraper {
    async fn scrape(
        &self,
        url: &str,
        _max_posts: u32,
        _max_comments: u32,
    ) -> Result<Vec<RawItem>, ProviderError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(token) = self.cancel_on_scrape.lock().unwrap().as_ref() {
            token.cancel();
        }
        let delay = *self.delay.lock().unwrap();
        occupy(&self.in_flight, delay).await;
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(url) {
                if *remaining > 0 {
                    *remaining = remaining.saturating_sub(1);
                    return Err(ProviderError::Unavailable(format!("{url} returned 503")));
                }
            }
        }
        Ok(self
            .items
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

pub const ANALYSIS_RESPONSE: &str = "<KEY_INSIGHT>Customers love the product but not the price.</KEY_INSIGHT>\n\
<THEMES>\n- pricing\n- support\n</THEMES>\n\
<RECOMMENDATIONS>\n- Introduce a lower-priced tier\n</RECOMMENDATIONS>\n\
<SENTIMENT>\npositive: 45%\nnegative: 40%\nneutral: 15%\n</SENTIMENT>\n\
<SEGMENTS>\n- Price-sensitive switchers\n</SEGMENTS>";

/// Answers every prompt with the same text, or the same error.
pub struct FakeModel {
    response: Mutex<Result<String, fn(String) -> ProviderError>>,
    pub prompts: Mutex<Vec<String>>,
}

impl Default for FakeModel {
    fn default() -> Self {
        Self {
            response: Mutex::new(Ok(ANALYSIS_RESPONSE.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl FakeModel {
    pub fn fails_with(&self, error: fn(String) -> ProviderError) {
        *self.response.lock().unwrap() = Err(error);
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &*self.response.lock().unwrap() {
            Ok(text) => Ok(text.clone()),
            Err(error) => Err(error("model call failed".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub search: Arc<FakeSearch>,
    pub scraper: Arc<FakeScraper>,
    pub model: Arc<FakeModel>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            search: Arc::new(FakeSearch::default()),
            scraper: Arc::new(FakeScraper::default()),
            model: Arc::new(FakeModel::default()),
        }
    }

    pub fn orchestrator(&self, config: PipelineConfig) -> Orchestrator {
        Orchestrator::new(
            self.search.clone(),
            self.scraper.clone(),
            self.model.clone(),
            self.store.clone(),
            config,
        )
    }
}

/// Config for sources on `x.com` with short items allowed and no retry delay.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        source_hosts: vec!["x.com".to_string()],
        min_item_chars: 1,
        prospect_retry_delay: Duration::ZERO,
        ..PipelineConfig::default()
    }
}

pub fn post(id: &str, body: &str) -> RawItem {
    RawItem {
        kind: "post".to_string(),
        id: Some(id.to_string()),
        author: Some(format!("author-{id}")),
        community: Some("acme".to_string()),
        body: Some(body.to_string()),
        score: 10,
        created_at: Some("2024-05-01T10:00:00Z".to_string()),
        ..RawItem::default()
    }
}

pub fn comment(id: &str, parent: &str, body: &str) -> RawItem {
    RawItem {
        kind: "comment".to_string(),
        id: Some(id.to_string()),
        parent_id: Some(parent.to_string()),
        author: Some(format!("author-{id}")),
        community: Some("acme".to_string()),
        body: Some(body.to_string()),
        score: 2,
        ..RawItem::default()
    }
}
