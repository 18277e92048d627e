//! Brand sentiment pipeline.
//!
//! Finds community discussion about a brand, scrapes it, filters the noise
//! and asks a language model for insight. [`Orchestrator`] runs that flow per
//! prospect with resumable, per-URL progress kept in the persistence gateway.

pub mod adapters;
pub mod analysis;
pub mod clean;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod scrape;
pub mod types;

pub use error::{
    AnalysisError, DiscoveryError, PersistenceError, PipelineError, ProviderError, ScrapeError,
};
pub use orchestrator::Orchestrator;
pub use providers::{
    LanguageModel, PersistenceGateway, RawItem, ScrapeProvider, SearchHit, SearchProvider,
};
pub use types::{PipelineConfig, ProspectOutcome, ProspectReport, ProspectStats, RunReport, Scope};
