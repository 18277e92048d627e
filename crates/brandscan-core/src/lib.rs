//! Shared domain types and configuration for brandscan.

pub mod app_config;
pub mod config;
pub mod domain;
pub mod prospects;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{
    AnalysisResult, CleanedItem, DiscoveredUrl, ItemKind, Prospect, ProspectStatus, ScrapedItem,
    SentimentBreakdown,
};
pub use prospects::{load_prospects, ProspectConfig, ProspectsFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read prospects file {path}: {source}")]
    ProspectsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse prospects file: {0}")]
    ProspectsFileParse(#[from] serde_yaml::Error),

    #[error("prospects file validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown prospect status: {0}")]
    UnknownStatus(String),

    #[error("unknown item kind: {0}")]
    UnknownItemKind(String),
}
