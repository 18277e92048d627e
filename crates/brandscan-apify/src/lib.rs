//! Apify actor client used for Google search discovery and Reddit scraping.

pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::{ApifyClient, GOOGLE_SEARCH_ACTOR, REDDIT_SCRAPER_ACTOR};
pub use error::ApifyError;
pub use types::{OrganicResult, RawRedditItem};
