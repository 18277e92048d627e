//! Minimal OpenAI chat-completions client.
//!
//! Exposes a single text-in/text-out call, [`OpenAiClient::complete`], and
//! an error type that separates retryable failures from fatal ones.

pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::OpenAiClient;
pub use error::LlmError;
