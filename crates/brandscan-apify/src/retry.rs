//! Retry policy for Apify actor calls.
//!
//! Actor runs fail transiently when the platform throttles the account or a
//! run host restarts. Those cases are retried with exponential backoff; bad
//! tokens, 4xx input errors and unparseable datasets are returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::ApifyError;

/// Upper bound on a server-requested `Retry-After` wait.
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Returns `true` for 429s, 5xx responses, and network-level failures.
fn is_retriable(err: &ApifyError) -> bool {
    match err {
        ApifyError::RateLimited { .. } | ApifyError::Http(_) => true,
        ApifyError::Api { status, .. } => *status >= 500,
        ApifyError::Unauthorized { .. } | ApifyError::Deserialize { .. } => false,
    }
}

/// Executes `operation`, retrying transient failures up to `max_retries` times.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds. A rate-limit response that names a longer `Retry-After` wins,
/// capped at [`MAX_RETRY_AFTER_SECS`].
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ApifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApifyError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let mut delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        if let ApifyError::RateLimited {
            retry_after_secs, ..
        } = &err
        {
            delay_secs = delay_secs.max((*retry_after_secs).min(MAX_RETRY_AFTER_SECS));
        }

        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient Apify error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
