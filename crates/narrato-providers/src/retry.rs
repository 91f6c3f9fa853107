//! Retry with exponential backoff for transient provider failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

/// Run `operation` up to `max_retries + 1` times while it fails with a
/// retryable error. Backoff starts at `base_delay` and doubles.
pub async fn with_retry<F, Fut, T>(
    service: &str,
    max_retries: u32,
    base_delay: Duration,
    operation: F,
) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = base_delay * 2u32.pow(attempt);
                warn!(
                    "{} request failed (attempt {}), retrying in {:?}: {}",
                    service,
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
