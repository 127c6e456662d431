// src/triage/retry.rs
//! Bounded retry with capped exponential backoff. Only errors classified
//! transient by `TriageError::is_transient` are retried; exhaustion returns
//! the last transient error.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::triage::types::TriageError;

pub const MAX_ATTEMPTS: u32 = 6;
const BACKOFF_CAP_SECS: u64 = 60;

fn backoff_delay(attempt: u32) -> Duration {
    let secs = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(secs.min(BACKOFF_CAP_SECS))
}

/// Run `op` up to `max_attempts` times, sleeping `min(60, 2^attempt)` seconds
/// after each transient failure. The attempt index (0-based) is passed to the
/// operation.
pub async fn retry_transient<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, TriageError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, TriageError>>,
{
    let mut attempt = 0u32;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                let delay = backoff_delay(attempt);
                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    delay_s = delay.as_secs(),
                    "triage call failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
