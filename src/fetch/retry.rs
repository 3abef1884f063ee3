//! Bounded retry with exponential backoff for remote downloads.

use std::thread;
use std::time::Duration;

use tracing::debug;

use super::FetchConfig;
use crate::error::{Error, Result};

/// Delay before retry number `attempt` (0-based):
/// `min_delay * factor^attempt`, capped at `max_delay`.
pub fn backoff_delay(config: &FetchConfig, attempt: u32) -> Duration {
    let scale = config.factor.max(1).saturating_pow(attempt);
    config
        .min_delay
        .saturating_mul(scale)
        .min(config.max_delay)
}

/// Whether a failed attempt is worth repeating.
///
/// Transport errors, server errors and rate limiting are retried; any other
/// HTTP status (404, 403, ...) will not change on a second try.
pub fn is_retryable(err: &Error) -> bool {
    match err {
        Error::Http(_) => true,
        Error::HttpStatus { status, .. } => {
            status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
        }
        _ => false,
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or has been
/// retried `config.retries` times.
pub fn with_retry<T, F>(config: &FetchConfig, url: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.retries && is_retryable(&err) => {
                let delay = backoff_delay(config, attempt);
                attempt += 1;
                debug!(
                    url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying download"
                );
                thread::sleep(delay);
            }
            Err(err) => return Err(err),
        }
    }
}
