//! Bounded retry with a transient-error whitelist (spec §5, §7;
//! transient-signature strings supplemented from the retry-strategy tests
//! in the original implementation, SPEC_FULL.md §11).

use crate::error::TransportError;
use std::time::Duration;

const BASE_ATTEMPTS: u32 = 3;
const EXTENDED_ATTEMPTS: u32 = 5;
const BASE_BACKOFF_MS: u64 = 200;

/// Substrings that mark an error as transient even when it didn't already
/// arrive classified as `TransportError::Transient`/`Timeout`.
const TRANSIENT_SIGNATURES: &[&str] = &[
    "connection reset",
    "ssl_error",
    "tls eof",
    "timed out",
    "gateway timeout",
    "429",
    "500",
    "502",
    "503",
    "504",
];

pub fn looks_transient(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    TRANSIENT_SIGNATURES.iter().any(|sig| lower.contains(sig))
}

fn backoff_for(attempt: u32) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS * 2u64.saturating_pow(attempt))
}

/// Run `f` up to the retry budget, sleeping with exponential backoff
/// between attempts. The budget expands from `BASE_ATTEMPTS` to
/// `EXTENDED_ATTEMPTS` the first time a transient signature is observed, per
/// §5/§7 ("transient failures get a wider budget than permanent ones").
pub async fn with_retry<T, F, Fut>(host: &str, mut f: F) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, TransportError>>,
{
    let mut attempt = 0;
    let mut budget = BASE_ATTEMPTS;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let transient_signature = looks_transient(&err.to_string());
                let retryable = err.is_retryable() || transient_signature;
                if transient_signature && budget < EXTENDED_ATTEMPTS {
                    budget = EXTENDED_ATTEMPTS;
                }
                attempt += 1;
                if !retryable || attempt >= budget {
                    return Err(err);
                }
                tracing::debug!(host, attempt, "retrying after transport error");
                tokio::time::sleep(backoff_for(attempt)).await;
            }
        }
    }
}
