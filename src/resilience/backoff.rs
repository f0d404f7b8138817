//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::BackoffConfig;

/// Calculate exponential backoff delay with jitter.
///
/// `attempt` is zero-indexed: the first retry waits roughly `base_ms`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter_ms: u64) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter = if jitter_ms > 0 {
        rand::thread_rng().gen_range(0..jitter_ms)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Backoff for the given zero-indexed retry attempt using configured constants.
pub fn compute_backoff(attempt: u32, config: &BackoffConfig) -> Duration {
    calculate_backoff(
        attempt,
        config.base_delay_ms,
        config.max_delay_ms,
        config.jitter_ms,
    )
}
