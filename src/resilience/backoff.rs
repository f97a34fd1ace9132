//! Capped exponential backoff with optional jitter.

use std::time::Duration;
use rand::Rng;

/// Calculate the delay to wait after the attempt at `attempt_index` failed.
///
/// `attempt_index` is zero-based: the wait after the first failure is
/// `base_ms`, after the second `2 * base_ms`, and so on, capped at `max_ms`.
/// `jitter_ratio` adds up to that fraction of the capped delay on top.
pub fn calculate_backoff(attempt_index: u32, base_ms: u64, max_ms: u64, jitter_ratio: f64) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt_index);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = if jitter_ratio > 0.0 {
        (capped_delay as f64 * jitter_ratio.min(1.0)) as u64
    } else {
        0
    };
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
