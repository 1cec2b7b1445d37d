//! Exponential backoff with uniform jitter.
//!
//! # Invariants
//! - `delay_for_attempt(n)` is strictly greater than `2^n * base_unit` for
//!   every `n` whose product does not saturate `u64` milliseconds.
//! - Computing a delay never sleeps.

use crate::config::{DEFAULT_BACKOFF_BASE_MS, FAST_BACKOFF_BASE_MS};
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_ms: u64,
}

impl BackoffPolicy {
    /// Sub-millisecond units round down; the unit is at least 1 ms.
    pub fn new(base_unit: Duration) -> Self {
        let base_ms = u64::try_from(base_unit.as_millis()).unwrap_or(u64::MAX);
        Self {
            base_ms: base_ms.max(1),
        }
    }

    /// One-second unit used against production servers.
    pub fn production() -> Self {
        Self::new(Duration::from_millis(DEFAULT_BACKOFF_BASE_MS))
    }

    pub fn fast() -> Self {
        Self::new(Duration::from_millis(FAST_BACKOFF_BASE_MS))
    }

    pub fn base_unit(&self) -> Duration {
        Duration::from_millis(self.base_ms)
    }

    /// `2^attempt * base_unit + jitter`, jitter uniform in `[1, base_unit]` ms.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.delay_with_rng(attempt, &mut rand::rng())
    }

    pub fn delay_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let exponential = 2u64.saturating_pow(attempt).saturating_mul(self.base_ms);
        let jitter = rng.random_range(1..=self.base_ms);
        Duration::from_millis(exponential.saturating_add(jitter))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::production()
    }
}
