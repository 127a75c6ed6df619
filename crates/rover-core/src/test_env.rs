//! Test-only `Environment` backed by `tokio`'s mockable clock.
//!
//! Used by this crate's own `#[cfg(test)]` modules; `rover-harness::SimEnv`
//! provides the corresponding `turmoil`-backed environment for the
//! multi-node integration tests in other crates.

#![cfg(test)]

use std::time::Duration;

use crate::env::Environment;

/// `Environment` whose clock advances only when the test explicitly calls
/// `tokio::time::advance` (requires `#[tokio::test(start_paused = true)]`).
#[derive(Clone, Default)]
pub struct ManualEnv;

impl ManualEnv {
    /// Build a manual-clock environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for ManualEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
