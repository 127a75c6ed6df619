//! Turmoil-backed [`Environment`] for deterministic, accelerated-time tests.

use std::time::Duration;

use rover_core::Environment;

/// Virtual-clock environment for use inside a `turmoil::Builder` simulation.
///
/// Turmoil substitutes its own time driver for each simulated host, so
/// `tokio::time::Instant::now()` and `tokio::time::sleep` advance on the
/// simulation's virtual clock rather than the wall clock — this type simply
/// routes the `Environment` trait through those calls, the same way
/// `SystemEnv` routes it through the real ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimEnv;

impl SimEnv {
    /// Build a new simulation environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
