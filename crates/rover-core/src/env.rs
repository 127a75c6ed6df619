//! Environment abstraction for deterministic testing.
//!
//! Decouples the engine and net layers from the real system clock. Enables
//! deterministic simulation (`rover-harness`'s `SimEnv`, built on `turmoil`'s
//! virtual clock) and production use with real system time.

use std::time::Duration;

/// Abstract environment providing monotonic time and the one async sleep
/// primitive the rest of this workspace needs.
///
/// # Safety
///
/// Implementations MUST guarantee `now()` never goes backwards within a
/// single execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment (`std::time::Instant` in
    /// production, a virtual instant in simulation).
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration. The only async method in the
    /// trait; used by every periodic/timeout/retry path so tests can
    /// substitute a virtual clock.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
