//! Time abstraction for testability.
//!
//! This module provides a [`Clock`] trait that allows injecting mock clocks
//! in tests while using the tokio runtime clock in production.

use tokio::time::Instant;

/// Abstraction over monotonic time for testability.
///
/// Implementations provide the current instant, allowing tests to inject
/// controlled time values instead of relying on the real clock. Scheduling
/// decisions are made against monotonic instants so they never move with
/// wall-clock adjustments.
///
/// # Example
///
/// ```
/// use pacer::time::{Clock, TokioClock};
///
/// let clock = TokioClock;
/// let earlier = clock.now();
/// assert!(clock.now() >= earlier);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Production clock using the tokio runtime clock.
///
/// This is the default clock implementation that delegates to
/// [`Instant::now()`]. Under `#[tokio::test(start_paused = true)]` it
/// observes the paused test clock, which is what makes driver tests
/// deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
