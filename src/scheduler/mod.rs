//! Time-windowed invocation scheduling.
//!
//! This module provides types and functions for:
//! - Policy configuration ([`SchedulerConfig`], [`Family`])
//! - The policy-parameterized state machine ([`Machine`], [`Outcome`])
//! - Spawning a driver task ([`spawn`], [`SchedulerHandle`])
//! - Pacing a stream ([`Paced`])
//! - Error handling ([`ConfigError`], [`ClosedError`])

mod config;
mod driver;
mod error;
mod handle;
mod machine;
mod stream;
mod timer;

#[cfg(test)]
mod stream_tests;
#[cfg(test)]
mod test_fixtures;

pub use config::{Family, SchedulerConfig};
pub use driver::{spawn, spawn_with_clock};
pub use error::{ClosedError, ConfigError};
pub use handle::SchedulerHandle;
pub use machine::{Invocation, Machine, Outcome, TimerCmd};
pub use stream::Paced;
