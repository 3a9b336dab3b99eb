//! Error types for the scheduler layer.

use thiserror::Error;

use super::config::Family;

/// Error type for scheduler configuration.
///
/// Raised synchronously by every construction path ([`super::Machine::new`],
/// [`super::spawn`], [`super::Paced::new`]); no scheduler is created when
/// validation fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The interval was zero.
    ///
    /// A zero-length window would make every request fire immediately,
    /// which is a plain function call, not a scheduler.
    #[error("Scheduler interval must be non-zero")]
    ZeroInterval,

    /// Both the leading and trailing edges were disabled.
    ///
    /// Such a scheduler could never execute anything; requests would be
    /// held forever. Rejected to prevent starvation.
    #[error("Scheduler with family {family} has neither leading nor trailing edge enabled")]
    NoEdges {
        /// The family the invalid config was built for.
        family: Family,
    },
}

/// Error type for handle operations after the driver task has stopped.
///
/// The driver stops when the wrapped callable returns an error or when
/// every [`super::SchedulerHandle`] has been dropped. The callable error
/// itself surfaces through the driver's `JoinHandle`; this type only tells
/// the handle's caller that nobody is listening anymore.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Scheduler task has stopped")]
pub struct ClosedError;
