//! Scheduler policy configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Policy family governing what the interval means.
///
/// Both families share one state machine; the family only decides whether
/// the window follows the newest request or the latest execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    /// Settle-then-fire (debounce): the window restarts on every request,
    /// so an execution happens only once requests stop arriving for one
    /// full interval.
    Settle,
    /// Rate-capped (throttle): the window is fixed relative to the last
    /// execution, so executions happen at most once per interval no matter
    /// how often requests arrive.
    RateCapped,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settle => write!(f, "settle"),
            Self::RateCapped => write!(f, "rate-capped"),
        }
    }
}

/// Immutable scheduler policy, chosen at construction.
///
/// A config describes the time window, which edges of the window fire, and
/// which [`Family`] governs the window's meaning. Hosts typically embed it
/// in their own serde configuration:
///
/// ```
/// use pacer::scheduler::{Family, SchedulerConfig};
///
/// let config: SchedulerConfig = serde_json::from_str(
///     r#"{ "family": "settle", "interval_ms": 300, "leading": false, "trailing": true }"#,
/// )
/// .unwrap();
/// assert_eq!(config.family(), Family::Settle);
/// ```
///
/// Validation happens when a scheduler is constructed from the config, not
/// when the config itself is built; see [`SchedulerConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    family: Family,
    /// The time window, in milliseconds on the wire.
    #[serde(with = "interval_ms", rename = "interval_ms")]
    interval: Duration,
    /// Whether the first request opening a window fires immediately.
    leading: bool,
    /// Whether the window's expiry fires the latest pending request.
    trailing: bool,
}

impl SchedulerConfig {
    /// Creates a settle-then-fire config with the conventional edges:
    /// no leading fire, trailing fire at window end.
    #[must_use]
    pub const fn settle(interval: Duration) -> Self {
        Self {
            family: Family::Settle,
            interval,
            leading: false,
            trailing: true,
        }
    }

    /// Creates a rate-capped config with the conventional edges: leading
    /// fire on a fresh window, trailing fire carrying the latest request.
    #[must_use]
    pub const fn rate_capped(interval: Duration) -> Self {
        Self {
            family: Family::RateCapped,
            interval,
            leading: true,
            trailing: true,
        }
    }

    /// Sets whether the leading edge fires.
    #[must_use]
    pub const fn with_leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Sets whether the trailing edge fires.
    #[must_use]
    pub const fn with_trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    /// Returns the policy family.
    #[must_use]
    pub const fn family(&self) -> Family {
        self.family
    }

    /// Returns the time window.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns whether the leading edge fires.
    #[must_use]
    pub const fn leading(&self) -> bool {
        self.leading
    }

    /// Returns whether the trailing edge fires.
    #[must_use]
    pub const fn trailing(&self) -> bool {
        self.trailing
    }

    /// Checks the config invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInterval`] for a zero window and
    /// [`ConfigError::NoEdges`] when both edges are disabled (such a
    /// scheduler would hold requests forever without executing them).
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if !self.leading && !self.trailing {
            return Err(ConfigError::NoEdges {
                family: self.family,
            });
        }
        Ok(())
    }
}

impl fmt::Display for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scheduler: interval {}ms, leading={}, trailing={}",
            self.family,
            self.interval.as_millis(),
            self.leading,
            self.trailing
        )
    }
}

/// Serde adapter storing the interval as whole milliseconds.
mod interval_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(interval: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
