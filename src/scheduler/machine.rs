//! The invocation state machine shared by both policy families.
//!
//! [`Machine`] is the runtime-free core of the crate: it owns the pending
//! slot, the last-execution instant, and the armed flag, and decides on
//! every entry what should happen. It never performs the side effects
//! itself; each entry point takes a caller-supplied `now` and returns an
//! [`Outcome`] naming the invocation to execute (if any) and the timer
//! command to apply. The caller runs the callable, so callable errors
//! surface at whichever call site triggered the execution.

use std::time::Duration;

use tokio::time::Instant;

use super::config::{Family, SchedulerConfig};
use super::error::ConfigError;

/// One held invocation request: the payload plus the calling context the
/// host wants propagated to the callable unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<T, C = ()> {
    /// The request payload.
    pub payload: T,
    /// Opaque calling context, never inspected by the scheduler.
    pub context: C,
}

/// Command for the collaborator timer, issued alongside each decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCmd {
    /// Arm (or re-arm) the one-shot timer for this delay from `now`.
    Arm(Duration),
    /// Cancel any armed timer.
    Disarm,
    /// Leave the timer as it is.
    Keep,
}

/// Decision returned by every machine entry point.
///
/// The caller must apply `timer` to its timer collaborator and, if `run`
/// is set, invoke the callable with the carried payload and context. The
/// machine has already cleared its own state for that invocation, so a
/// callable error cannot leave a stale, re-triggerable pending slot.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "the timer command and any decided execution must be carried out"]
pub struct Outcome<T, C = ()> {
    /// The invocation to execute now, if one was decided.
    pub run: Option<Invocation<T, C>>,
    /// What to do with the one-shot timer.
    pub timer: TimerCmd,
}

impl<T, C> Outcome<T, C> {
    const fn idle(timer: TimerCmd) -> Self {
        Self { run: None, timer }
    }

    const fn execute(invocation: Invocation<T, C>, timer: TimerCmd) -> Self {
        Self {
            run: Some(invocation),
            timer,
        }
    }
}

/// The policy-parameterized invocation state machine.
///
/// One machine instance tracks exactly one callable's invocation cadence.
/// State is owned exclusively by the machine value; there are no shared
/// mutables and no locking, because the caller's `&mut` access already
/// serializes the entry points.
///
/// Most hosts will not drive a machine directly: [`super::spawn`] wraps
/// one in a tokio task behind a [`super::SchedulerHandle`], and
/// [`super::Paced`] applies one to a stream. Driving it directly is for
/// hosts with their own event loop.
#[derive(Debug)]
pub struct Machine<T, C = ()> {
    config: SchedulerConfig,
    /// The most recent invocation request not yet executed.
    pending: Option<Invocation<T, C>>,
    /// Instant of the last execution; `None` until the first one.
    last_run_at: Option<Instant>,
    /// Whether the collaborator timer is currently armed.
    armed: bool,
}

impl<T, C> Machine<T, C> {
    /// Creates a machine for the given policy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the config is invalid; no machine is
    /// created.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            pending: None,
            last_run_at: None,
            armed: false,
        })
    }

    /// Returns the policy this machine was built with.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns whether a request is currently held for a later edge.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns whether the machine expects an armed collaborator timer.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Handles one invocation request.
    ///
    /// `now` is the current monotonic instant, supplied by the caller (or
    /// read from a [`crate::time::Clock`] collaborator) for testability.
    pub fn request(&mut self, payload: T, context: C, now: Instant) -> Outcome<T, C> {
        let invocation = Invocation { payload, context };
        match self.config.family() {
            Family::Settle => self.request_settle(invocation, now),
            Family::RateCapped => self.request_rate_capped(invocation, now),
        }
    }

    /// Settle-then-fire: the window restarts on every request, so the
    /// timer is always re-armed for a full interval. The timer doubles as
    /// the quiet-period detector: a leading fire is allowed only when no
    /// timer was armed immediately before this call.
    fn request_settle(&mut self, invocation: Invocation<T, C>, now: Instant) -> Outcome<T, C> {
        let was_armed = self.armed;
        self.armed = true;
        let rearm = TimerCmd::Arm(self.config.interval());

        if self.config.leading() && !was_armed {
            // This request is consumed by the leading fire; anything held
            // from an earlier window is discarded with it.
            self.pending = None;
            self.last_run_at = Some(now);
            tracing::trace!("Leading-edge execution opens a settle window");
            return Outcome::execute(invocation, rearm);
        }

        self.pending = Some(invocation);
        Outcome::idle(rearm)
    }

    /// Rate-capped: the window is fixed relative to the last execution.
    fn request_rate_capped(&mut self, invocation: Invocation<T, C>, now: Instant) -> Outcome<T, C> {
        let Some(remaining) = self.rate_window_remaining(now) else {
            // Window fully elapsed (or first request with leading enabled):
            // execute immediately on a clean slate.
            self.pending = None;
            self.armed = false;
            self.last_run_at = Some(now);
            return Outcome::execute(invocation, TimerCmd::Disarm);
        };

        if !self.config.trailing() {
            // Rate-capped without a trailing edge intentionally loses
            // in-window requests.
            tracing::trace!("Dropping in-window request (trailing edge disabled)");
            return Outcome::idle(TimerCmd::Keep);
        }

        self.pending = Some(invocation);
        if self.armed {
            // The window boundary is already scheduled; latest wins.
            return Outcome::idle(TimerCmd::Keep);
        }
        self.armed = true;
        Outcome::idle(TimerCmd::Arm(remaining))
    }

    /// Returns the time left in the current rate window, or `None` when an
    /// execution may happen right now.
    ///
    /// A first-ever request with `leading` disabled opens the window
    /// without executing: `last_run_at` is synthesized to `now` so the
    /// first real execution lands on the trailing edge.
    fn rate_window_remaining(&mut self, now: Instant) -> Option<Duration> {
        match self.last_run_at {
            None if self.config.leading() => None,
            None => {
                self.last_run_at = Some(now);
                Some(self.config.interval())
            }
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                let remaining = self.config.interval().saturating_sub(elapsed);
                (!remaining.is_zero()).then_some(remaining)
            }
        }
    }

    /// Handles the one-shot timer firing.
    ///
    /// `now` must be re-read by the caller at fire time; the machine never
    /// assumes the timer fired exactly on schedule.
    pub fn timer_fired(&mut self, now: Instant) -> Outcome<T, C> {
        self.armed = false;
        if !self.config.trailing() {
            // The window just closes; the slot (if any) stays until it is
            // superseded, flushed, or cancelled.
            return Outcome::idle(TimerCmd::Disarm);
        }
        let Some(invocation) = self.pending.take() else {
            // Nothing new arrived since the leading fire.
            return Outcome::idle(TimerCmd::Disarm);
        };
        self.last_run_at = Some(now);
        tracing::trace!("Trailing-edge execution at window expiry");
        Outcome::execute(invocation, TimerCmd::Disarm)
    }

    /// Discards pending work and disarms the timer without executing.
    ///
    /// `last_run_at` is deliberately untouched: for a rate-capped machine
    /// the current window keeps counting. Idempotent.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.armed = false;
    }

    /// Forces immediate execution of any pending invocation, ignoring the
    /// remaining window time, and disarms the timer.
    ///
    /// Returns the invocation for the caller to execute, or `None` when
    /// nothing was pending. State is cleared before the caller invokes the
    /// callable.
    pub fn flush(&mut self, now: Instant) -> Option<Invocation<T, C>> {
        let invocation = self.pending.take()?;
        self.armed = false;
        self.last_run_at = Some(now);
        Some(invocation)
    }
}
