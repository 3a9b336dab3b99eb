//! Stream combinator applying a scheduling policy to an upstream stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::time::Instant;
use tokio_stream::Stream;

use super::config::SchedulerConfig;
use super::error::ConfigError;
use super::machine::{Machine, TimerCmd};
use super::timer::OneshotTimer;

/// A stream that paces its upstream's items through a scheduling policy.
///
/// Each upstream item is treated as one invocation request (with an empty
/// calling context); items the policy executes are yielded downstream,
/// items it supersedes are dropped. Latest-wins: for a settle policy the
/// yielded item is always the last one before a quiet period, for a
/// rate-capped policy at most one item per interval comes through.
///
/// When the upstream terminates, a still-pending item is yielded
/// immediately (no more requests can arrive, so waiting out the window
/// would change nothing but the delivery time) and the stream ends.
pub struct Paced<S: Stream> {
    stream: S,
    machine: Machine<S::Item>,
    timer: OneshotTimer,
    /// Set once the upstream has returned `None`.
    upstream_done: bool,
}

impl<S> Paced<S>
where
    S: Stream + Unpin,
{
    /// Wraps `stream` in the given scheduling policy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the config is invalid.
    pub fn new(stream: S, config: SchedulerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            stream,
            machine: Machine::new(config)?,
            timer: OneshotTimer::new(),
            upstream_done: false,
        })
    }

    /// Returns the inner stream, dropping any pending item.
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn apply_timer(&mut self, cmd: TimerCmd, now: Instant) {
        match cmd {
            TimerCmd::Arm(delay) => self.timer.arm(now + delay),
            TimerCmd::Disarm => self.timer.disarm(),
            TimerCmd::Keep => {}
        }
    }

    /// Drains upstream items into the machine until one is executed, the
    /// upstream is exhausted, or the upstream is pending.
    fn poll_upstream(&mut self, cx: &mut Context<'_>) -> Option<S::Item> {
        while !self.upstream_done {
            match Pin::new(&mut self.stream).poll_next(cx) {
                Poll::Ready(Some(item)) => {
                    let now = Instant::now();
                    let outcome = self.machine.request(item, (), now);
                    self.apply_timer(outcome.timer, now);
                    if let Some(invocation) = outcome.run {
                        return Some(invocation.payload);
                    }
                }
                Poll::Ready(None) => self.upstream_done = true,
                Poll::Pending => break,
            }
        }
        None
    }
}

impl<S> Stream for Paced<S>
where
    S: Stream + Unpin,
    S::Item: Unpin,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.as_mut().get_mut();
        loop {
            if let Some(item) = this.poll_upstream(cx) {
                return Poll::Ready(Some(item));
            }

            if this.upstream_done {
                // Drain the pending slot, then finish.
                if let Some(invocation) = this.machine.flush(Instant::now()) {
                    this.timer.disarm();
                    tracing::debug!("Upstream ended, yielding pending item");
                    return Poll::Ready(Some(invocation.payload));
                }
                return Poll::Ready(None);
            }

            match this.timer.poll_fired(cx) {
                Poll::Ready(()) => {
                    let now = Instant::now();
                    let outcome = this.machine.timer_fired(now);
                    this.apply_timer(outcome.timer, now);
                    if let Some(invocation) = outcome.run {
                        return Poll::Ready(Some(invocation.payload));
                    }
                    // Window closed with nothing to carry; poll the
                    // upstream again before parking.
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
