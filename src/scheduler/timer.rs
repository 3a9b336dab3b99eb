//! One-shot timer adapter over the tokio clock.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::time::{Instant, Sleep, sleep_until};

/// A re-armable one-shot timer.
///
/// This is the scheduler's whole contract with the host timer facility:
/// schedule one callback after a delay, or cancel it. Arming while armed
/// resets the existing sleep, so a scheduler instance can never hold two
/// live timers. Disarming is synchronous: once [`disarm`](Self::disarm)
/// returns, [`fired`](Self::fired) will not complete until the timer is
/// armed again.
///
/// Callers must not trust the fire time to equal the requested deadline;
/// re-read the clock when the timer fires.
#[derive(Debug)]
pub(crate) struct OneshotTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl OneshotTimer {
    pub(crate) const fn new() -> Self {
        Self { sleep: None }
    }

    /// Arms the timer for `deadline`, replacing any armed deadline.
    pub(crate) fn arm(&mut self, deadline: Instant) {
        match self.sleep.as_mut() {
            // Reuse the existing allocation.
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(sleep_until(deadline))),
        }
    }

    /// Cancels any armed timer. No-op when none is armed.
    pub(crate) fn disarm(&mut self) {
        self.sleep = None;
    }

    pub(crate) const fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Completes when the armed deadline is reached.
    ///
    /// Only meaningful while armed; inside `select!` this is guarded with
    /// an `is_armed` precondition. The timer stays nominally armed after
    /// firing until the caller applies the machine's timer command, which
    /// always disarms or re-arms after a fire.
    pub(crate) async fn fired(&mut self) {
        if let Some(sleep) = self.sleep.as_mut() {
            sleep.await;
        }
    }

    /// Poll-based variant of [`fired`](Self::fired) for manual `Stream`
    /// implementations. Returns `Pending` while disarmed.
    pub(crate) fn poll_fired(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        self.sleep
            .as_mut()
            .map_or(Poll::Pending, |sleep| sleep.as_mut().poll(cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn fires_at_the_armed_deadline() {
        let mut timer = OneshotTimer::new();
        let start = Instant::now();
        timer.arm(start + Duration::from_millis(100));

        timer.fired().await;

        assert_eq!(Instant::now() - start, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_deadline() {
        let mut timer = OneshotTimer::new();
        let start = Instant::now();
        timer.arm(start + Duration::from_millis(100));
        timer.arm(start + Duration::from_millis(250));

        timer.fired().await;

        assert_eq!(Instant::now() - start, Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_clears_the_armed_state() {
        let mut timer = OneshotTimer::new();
        timer.arm(Instant::now() + Duration::from_millis(100));
        assert!(timer.is_armed());

        timer.disarm();
        assert!(!timer.is_armed());

        // Idempotent
        timer.disarm();
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_fired_is_pending_while_disarmed() {
        let mut timer = OneshotTimer::new();
        let pending = std::future::poll_fn(|cx| Poll::Ready(timer.poll_fired(cx).is_pending()));

        assert!(pending.await);
    }

    #[tokio::test(start_paused = true)]
    async fn starts_disarmed() {
        let timer = OneshotTimer::new();
        assert!(!timer.is_armed());
    }
}
