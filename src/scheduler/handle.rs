//! Control surface for a spawned scheduler.

use tokio::sync::{mpsc, oneshot};

use super::error::ClosedError;

/// Commands accepted by the driver task.
#[derive(Debug)]
pub(crate) enum Command<T, C> {
    /// An invocation request with its payload and calling context.
    Request { payload: T, context: C },
    /// Discard pending work and disarm the timer without executing.
    Cancel,
    /// Execute any pending invocation immediately; replies whether an
    /// execution occurred.
    Flush { reply: oneshot::Sender<bool> },
}

/// Handle to a scheduler spawned with [`super::spawn`].
///
/// Cloneable; all clones feed the same driver task, and commands from one
/// clone are processed in the order they were sent. Dropping every clone
/// shuts the driver down, discarding pending work like [`cancel`] would.
///
/// [`cancel`]: Self::cancel
#[derive(Debug)]
pub struct SchedulerHandle<T, C = ()> {
    tx: mpsc::UnboundedSender<Command<T, C>>,
}

impl<T, C> SchedulerHandle<T, C> {
    pub(crate) const fn new(tx: mpsc::UnboundedSender<Command<T, C>>) -> Self {
        Self { tx }
    }

    /// Submits one invocation request.
    ///
    /// The context value is propagated to the callable unchanged; the
    /// scheduler never inspects it.
    ///
    /// # Errors
    ///
    /// Returns [`ClosedError`] when the driver task has stopped.
    pub fn request(&self, payload: T, context: C) -> Result<(), ClosedError> {
        self.tx
            .send(Command::Request { payload, context })
            .map_err(|_| ClosedError)
    }

    /// Discards any pending invocation and disarms the timer; nothing
    /// executes. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ClosedError`] when the driver task has stopped.
    pub fn cancel(&self) -> Result<(), ClosedError> {
        self.tx.send(Command::Cancel).map_err(|_| ClosedError)
    }

    /// Forces immediate execution of any pending invocation.
    ///
    /// Resolves to `true` when an execution occurred and completed, and
    /// `false` when nothing was pending.
    ///
    /// # Errors
    ///
    /// Returns [`ClosedError`] when the driver task has stopped, including
    /// when the flushed execution itself failed (the callable's error
    /// surfaces through the driver's `JoinHandle`, not here).
    pub async fn flush(&self) -> Result<bool, ClosedError> {
        let (reply, executed) = oneshot::channel();
        self.tx
            .send(Command::Flush { reply })
            .map_err(|_| ClosedError)?;
        executed.await.map_err(|_| ClosedError)
    }
}

// Manual impl: the derive would require `T: Clone` and `C: Clone`, which
// the sender does not need.
impl<T, C> Clone for SchedulerHandle<T, C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}
