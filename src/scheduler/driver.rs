//! Driver task wiring a [`Machine`] to the tokio runtime.
//!
//! [`spawn`] is the construction API for hosts that want the scheduler to
//! own its timing: it starts one task per scheduler instance that
//! serializes invocation requests, control commands, and timer fires, and
//! invokes the wrapped callable from inside that task.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::time::{Clock, TokioClock};

use super::config::SchedulerConfig;
use super::error::ConfigError;
use super::handle::{Command, SchedulerHandle};
use super::machine::{Machine, Outcome, TimerCmd};
use super::timer::OneshotTimer;

/// Spawns a scheduler around `callable` with the default tokio clock.
///
/// Returns the control handle and the driver task's `JoinHandle`. The
/// driver runs until every handle clone is dropped (pending work is then
/// discarded without executing) or until the callable returns an error;
/// that error is neither caught nor retried, it ends the task and becomes
/// the task's result.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the config is invalid; nothing is
/// spawned.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use std::time::Duration;
///
/// use pacer::scheduler::{self, SchedulerConfig};
///
/// # let rt = tokio::runtime::Builder::new_current_thread()
/// #     .enable_time()
/// #     .start_paused(true)
/// #     .build()
/// #     .unwrap();
/// # rt.block_on(async {
/// let config = SchedulerConfig::settle(Duration::from_millis(300));
/// let (handle, driver) = scheduler::spawn(
///     |query: String, ()| {
///         println!("searching for {query}");
///         Ok::<_, Infallible>(())
///     },
///     config,
/// )
/// .unwrap();
///
/// handle.request("rust".to_string(), ()).unwrap();
/// handle.request("rust scheduler".to_string(), ()).unwrap();
/// tokio::time::sleep(Duration::from_millis(400)).await;
/// // Only "rust scheduler" was searched.
/// drop(handle);
/// driver.await.unwrap().unwrap();
/// # });
/// ```
pub fn spawn<T, C, E, F>(
    callable: F,
    config: SchedulerConfig,
) -> Result<(SchedulerHandle<T, C>, JoinHandle<Result<(), E>>), ConfigError>
where
    T: Send + 'static,
    C: Send + 'static,
    E: Send + 'static,
    F: FnMut(T, C) -> Result<(), E> + Send + 'static,
{
    spawn_with_clock(callable, config, TokioClock)
}

/// Spawns a scheduler with a custom [`Clock`].
///
/// This constructor exists for clock injection; most callers want
/// [`spawn`].
///
/// # Errors
///
/// Returns a [`ConfigError`] when the config is invalid; nothing is
/// spawned.
pub fn spawn_with_clock<T, C, E, F, K>(
    callable: F,
    config: SchedulerConfig,
    clock: K,
) -> Result<(SchedulerHandle<T, C>, JoinHandle<Result<(), E>>), ConfigError>
where
    T: Send + 'static,
    C: Send + 'static,
    E: Send + 'static,
    F: FnMut(T, C) -> Result<(), E> + Send + 'static,
    K: Clock + 'static,
{
    let machine = Machine::new(config)?;
    tracing::debug!("Starting {config}");

    let (tx, rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(drive(machine, callable, clock, rx));
    Ok((SchedulerHandle::new(tx), driver))
}

/// The driver event loop.
///
/// All state transitions happen here, either while handling a command or
/// while handling a timer fire, so the two entry points never observe each
/// other mid-transition.
async fn drive<T, C, E, F, K>(
    mut machine: Machine<T, C>,
    mut callable: F,
    clock: K,
    mut rx: mpsc::UnboundedReceiver<Command<T, C>>,
) -> Result<(), E>
where
    F: FnMut(T, C) -> Result<(), E>,
    K: Clock,
{
    let mut timer = OneshotTimer::new();

    loop {
        tokio::select! {
            // Check the timer first: a window that expired by the time a
            // request arrives is handled as expired, not as still open.
            biased;

            () = timer.fired(), if timer.is_armed() => {
                // Re-read the clock: the runtime may fire late.
                let now = clock.now();
                let outcome = machine.timer_fired(now);
                carry_out(&mut callable, &mut timer, now, outcome)?;
            }
            command = rx.recv() => {
                let Some(command) = command else {
                    // Every handle is gone; discard pending work.
                    tracing::debug!("All scheduler handles dropped, stopping driver");
                    break;
                };
                handle_command(&mut machine, &mut callable, &clock, &mut timer, command)?;
            }
        }
    }
    Ok(())
}

fn handle_command<T, C, E, F, K>(
    machine: &mut Machine<T, C>,
    callable: &mut F,
    clock: &K,
    timer: &mut OneshotTimer,
    command: Command<T, C>,
) -> Result<(), E>
where
    F: FnMut(T, C) -> Result<(), E>,
    K: Clock,
{
    match command {
        Command::Request { payload, context } => {
            let now = clock.now();
            let outcome = machine.request(payload, context, now);
            carry_out(callable, timer, now, outcome)?;
        }
        Command::Cancel => {
            machine.cancel();
            timer.disarm();
        }
        Command::Flush { reply } => {
            let executed = if let Some(invocation) = machine.flush(clock.now()) {
                timer.disarm();
                tracing::debug!("Flushing pending invocation");
                callable(invocation.payload, invocation.context)?;
                true
            } else {
                false
            };
            // The flusher may have gone away; that loses nothing.
            let _ = reply.send(executed);
        }
    }
    Ok(())
}

/// Applies a machine decision: timer command first, then the execution.
fn carry_out<T, C, E, F>(
    callable: &mut F,
    timer: &mut OneshotTimer,
    now: Instant,
    outcome: Outcome<T, C>,
) -> Result<(), E>
where
    F: FnMut(T, C) -> Result<(), E>,
{
    match outcome.timer {
        TimerCmd::Arm(delay) => timer.arm(now + delay),
        TimerCmd::Disarm => timer.disarm(),
        TimerCmd::Keep => {}
    }
    if let Some(invocation) = outcome.run {
        callable(invocation.payload, invocation.context)?;
    }
    Ok(())
}
