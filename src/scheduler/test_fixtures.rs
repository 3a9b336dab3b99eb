//! Shared test fixtures for scheduler tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// Error returned by failing test callables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallableFailed;

/// Records every execution together with the instant it happened at.
///
/// The recorder stays on the test side while its callables move into the
/// driver task, mirroring how hosts observe a scheduler from outside.
pub struct Recorder<T> {
    runs: Arc<Mutex<Vec<(T, Instant)>>>,
}

impl<T: Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            runs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callable that records and succeeds.
    pub fn callable(&self) -> impl FnMut(T, ()) -> Result<(), CallableFailed> + Send + 'static {
        let runs = Arc::clone(&self.runs);
        move |payload, ()| {
            runs.lock().unwrap().push((payload, Instant::now()));
            Ok(())
        }
    }

    /// A callable that records, then fails the execution.
    pub fn failing_callable(
        &self,
    ) -> impl FnMut(T, ()) -> Result<(), CallableFailed> + Send + 'static {
        let runs = Arc::clone(&self.runs);
        move |payload, ()| {
            runs.lock().unwrap().push((payload, Instant::now()));
            Err(CallableFailed)
        }
    }

    pub fn runs(&self) -> Vec<(T, Instant)>
    where
        T: Clone,
    {
        self.runs.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.runs
            .lock()
            .unwrap()
            .iter()
            .map(|(payload, _)| payload.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Millisecond shorthand for test timelines.
pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}
