//! Parallel batch runner for independent demand-vector jobs.
//!
//! Each task computes a complete result from owned arguments; nothing is
//! shared mutably. The first failing task cancels every task that has not
//! started yet and fails the whole batch, and a wall-clock deadline fails
//! loudly instead of hanging.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// A fallible unit of work for [`run_batch`].
pub type Task<T> = Box<dyn FnOnce() -> anyhow::Result<T> + Send>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("task {index} failed: {source}")]
    Failed {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("batch timed out after {0:?} before all results arrived")]
    Timeout(Duration),

    #[error("worker pool disconnected before returning all results")]
    Disconnected,
}

/// How a batch is executed and collected.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Return results in submission order (costs a sort); otherwise in
    /// completion order.
    pub ordered: bool,
    /// Wall-clock budget per task; the batch deadline is this times the
    /// number of tasks.
    pub task_timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            ordered: false,
            task_timeout: Duration::from_secs(86_400), // one day
        }
    }
}

enum Outcome<T> {
    Done(T),
    Failed(anyhow::Error),
    Skipped,
}

/// Run every task on the rayon pool and collect their results.
pub fn run_batch<T: Send + 'static>(
    tasks: Vec<Task<T>>,
    options: &BatchOptions,
) -> Result<Vec<T>, JobError> {
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let task_count = tasks.len();
    let deadline = Instant::now() + options.task_timeout * task_count as u32;
    let cancelled = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<(usize, Outcome<T>)>();

    {
        let cancelled = cancelled.clone();
        // Detached supervisor thread: a deadline overrun must not block the
        // caller on tasks that never finish.
        std::thread::spawn(move || {
            rayon::scope(move |scope| {
                for (index, task) in tasks.into_iter().enumerate() {
                    let tx = tx.clone();
                    let cancelled = cancelled.clone();
                    scope.spawn(move |_| {
                        if cancelled.load(Ordering::Relaxed) {
                            let _ = tx.send((index, Outcome::Skipped));
                            return;
                        }
                        let outcome = match task() {
                            Ok(value) => Outcome::Done(value),
                            Err(e) => Outcome::Failed(e),
                        };
                        let _ = tx.send((index, outcome));
                    });
                }
            });
        });
    }

    let mut results: Vec<(usize, T)> = Vec::with_capacity(task_count);
    let mut received = 0;
    while received < task_count {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .ok_or_else(|| timeout_error(&cancelled, options, task_count))?;

        match rx.recv_timeout(remaining) {
            Ok((index, Outcome::Done(value))) => {
                results.push((index, value));
                received += 1;
            }
            Ok((index, Outcome::Failed(source))) => {
                // Stop anything not yet started and fail the whole batch.
                cancelled.store(true, Ordering::Relaxed);
                tracing::warn!(index, %source, "task failed, cancelling batch");
                return Err(JobError::Failed { index, source });
            }
            Ok((_, Outcome::Skipped)) => received += 1,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(timeout_error(&cancelled, options, task_count));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                cancelled.store(true, Ordering::Relaxed);
                return Err(JobError::Disconnected);
            }
        }
    }

    if options.ordered {
        results.sort_by_key(|&(index, _)| index);
    }

    Ok(results.into_iter().map(|(_, value)| value).collect())
}

fn timeout_error(cancelled: &AtomicBool, options: &BatchOptions, task_count: usize) -> JobError {
    cancelled.store(true, Ordering::Relaxed);
    JobError::Timeout(options.task_timeout * task_count as u32)
}
