//! Off-thread work for long editor operations, collected by polling.

use std::sync::mpsc;
use std::time::Instant;

use thiserror::Error;

use crate::error::{AppError, AppResult};
use crate::state::Operation;

/// The worker thread went away without reporting, usually after a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("background task stopped")]
pub struct TaskLost {
    pub operation: Operation,
}

#[derive(Debug)]
pub struct WorkerTask<T> {
    operation: Operation,
    started: Instant,
    receiver: mpsc::Receiver<T>,
}

impl<T: Send + 'static> WorkerTask<T> {
    /// Runs `work` on a named std thread. Fails only when the thread cannot be spawned.
    pub fn spawn<W>(operation: Operation, work: W) -> std::io::Result<Self>
    where
        W: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<T>();
        std::thread::Builder::new()
            .name(format!("memegen-{operation:?}").to_ascii_lowercase())
            .spawn(move || {
                let _ = sender.send(work());
            })?;
        Ok(Self {
            operation,
            started: Instant::now(),
            receiver,
        })
    }
}

impl<T> WorkerTask<T> {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// `None` while the worker is still running.
    pub fn try_finish(&self) -> Option<Result<T, TaskLost>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                tracing::debug!(operation = ?self.operation, elapsed = ?self.started.elapsed(), "worker finished");
                Some(Ok(result))
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                tracing::warn!(operation = ?self.operation, "worker thread exited without a result");
                Some(Err(TaskLost {
                    operation: self.operation,
                }))
            }
        }
    }
}

/// Folds a lost worker into the operation's own result so its finish path
/// still runs.
pub fn task_outcome<T>(outcome: Result<AppResult<T>, TaskLost>) -> AppResult<T> {
    outcome.unwrap_or_else(|lost| Err(AppError::from(lost)))
}
