//! Cancellable asynchronous unit of work.
//!
//! An [`AbortableTask`] has exactly one terminal outcome: resolved, rejected
//! or cancelled. The executor that drives it receives a [`Settler`] and
//! returns a cancel hook; the hook runs at most once, and never after the task
//! has settled on its own.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::PipelineError;

/// Lifecycle status of an [`AbortableTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Resolved,
    /// Settled with an error.
    Rejected,
    /// Discarded by its owner before settling.
    Cancelled,
}

impl TaskStatus {
    /// Whether no further transitions can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Terminal outcome of an [`AbortableTask`].
#[derive(Debug)]
pub enum TaskOutcome<T> {
    /// The operation produced a value.
    Resolved(T),
    /// The operation failed.
    Rejected(PipelineError),
    /// The operation was intentionally discarded. Not a user-visible failure.
    Cancelled,
}

impl<T> TaskOutcome<T> {
    /// Status corresponding to this outcome.
    pub const fn status(&self) -> TaskStatus {
        match self {
            Self::Resolved(_) => TaskStatus::Resolved,
            Self::Rejected(_) => TaskStatus::Rejected,
            Self::Cancelled => TaskStatus::Cancelled,
        }
    }

    /// Collapse into a `Result`, mapping cancellation to [`PipelineError::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns the rejection error, or `Cancelled`.
    pub fn into_result(self) -> Result<T, PipelineError> {
        match self {
            Self::Resolved(value) => Ok(value),
            Self::Rejected(err) => Err(err),
            Self::Cancelled => Err(PipelineError::Cancelled),
        }
    }
}

type CancelHook = Box<dyn FnOnce() + Send>;

struct Shared<T> {
    status: TaskStatus,
    sender: Option<oneshot::Sender<TaskOutcome<T>>>,
    hook: Option<CancelHook>,
}

impl<T> Shared<T> {
    /// Move to a terminal state. Returns false if already terminal.
    fn settle(&mut self, outcome: TaskOutcome<T>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = outcome.status();
        if let Some(tx) = self.sender.take() {
            // Receiver may already be gone; the status is still recorded.
            let _ = tx.send(outcome);
        }
        true
    }
}

/// Resolver/rejecter handed to a task's executor.
///
/// Settling consumes the settler. Dropping it while the task is still
/// pending rejects the task with [`PipelineError::Abandoned`].
pub struct Settler<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Settler<T> {
    /// Resolve the task. Ignored if it already settled or was cancelled.
    pub fn resolve(self, value: T) {
        self.shared.lock().settle(TaskOutcome::Resolved(value));
    }

    /// Reject the task. Ignored if it already settled or was cancelled.
    pub fn reject(self, err: PipelineError) {
        self.shared.lock().settle(TaskOutcome::Rejected(err));
    }

    /// Settle from a `Result`.
    pub fn settle(self, result: Result<T, PipelineError>) {
        match result {
            Ok(value) => self.resolve(value),
            Err(err) => self.reject(err),
        }
    }

    /// Whether the task was cancelled while the executor was still working.
    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().status == TaskStatus::Cancelled
    }
}

impl<T> Drop for Settler<T> {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        // The hook belongs to the running work; once abandoned it must not run.
        if shared.settle(TaskOutcome::Rejected(PipelineError::Abandoned)) {
            shared.hook = None;
        }
    }
}

/// Owner-side handle that cancels an [`AbortableTask`].
pub struct CancelHandle<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> CancelHandle<T> {
    /// Cancel the task and run the executor's cancel hook synchronously.
    ///
    /// Returns false (and does nothing) if the task is already terminal.
    pub fn cancel(&self) -> bool {
        let hook = {
            let mut shared = self.shared.lock();
            if !shared.settle(TaskOutcome::Cancelled) {
                return false;
            }
            shared.hook.take()
        };
        if let Some(hook) = hook {
            hook();
        }
        true
    }

    /// Current status.
    pub fn status(&self) -> TaskStatus {
        self.shared.lock().status
    }
}

/// A cancellable asynchronous unit of work.
pub struct AbortableTask<T> {
    shared: Arc<Mutex<Shared<T>>>,
    receiver: oneshot::Receiver<TaskOutcome<T>>,
}

impl<T> AbortableTask<T> {
    /// Create a task driven by `executor`.
    ///
    /// `executor` receives the [`Settler`] and returns the hook that stops its
    /// work. If the executor settles before returning, the hook is dropped
    /// without ever being called.
    pub fn new<F, C>(executor: F) -> (Self, CancelHandle<T>)
    where
        F: FnOnce(Settler<T>) -> C,
        C: FnOnce() + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let shared = Arc::new(Mutex::new(Shared {
            status: TaskStatus::Pending,
            sender: Some(sender),
            hook: None,
        }));

        let hook = executor(Settler {
            shared: Arc::clone(&shared),
        });

        {
            let mut guard = shared.lock();
            if guard.status == TaskStatus::Pending {
                guard.hook = Some(Box::new(hook));
            }
        }

        let cancel = CancelHandle {
            shared: Arc::clone(&shared),
        };
        (Self { shared, receiver }, cancel)
    }

    /// Current status.
    pub fn status(&self) -> TaskStatus {
        self.shared.lock().status
    }

    /// Suspend until the task reaches a terminal state.
    pub async fn outcome(self) -> TaskOutcome<T> {
        self.receiver
            .await
            .unwrap_or(TaskOutcome::Rejected(PipelineError::Abandoned))
    }
}
