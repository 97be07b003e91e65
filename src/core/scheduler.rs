//! Debounced, single-flight, cancellable scheduling of abortable tasks.
//!
//! A [`DelayedScheduler`] owns exactly one [`SchedulerSlot`]. Every call to
//! [`DelayedScheduler::invoke`] supersedes the previous one:
//!
//! 1. a pending debounce timer is aborted, so its call never starts;
//! 2. a non-immediate call waits for the configured delay, an immediate one
//!    starts right away;
//! 3. when a call starts, the task still running in the slot is cancelled
//!    (its cancel hook runs synchronously) before the new task is created;
//! 4. a settled task delivers its outcome only if it is still the slot's
//!    running task. Superseded and cancelled tasks deliver nothing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::task::{AbortableTask, CancelHandle, TaskOutcome};
use super::PipelineError;
use crate::runtime::TokioSpawner;

/// Callback receiving the outcome of the call that survived.
pub type SettleCallback<T> = Box<dyn FnOnce(Result<T, PipelineError>) + Send>;

/// Options for a single [`DelayedScheduler::invoke`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Skip the debounce delay. Still supersedes pending and running work.
    pub immediate: bool,
}

impl InvokeOptions {
    /// Debounced call.
    #[must_use]
    pub const fn debounced() -> Self {
        Self { immediate: false }
    }

    /// Call that bypasses the debounce delay.
    #[must_use]
    pub const fn immediate() -> Self {
        Self { immediate: true }
    }
}

/// One logical request into a scheduler slot.
pub struct ScheduledCall<R, T> {
    /// Sequence number assigned at enqueue time; strictly increasing per slot.
    pub seq: u64,
    /// Request payload handed to the task factory.
    pub request: R,
    /// Whether the debounce delay was bypassed.
    pub immediate: bool,
    on_settle: SettleCallback<T>,
}

impl<R: fmt::Debug, T> fmt::Debug for ScheduledCall<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledCall")
            .field("seq", &self.seq)
            .field("request", &self.request)
            .field("immediate", &self.immediate)
            .finish_non_exhaustive()
    }
}

/// Mutable scheduling state of one pipeline.
///
/// At most one pending timer and at most one non-cancelled running task.
pub struct SchedulerSlot<T> {
    timer: Option<(u64, JoinHandle<()>)>,
    running: Option<(u64, CancelHandle<T>)>,
    latest_seq: u64,
}

impl<T> SchedulerSlot<T> {
    const fn new() -> Self {
        Self {
            timer: None,
            running: None,
            latest_seq: 0,
        }
    }

    /// Sequence number of the call waiting on the debounce timer.
    pub fn pending_seq(&self) -> Option<u64> {
        self.timer.as_ref().map(|(seq, _)| *seq)
    }

    /// Sequence number of the call owning the running task.
    pub fn running_seq(&self) -> Option<u64> {
        self.running.as_ref().map(|(seq, _)| *seq)
    }

    /// Sequence number of the most recent call.
    pub const fn latest_seq(&self) -> u64 {
        self.latest_seq
    }
}

type TaskFactory<R, T> = dyn Fn(R) -> (AbortableTask<T>, CancelHandle<T>) + Send + Sync;

struct Inner<R, T> {
    name: String,
    delay: Duration,
    factory: Box<TaskFactory<R, T>>,
    slot: Mutex<SchedulerSlot<T>>,
    spawner: TokioSpawner,
}

/// Debounced, single-flight entry point over a task factory.
///
/// Cloning is cheap and every clone drives the same slot.
pub struct DelayedScheduler<R, T> {
    inner: Arc<Inner<R, T>>,
}

impl<R, T> Clone for DelayedScheduler<R, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, T> fmt::Debug for DelayedScheduler<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.inner.slot.lock();
        f.debug_struct("DelayedScheduler")
            .field("name", &self.inner.name)
            .field("delay", &self.inner.delay)
            .field("pending_seq", &slot.pending_seq())
            .field("running_seq", &slot.running_seq())
            .finish()
    }
}

impl<R, T> DelayedScheduler<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    /// Wrap `factory` in a scheduler named `name` with the given debounce delay.
    ///
    /// `factory` is invoked under the slot lock and must not call back into
    /// this scheduler.
    pub fn new<F>(name: impl Into<String>, delay: Duration, spawner: TokioSpawner, factory: F) -> Self
    where
        F: Fn(R) -> (AbortableTask<T>, CancelHandle<T>) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                delay,
                factory: Box::new(factory),
                slot: Mutex::new(SchedulerSlot::new()),
                spawner,
            }),
        }
    }

    /// Slot name used in logs.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Configured debounce delay.
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Schedule `request`, superseding every earlier call in this slot.
    ///
    /// `on_settle` fires at most once, and only if this call is still the
    /// slot's current call when its task settles. Returns the sequence number
    /// assigned to the call.
    pub fn invoke<F>(&self, request: R, options: InvokeOptions, on_settle: F) -> u64
    where
        F: FnOnce(Result<T, PipelineError>) + Send + 'static,
    {
        let mut slot = self.inner.slot.lock();
        slot.latest_seq += 1;
        let seq = slot.latest_seq;

        if let Some((pending, timer)) = slot.timer.take() {
            timer.abort();
            debug!(slot = %self.inner.name, seq = pending, "pending call superseded before start");
        }

        let call = ScheduledCall {
            seq,
            request,
            immediate: options.immediate,
            on_settle: Box::new(on_settle),
        };
        trace!(slot = %self.inner.name, seq, immediate = call.immediate, "call enqueued");

        if call.immediate {
            drop(slot);
            Inner::start(&self.inner, call);
        } else {
            let inner = Arc::clone(&self.inner);
            let delay = self.inner.delay;
            // Spawning never polls the future inline, so holding the lock is safe.
            let timer = self.inner.spawner.spawn(async move {
                tokio::time::sleep(delay).await;
                Inner::start(&inner, call);
            });
            slot.timer = Some((seq, timer));
        }
        seq
    }

    /// Drop any pending call and cancel the running task. No callback fires.
    pub fn cancel(&self) {
        let running = {
            let mut slot = self.inner.slot.lock();
            slot.latest_seq += 1;
            if let Some((_, timer)) = slot.timer.take() {
                timer.abort();
            }
            slot.running.take()
        };
        if let Some((seq, handle)) = running {
            if handle.cancel() {
                debug!(slot = %self.inner.name, seq, "running task cancelled");
            }
        }
    }

    /// Whether a call is waiting on the debounce timer.
    pub fn has_pending(&self) -> bool {
        self.inner.slot.lock().timer.is_some()
    }

    /// Whether a task is currently running.
    pub fn is_running(&self) -> bool {
        self.inner.slot.lock().running.is_some()
    }

    /// Whether nothing is pending or running.
    pub fn is_idle(&self) -> bool {
        let slot = self.inner.slot.lock();
        slot.timer.is_none() && slot.running.is_none()
    }

    /// Sequence number of the most recent call.
    pub fn latest_seq(&self) -> u64 {
        self.inner.slot.lock().latest_seq()
    }
}

impl<R, T> Inner<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    fn start(inner: &Arc<Self>, call: ScheduledCall<R, T>) {
        let ScheduledCall {
            seq,
            request,
            on_settle,
            ..
        } = call;

        let task = {
            let mut slot = inner.slot.lock();
            if slot.latest_seq != seq {
                // A newer call arrived after the timer fired but before we got the lock.
                debug!(slot = %inner.name, seq, "call superseded before start");
                return;
            }
            slot.timer = None;

            if let Some((previous, handle)) = slot.running.take() {
                if handle.cancel() {
                    debug!(slot = %inner.name, seq = previous, superseded_by = seq, "running task cancelled");
                }
            }

            let (task, handle) = (inner.factory)(request);
            slot.running = Some((seq, handle));
            task
        };
        debug!(slot = %inner.name, seq, "task started");

        let watcher = Arc::clone(inner);
        inner.spawner.spawn(async move {
            let outcome = task.outcome().await;
            let current = {
                let mut slot = watcher.slot.lock();
                if slot.running_seq() == Some(seq) {
                    slot.running = None;
                    true
                } else {
                    false
                }
            };

            match outcome {
                TaskOutcome::Cancelled => {
                    trace!(slot = %watcher.name, seq, "cancelled task settled");
                }
                _ if !current => {
                    debug!(slot = %watcher.name, seq, "outcome of superseded task dropped");
                }
                TaskOutcome::Resolved(value) => {
                    debug!(slot = %watcher.name, seq, "task resolved");
                    on_settle(Ok(value));
                }
                TaskOutcome::Rejected(err) if err.is_silent() => {
                    debug!(slot = %watcher.name, seq, error = %err, "silent rejection dropped");
                }
                TaskOutcome::Rejected(err) => {
                    debug!(slot = %watcher.name, seq, error = %err, "task rejected");
                    on_settle(Err(err));
                }
            }
        });
    }
}
