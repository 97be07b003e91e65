//! Core scheduling abstractions: abortable tasks, the delayed scheduler, and
//! the boundary types shared with external collaborators.

pub mod diagnostics;
pub mod error;
pub mod job;
pub mod ports;
pub mod scheduler;
pub mod task;

pub use diagnostics::{shift_line, Diagnostics, LineShift, Marker, Severity};
pub use error::{AppResult, PipelineError, SchedulerError};
pub use job::{JobHandle, JobRequest, JobResult, JobRunner, LogEntry, LogStream};
pub use ports::{
    Artifact, ArtifactHandle, CompletionNotifier, HandleError, HandleRegistry, LogParser,
    MeshParser, StatePersister, Triangle, VirtualFs,
};
pub use scheduler::{DelayedScheduler, InvokeOptions, ScheduledCall, SchedulerSlot, SettleCallback};
pub use task::{AbortableTask, CancelHandle, Settler, TaskOutcome, TaskStatus};
