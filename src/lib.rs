//! # Compile Lane
//!
//! A debounced, cancellable, single-flight job scheduler for driving an
//! expensive external compiler from a stream of rapid user edits.
//!
//! Every keystroke or parameter change becomes a request into one of two
//! pipeline slots. Each slot coalesces bursts behind a debounce timer, runs
//! at most one job at a time, kills the job it supersedes and delivers exactly
//! one outcome for the call that survived. Results land in an immutable state
//! tree whose unchanged subtrees keep their identity, so subscribers can skip
//! work with a pointer comparison.
//!
//! ## Pieces
//!
//! - **`AbortableTask`**: a pending computation with a synchronous cancel hook
//!   (e.g. killing a process) and exactly one terminal outcome.
//! - **`DelayedScheduler`**: the debounce and single-flight rule over a task
//!   factory.
//! - **`CompilerPipelines`**: a 300 ms syntax check producing diagnostics and
//!   a parameter manifest, and a 1000 ms render producing a priced mesh.
//! - **`StateStore`**: copy-on-write mutation with structural sharing.
//! - **`Orchestrator`**: turns user events into pipeline calls and pipeline
//!   results into state.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use compile_lane::builders::build_orchestrator;
//! use compile_lane::config::AppConfig;
//! use compile_lane::infra::{BinaryStlParser, InMemoryFs, InMemoryHandleRegistry, LoggingNotifier, ScadLogParser};
//! use compile_lane::orchestrator::OrchestratorDeps;
//! use compile_lane::pipeline::PipelineDeps;
//! use compile_lane::runtime::{dispatch, Event, TokioSpawner};
//!
//! let orchestrator = build_orchestrator(
//!     AppConfig::from_env()?,
//!     PipelineDeps {
//!         runner: my_runner,
//!         log_parser: Arc::new(ScadLogParser::new()),
//!         mesh_parser: Arc::new(BinaryStlParser::new()),
//!     },
//!     OrchestratorDeps {
//!         fs: Arc::new(InMemoryFs::new()),
//!         handles: Arc::new(InMemoryHandleRegistry::new()),
//!         notifier: Arc::new(LoggingNotifier),
//!         persister: None,
//!     },
//!     TokioSpawner::current()?,
//!     None,
//! )?;
//! orchestrator.init();
//! dispatch(&orchestrator, Event::SourceChanged { source: "cube(10);".into() });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, the delayed scheduler, boundary types.
pub mod core;
/// Configuration models for pipelines, pricing and startup defaults.
pub mod config;
/// Builders to construct pipelines and the orchestrator from configuration.
pub mod builders;
/// In-memory and file-backed adapters for the collaborator interfaces.
pub mod infra;
/// Syntax-check and render pipelines.
pub mod pipeline;
/// Immutable application state and its store.
pub mod state;
/// Event handling policy over pipelines and state.
pub mod orchestrator;
/// Runtime adapters and the event API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
