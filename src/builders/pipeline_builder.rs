//! Builders to construct the pipelines and orchestrator from configuration.

use crate::config::AppConfig;
use crate::core::SchedulerError;
use crate::orchestrator::{Orchestrator, OrchestratorDeps};
use crate::pipeline::{CompilerPipelines, PipelineDeps};
use crate::runtime::TokioSpawner;
use crate::state::{AppState, SavedState};

/// Validate `cfg` and build both compiler pipelines.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] when validation fails.
pub fn build_pipelines(
    cfg: &AppConfig,
    deps: PipelineDeps,
    spawner: TokioSpawner,
) -> Result<CompilerPipelines, SchedulerError> {
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;
    Ok(CompilerPipelines::new(cfg, deps, spawner))
}

/// Build an orchestrator over fresh pipelines, starting from `saved` (or the
/// default project) written into the virtual filesystem.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] when validation fails.
pub fn build_orchestrator(
    cfg: AppConfig,
    pipeline_deps: PipelineDeps,
    deps: OrchestratorDeps,
    spawner: TokioSpawner,
    saved: Option<SavedState>,
) -> Result<Orchestrator, SchedulerError> {
    let pipelines = build_pipelines(&cfg, pipeline_deps, spawner)?;
    let initial = AppState::initial(&cfg, deps.fs.as_ref(), saved);
    Ok(Orchestrator::new(cfg, pipelines, deps, initial))
}
