//! The two compiler pipelines built on [`DelayedScheduler`]: a fast syntax
//! check and a slower full render.

pub mod pricing;
pub mod render;
pub mod syntax;
pub mod vars;

use std::sync::Arc;

use crate::config::{AppConfig, PipelineConfig, PricingConfig};
use crate::core::{
    AbortableTask, CancelHandle, DelayedScheduler, InvokeOptions, JobHandle, JobResult, JobRunner,
    LogParser, MeshParser, PipelineError,
};
use crate::runtime::TokioSpawner;

pub use pricing::{BoundingBox, MeshMeasure, PriceQuote};
pub use render::{finish_render, render_job_request, RenderOutput, RenderRequest};
pub use syntax::{finish_syntax_check, syntax_job_request, SyntaxCheckOutput, SyntaxCheckRequest};
pub use vars::{format_value, ParameterSet, VarBindings, VarValue};

/// Slot name of the syntax-check pipeline.
pub const SYNTAX_CHECK: &str = "syntax_check";
/// Slot name of the render pipeline.
pub const RENDER: &str = "render";

/// External collaborators the pipelines call into.
#[derive(Clone)]
pub struct PipelineDeps {
    /// Starts tool jobs.
    pub runner: Arc<dyn JobRunner>,
    /// Turns tool logs into diagnostics.
    pub log_parser: Arc<dyn LogParser>,
    /// Parses render artifacts.
    pub mesh_parser: Arc<dyn MeshParser>,
}

/// Wrap a running job in an [`AbortableTask`] that post-processes its result.
///
/// Cancelling the task kills the job.
pub fn job_task<T, F>(
    spawner: &TokioSpawner,
    job: Arc<dyn JobHandle>,
    finish: F,
) -> (AbortableTask<T>, CancelHandle<T>)
where
    T: Send + 'static,
    F: FnOnce(JobResult) -> Result<T, PipelineError> + Send + 'static,
{
    AbortableTask::new(|settler| {
        let waiting = Arc::clone(&job);
        spawner.spawn(async move {
            let result = waiting.wait().await;
            if settler.is_cancelled() {
                return;
            }
            settler.settle(result.and_then(finish));
        });
        move || job.kill()
    })
}

/// Syntax-check and render pipelines, one scheduler slot each.
#[derive(Clone, Debug)]
pub struct CompilerPipelines {
    syntax: DelayedScheduler<SyntaxCheckRequest, SyntaxCheckOutput>,
    render: DelayedScheduler<RenderRequest, RenderOutput>,
}

impl CompilerPipelines {
    /// Build both pipelines. Prefer [`crate::builders::build_pipelines`],
    /// which validates `cfg` first.
    pub fn new(cfg: &AppConfig, deps: PipelineDeps, spawner: TokioSpawner) -> Self {
        let syntax = Self::syntax_scheduler(cfg.pipelines.clone(), deps.clone(), spawner.clone());
        let render = Self::render_scheduler(
            cfg.pipelines.clone(),
            cfg.pricing.clone(),
            deps,
            spawner,
        );
        Self { syntax, render }
    }

    fn syntax_scheduler(
        cfg: PipelineConfig,
        deps: PipelineDeps,
        spawner: TokioSpawner,
    ) -> DelayedScheduler<SyntaxCheckRequest, SyntaxCheckOutput> {
        let delay = cfg.syntax_delay();
        let task_spawner = spawner.clone();
        DelayedScheduler::new(SYNTAX_CHECK, delay, spawner, move |req: SyntaxCheckRequest| {
            let job = deps.runner.run_job(syntax_job_request(&cfg, &req));
            let log_parser = Arc::clone(&deps.log_parser);
            job_task(&task_spawner, job, move |result| {
                finish_syntax_check(log_parser.as_ref(), &req, &result)
            })
        })
    }

    fn render_scheduler(
        cfg: PipelineConfig,
        pricing: PricingConfig,
        deps: PipelineDeps,
        spawner: TokioSpawner,
    ) -> DelayedScheduler<RenderRequest, RenderOutput> {
        let delay = cfg.render_delay();
        let task_spawner = spawner.clone();
        DelayedScheduler::new(RENDER, delay, spawner, move |req: RenderRequest| {
            let (request, shift) = render_job_request(&cfg, &req);
            let job = deps.runner.run_job(request);
            let log_parser = Arc::clone(&deps.log_parser);
            let mesh_parser = Arc::clone(&deps.mesh_parser);
            let pricing = pricing.clone();
            let expected = cfg.render_output_path.clone();
            job_task(&task_spawner, job, move |result| {
                finish_render(
                    log_parser.as_ref(),
                    mesh_parser.as_ref(),
                    &pricing,
                    &expected,
                    &shift,
                    result,
                )
            })
        })
    }

    /// Schedule a syntax check.
    pub fn check_syntax<F>(&self, req: SyntaxCheckRequest, options: InvokeOptions, on_settle: F) -> u64
    where
        F: FnOnce(Result<SyntaxCheckOutput, PipelineError>) + Send + 'static,
    {
        self.syntax.invoke(req, options, on_settle)
    }

    /// Schedule a render.
    pub fn render<F>(&self, req: RenderRequest, options: InvokeOptions, on_settle: F) -> u64
    where
        F: FnOnce(Result<RenderOutput, PipelineError>) + Send + 'static,
    {
        self.render.invoke(req, options, on_settle)
    }

    /// Syntax-check scheduler.
    #[must_use]
    pub const fn syntax_slot(&self) -> &DelayedScheduler<SyntaxCheckRequest, SyntaxCheckOutput> {
        &self.syntax
    }

    /// Render scheduler.
    #[must_use]
    pub const fn render_slot(&self) -> &DelayedScheduler<RenderRequest, RenderOutput> {
        &self.render
    }

    /// Drop pending calls and kill running jobs in both slots.
    pub fn cancel_all(&self) {
        self.syntax.cancel();
        self.render.cancel();
    }
}
