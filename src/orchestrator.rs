//! Policy layer between user events, the compiler pipelines and the state store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::config::AppConfig;
use crate::core::{
    CompletionNotifier, HandleRegistry, InvokeOptions, PipelineError, StatePersister, VirtualFs,
};
use crate::pipeline::{
    CompilerPipelines, RenderOutput, RenderRequest, SyntaxCheckOutput, SyntaxCheckRequest,
    VarValue,
};
use crate::state::{AppState, CheckerRun, OutputState, StateStore};
use crate::util::{format_bytes, format_millis};

/// Collaborators the orchestrator hands results to.
#[derive(Clone)]
pub struct OrchestratorDeps {
    /// Virtual filesystem the tool reads sources from.
    pub fs: Arc<dyn VirtualFs>,
    /// Issues and revokes artifact handles.
    pub handles: Arc<dyn HandleRegistry>,
    /// Told about finished full renders.
    pub notifier: Arc<dyn CompletionNotifier>,
    /// Receives every committed state, if set.
    pub persister: Option<Arc<dyn StatePersister<AppState>>>,
}

struct Inner {
    store: Mutex<StateStore<AppState>>,
    pipelines: CompilerPipelines,
    config: AppConfig,
    fs: Arc<dyn VirtualFs>,
    handles: Arc<dyn HandleRegistry>,
    notifier: Arc<dyn CompletionNotifier>,
    /// Kind of the most recently requested render; `true` for a preview.
    latest_render_is_preview: AtomicBool,
}

/// Sequences "edit, write source, check syntax, preview" and applies every
/// pipeline result to the state store.
///
/// Entry points never fail: pipeline errors end up in [`AppState::error`]
/// or in the log. Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("pipelines", &self.inner.pipelines)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator starting from `initial`.
    pub fn new(
        config: AppConfig,
        pipelines: CompilerPipelines,
        deps: OrchestratorDeps,
        initial: AppState,
    ) -> Self {
        let mut store = StateStore::new(initial);
        if let Some(persister) = deps.persister {
            store = store.with_persister(persister);
        }
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(store),
                pipelines,
                config,
                fs: deps.fs,
                handles: deps.handles,
                notifier: deps.notifier,
                latest_render_is_preview: AtomicBool::new(false),
            }),
        }
    }

    /// Current state root.
    pub fn state(&self) -> Arc<AppState> {
        self.inner.store.lock().current()
    }

    /// Register a callback receiving every new root.
    ///
    /// Callbacks run while the store is locked and must not call back into
    /// the orchestrator.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&Arc<AppState>) + Send + Sync + 'static,
    {
        self.inner.store.lock().subscribe(callback);
    }

    /// Configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Pipelines driven by this orchestrator.
    pub fn pipelines(&self) -> &CompilerPipelines {
        &self.inner.pipelines
    }

    /// Apply `f` to the state. Returns whether anything changed.
    pub fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut AppState),
    {
        self.inner.mutate(f)
    }

    /// Process the source once at startup unless there is already something
    /// to show or in flight.
    pub fn init(&self) {
        let state = self.state();
        let untouched = state.output.is_none() && state.last_checker_run.is_none();
        if untouched && !state.is_busy() && !state.params.source.trim().is_empty() {
            self.process_source();
        }
    }

    /// Replace the source text. Processes it when it changed.
    pub fn set_source(&self, source: impl Into<String>) {
        let source = source.into();
        if self.mutate(|s| Arc::make_mut(&mut s.params).source = source) {
            self.process_source();
        }
    }

    /// Set one variable override and schedule a preview.
    pub fn set_var(&self, name: impl Into<String>, value: VarValue) {
        let name = name.into();
        self.mutate(|s| {
            Arc::make_mut(&mut s.params).vars.insert(name, value);
        });
        self.render(true, false);
    }

    /// Load `path` from the virtual filesystem into the editor.
    ///
    /// Switching to another path drops the diagnostics and the displayed
    /// output of the previous file.
    pub fn open_file(&self, path: &str) {
        let bytes = match self.inner.fs.read_file(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(path, "Error while opening file: {e}");
                return;
            }
        };
        let source = String::from_utf8_lossy(&bytes).into_owned();
        let handles = Arc::clone(&self.inner.handles);
        let changed = self.mutate(|s| {
            Arc::make_mut(&mut s.params).source = source;
            if s.params.source_path != path {
                Arc::make_mut(&mut s.params).source_path = path.to_owned();
                s.last_checker_run = None;
                if let Some(previous) = s.output.take() {
                    release_handle(handles.as_ref(), &previous);
                }
            }
        });
        if changed {
            self.process_source();
        }
    }

    fn process_source(&self) {
        let params = Arc::clone(&self.state().params);
        if let Err(e) = self
            .inner
            .fs
            .write_file(&params.source_path, params.source.as_bytes())
        {
            error!(path = %params.source_path, "Error while writing source: {e}");
        }
        self.check_syntax();
        self.render(true, false);
    }

    /// Schedule a debounced syntax check of the current source.
    pub fn check_syntax(&self) {
        self.mutate(|s| s.checking_syntax = true);
        let params = Arc::clone(&self.state().params);
        let request = SyntaxCheckRequest {
            source: params.source.clone(),
            source_path: params.source_path.clone(),
        };
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .pipelines
            .check_syntax(request, InvokeOptions::debounced(), move |result| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_syntax_settled(result);
                }
            });
    }

    /// Schedule a render of the current parameters.
    ///
    /// `immediate` bypasses the debounce delay. A new render of either kind
    /// supersedes the previous one, so the other kind's busy flag is cleared.
    pub fn render(&self, is_preview: bool, immediate: bool) {
        self.mutate(|s| {
            s.set_render_flag(is_preview, true);
            s.set_render_flag(!is_preview, false);
        });
        self.inner
            .latest_render_is_preview
            .store(is_preview, Ordering::SeqCst);
        let params = Arc::clone(&self.state().params);
        let request = RenderRequest {
            source: params.source.clone(),
            source_path: params.source_path.clone(),
            vars: params.vars.clone(),
            features: params.features.clone(),
            extra_args: Vec::new(),
            is_preview,
        };
        let options = if immediate {
            InvokeOptions::immediate()
        } else {
            InvokeOptions::debounced()
        };
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.pipelines.render(request, options, move |result| {
            if let Some(inner) = weak.upgrade() {
                inner.on_render_settled(is_preview, result);
            }
        });
    }

    /// Drop pending work, kill running jobs and clear the busy flags.
    pub fn cancel_all(&self) {
        self.inner.pipelines.cancel_all();
        self.mutate(|s| {
            s.checking_syntax = false;
            s.previewing = false;
            s.rendering = false;
        });
    }
}

fn release_handle(handles: &dyn HandleRegistry, output: &OutputState) {
    if let Err(e) = handles.release(&output.handle) {
        warn!(handle = %output.handle, "failed to release artifact handle: {e}");
    }
}

impl Inner {
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut AppState),
    {
        self.store.lock().mutate(f)
    }

    fn on_syntax_settled(&self, result: Result<SyntaxCheckOutput, PipelineError>) {
        // A newer check waiting on its timer keeps the flag up.
        let still_checking = self.pipelines.syntax_slot().has_pending();
        self.mutate(|s| {
            s.checking_syntax = still_checking;
            match result {
                Ok(output) => {
                    s.last_checker_run = Some(Arc::new(CheckerRun::from(output.diagnostics)));
                    s.parameter_set = output.parameter_set.map(Arc::new);
                }
                Err(e) => error!("Error while checking syntax: {e}"),
            }
        });
    }

    fn on_render_settled(&self, is_preview: bool, result: Result<RenderOutput, PipelineError>) {
        // Only a pending call of the same kind keeps this kind's flag up;
        // requesting the other kind already raised its own flag.
        let same_kind_pending = self.pipelines.render_slot().has_pending()
            && self.latest_render_is_preview.load(Ordering::SeqCst) == is_preview;
        let completed = result.is_ok() && !is_preview;
        let handles = Arc::clone(&self.handles);

        self.mutate(|s| {
            s.set_render_flag(is_preview, same_kind_pending);
            match result {
                Ok(output) => {
                    s.error = None;
                    s.last_checker_run = Some(Arc::new(CheckerRun::from(output.diagnostics)));
                    if let Some(previous) = s.output.take() {
                        release_handle(handles.as_ref(), &previous);
                    }
                    let handle = handles.issue(&output.artifact);
                    debug!(%handle, size = output.artifact.len(), "installing render output");
                    s.output = Some(Arc::new(OutputState {
                        is_preview,
                        formatted_elapsed_millis: format_millis(output.elapsed_millis),
                        formatted_file_size: format_bytes(
                            u64::try_from(output.artifact.len()).unwrap_or(u64::MAX),
                        ),
                        elapsed_millis: output.elapsed_millis,
                        total_price: output.quote.total_price,
                        currency: output.currency,
                        handle,
                        artifact: output.artifact,
                    }));
                }
                Err(e) => {
                    let stage = if is_preview { "preview" } else { "rendering" };
                    error!("Error while doing {stage}: {e}");
                    if let Some(diagnostics) = e.diagnostics() {
                        s.last_checker_run = Some(Arc::new(CheckerRun::from(diagnostics.clone())));
                    }
                    s.error = Some(e.to_string());
                }
            }
        });

        if completed {
            self.notifier.render_completed();
        }
    }
}
