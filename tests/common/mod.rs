//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use compile_lane::builders::build_orchestrator;
use compile_lane::config::AppConfig;
use compile_lane::core::{
    CompletionNotifier, JobHandle, JobRequest, JobResult, JobRunner, LogEntry, PipelineError,
    Triangle,
};
use compile_lane::infra::{
    encode_binary_stl, BinaryStlParser, InMemoryFs, InMemoryHandleRegistry,
    InMemoryStatePersister, ScadLogParser,
};
use compile_lane::orchestrator::{Orchestrator, OrchestratorDeps};
use compile_lane::pipeline::PipelineDeps;
use compile_lane::runtime::TokioSpawner;
use compile_lane::state::AppState;

/// Scripted outcome of one fake tool run.
pub struct FakeJob {
    pub delay: Duration,
    pub result: Result<JobResult, PipelineError>,
}

type Responder = dyn Fn(&JobRequest) -> FakeJob + Send + Sync;

/// [`JobRunner`] that answers from a closure after a simulated delay.
pub struct FakeRunner {
    responder: Box<Responder>,
    requests: Mutex<Vec<JobRequest>>,
    kills: Arc<AtomicUsize>,
}

impl FakeRunner {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&JobRequest) -> FakeJob + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            kills: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn requests(&self) -> Vec<JobRequest> {
        self.requests.lock().clone()
    }

    pub fn started(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests of one pipeline, told apart by export format.
    pub fn requests_of(&self, format: &str) -> Vec<JobRequest> {
        let flag = format!("--export-format={format}");
        self.requests
            .lock()
            .iter()
            .filter(|r| r.arguments.contains(&flag))
            .cloned()
            .collect()
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

impl JobRunner for FakeRunner {
    fn run_job(&self, request: JobRequest) -> Arc<dyn JobHandle> {
        let job = (self.responder)(&request);
        self.requests.lock().push(request);
        let (kill_tx, kill_rx) = oneshot::channel();
        Arc::new(FakeHandle {
            delay: job.delay,
            result: Mutex::new(Some(job.result)),
            kill_tx: Mutex::new(Some(kill_tx)),
            kill_rx: Mutex::new(Some(kill_rx)),
            kills: Arc::clone(&self.kills),
        })
    }
}

struct FakeHandle {
    delay: Duration,
    result: Mutex<Option<Result<JobResult, PipelineError>>>,
    kill_tx: Mutex<Option<oneshot::Sender<()>>>,
    kill_rx: Mutex<Option<oneshot::Receiver<()>>>,
    kills: Arc<AtomicUsize>,
}

#[async_trait]
impl JobHandle for FakeHandle {
    async fn wait(&self) -> Result<JobResult, PipelineError> {
        let killed = self.kill_rx.lock().take();
        let Some(killed) = killed else {
            return Err(PipelineError::ToolInvocation("waited twice".into()));
        };
        tokio::select! {
            () = tokio::time::sleep(self.delay) => self
                .result
                .lock()
                .take()
                .unwrap_or_else(|| Err(PipelineError::ToolInvocation("no result".into()))),
            _ = killed => Err(PipelineError::ToolInvocation("killed".into())),
        }
    }

    fn kill(&self) {
        if let Some(tx) = self.kill_tx.lock().take() {
            self.kills.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        }
    }
}

/// Counts completion notifications.
#[derive(Default)]
pub struct CountingNotifier {
    pub count: AtomicUsize,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl CompletionNotifier for CountingNotifier {
    fn render_completed(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Right tetrahedron with legs of `size`, outward-facing.
pub fn tetrahedron(size: f64) -> Vec<Triangle> {
    let o = [0.0, 0.0, 0.0];
    let x = [size, 0.0, 0.0];
    let y = [0.0, size, 0.0];
    let z = [0.0, 0.0, size];
    vec![[o, y, x], [o, x, z], [o, z, y], [x, y, z]]
}

pub const MANIFEST: &str = r#"{
    "title": "demo",
    "parameters": [
        {"name": "size", "type": "number", "caption": "Edge length", "group": "Shape", "initial": 10, "min": 1, "max": 50}
    ]
}"#;

/// Successful syntax check with a warning on line 3 of the shifted source.
pub fn syntax_ok() -> JobResult {
    JobResult {
        merged_log: vec![LogEntry::stderr(
            "WARNING: Ignoring unknown variable 'w' in file /playground.scad, line 3",
        )],
        outputs: vec![("out.json".into(), MANIFEST.as_bytes().to_vec())],
        elapsed_millis: 12,
        tool_reported_error: None,
    }
}

/// Successful render of a 10mm tetrahedron.
pub fn render_ok() -> JobResult {
    JobResult {
        merged_log: vec![LogEntry::stdout("Rendering Polygon Mesh using Manifold...")],
        outputs: vec![("/out.stl".into(), encode_binary_stl(&tetrahedron(10.0)))],
        elapsed_millis: 1_540,
        tool_reported_error: None,
    }
}

/// Render where the tool reported a parser error on line 2 of the user source.
pub fn render_failed() -> JobResult {
    JobResult {
        merged_log: vec![LogEntry::stderr(
            r#"ERROR: Parser error in file "/playground.scad", line 2: syntax error"#,
        )],
        outputs: Vec::new(),
        elapsed_millis: 20,
        tool_reported_error: Some("Parser error".into()),
    }
}

/// Responder answering both pipelines after `work`. Renders fail with a tool
/// error while `fail_renders` is set; syntax checks fail to start while
/// `fail_syntax` is set.
pub fn scripted(
    work: Duration,
    fail_renders: Arc<AtomicBool>,
    fail_syntax: Arc<AtomicBool>,
) -> impl Fn(&JobRequest) -> FakeJob + Send + Sync + 'static {
    move |request| {
        let is_syntax = request
            .arguments
            .iter()
            .any(|a| a == "--export-format=param");
        let result = if is_syntax && fail_syntax.load(Ordering::SeqCst) {
            Err(PipelineError::ToolInvocation("compiler crashed".into()))
        } else if is_syntax {
            Ok(syntax_ok())
        } else if fail_renders.load(Ordering::SeqCst) {
            Ok(render_failed())
        } else {
            Ok(render_ok())
        };
        FakeJob {
            delay: work,
            result,
        }
    }
}

pub fn pipeline_deps(runner: &Arc<FakeRunner>) -> PipelineDeps {
    PipelineDeps {
        runner: runner.clone(),
        log_parser: Arc::new(ScadLogParser::new()),
        mesh_parser: Arc::new(BinaryStlParser::new()),
    }
}

/// Orchestrator wired to in-memory collaborators the test can inspect.
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub runner: Arc<FakeRunner>,
    pub fs: Arc<InMemoryFs>,
    pub handles: Arc<InMemoryHandleRegistry>,
    pub notifier: Arc<CountingNotifier>,
    pub persister: Arc<InMemoryStatePersister<AppState>>,
    pub fail_renders: Arc<AtomicBool>,
    pub fail_syntax: Arc<AtomicBool>,
}

impl Harness {
    /// Must be called inside a tokio runtime.
    pub fn new(work: Duration) -> Self {
        let fail_renders = Arc::new(AtomicBool::new(false));
        let fail_syntax = Arc::new(AtomicBool::new(false));
        let runner = FakeRunner::new(scripted(
            work,
            Arc::clone(&fail_renders),
            Arc::clone(&fail_syntax),
        ));
        let fs = Arc::new(InMemoryFs::new());
        let handles = Arc::new(InMemoryHandleRegistry::new());
        let notifier = Arc::new(CountingNotifier::default());
        let persister = Arc::new(InMemoryStatePersister::<AppState>::new(64));

        let orchestrator = build_orchestrator(
            AppConfig::default(),
            pipeline_deps(&runner),
            OrchestratorDeps {
                fs: fs.clone(),
                handles: handles.clone(),
                notifier: notifier.clone(),
                persister: Some(persister.clone()),
            },
            TokioSpawner::current().unwrap(),
            None,
        )
        .unwrap();

        Self {
            orchestrator,
            runner,
            fs,
            handles,
            notifier,
            persister,
            fail_renders,
            fail_syntax,
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.orchestrator.state()
    }
}

/// Let timers fire and spawned work finish under a paused clock.
pub async fn settle_for(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
