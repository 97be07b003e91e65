//! Event and status models for hosts driving an [`Orchestrator`].

use serde::{Deserialize, Serialize};

use crate::orchestrator::Orchestrator;
use crate::pipeline::VarValue;
use crate::state::AppState;

/// A discrete user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The editor content changed.
    SourceChanged {
        /// New source text.
        source: String,
    },
    /// A customizer variable changed.
    VariableChanged {
        /// Variable name.
        name: String,
        /// New value.
        value: VarValue,
    },
    /// The user asked for a render, e.g. through a key binding.
    ExplicitRenderRequested {
        /// Preview instead of full render.
        is_preview: bool,
        /// Skip the debounce delay.
        #[serde(default)]
        immediate: bool,
    },
    /// A file was picked in the file browser.
    OpenFile {
        /// Virtual path.
        path: String,
    },
}

/// Route `event` to the matching orchestrator entry point.
pub fn dispatch(orchestrator: &Orchestrator, event: Event) {
    match event {
        Event::SourceChanged { source } => orchestrator.set_source(source),
        Event::VariableChanged { name, value } => orchestrator.set_var(name, value),
        Event::ExplicitRenderRequested {
            is_preview,
            immediate,
        } => orchestrator.render(is_preview, immediate),
        Event::OpenFile { path } => orchestrator.open_file(&path),
    }
}

/// Serializable snapshot of the busy flags and the displayed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Path being edited.
    pub source_path: String,
    /// Syntax check scheduled or running.
    pub checking_syntax: bool,
    /// Preview scheduled or running.
    pub previewing: bool,
    /// Full render scheduled or running.
    pub rendering: bool,
    /// Last render failure.
    pub error: Option<String>,
    /// Number of error markers from the last run.
    pub error_markers: usize,
    /// Whether the displayed output is a preview.
    pub is_preview: Option<bool>,
    /// Price of the displayed output, with currency.
    pub price: Option<String>,
    /// Duration of the run that produced the displayed output.
    pub elapsed: Option<String>,
    /// Size of the displayed output.
    pub size: Option<String>,
}

impl From<&AppState> for StatusResponse {
    fn from(state: &AppState) -> Self {
        let output = state.output.as_deref();
        Self {
            source_path: state.params.source_path.clone(),
            checking_syntax: state.checking_syntax,
            previewing: state.previewing,
            rendering: state.rendering,
            error: state.error.clone(),
            error_markers: state.last_checker_run.as_ref().map_or(0, |run| {
                run.markers
                    .iter()
                    .filter(|m| m.severity == crate::core::Severity::Error)
                    .count()
            }),
            is_preview: output.map(|o| o.is_preview),
            price: output.map(|o| format!("{}{}", o.currency, o.total_price)),
            elapsed: output.map(|o| o.formatted_elapsed_millis.clone()),
            size: output.map(|o| o.formatted_file_size.clone()),
        }
    }
}

impl StatusResponse {
    /// Snapshot of `orchestrator`'s current state.
    #[must_use]
    pub fn of(orchestrator: &Orchestrator) -> Self {
        Self::from(orchestrator.state().as_ref())
    }
}
