//! Application state tree.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::store::{reconcile_child, reconcile_leaf, reconcile_option, same_option, Reconcile};
use crate::config::AppConfig;
use crate::core::{Artifact, ArtifactHandle, Diagnostics, Marker, VirtualFs};
use crate::pipeline::{ParameterSet, VarBindings};

/// Source written to the default path on first start.
pub const DEFAULT_SOURCE: &str = "\
// Edit me: the model re-renders as you type.
size = 10;

cube(size, center = true);
";

/// Default model color in the viewer.
pub const DEFAULT_MODEL_COLOR: &str = "#ffffff";

/// What gets compiled and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Virtual path of the source file.
    pub source_path: String,
    /// Source text.
    pub source: String,
    /// Variable overrides.
    #[serde(default)]
    pub vars: VarBindings,
    /// Experimental features enabled for renders.
    #[serde(default)]
    pub features: Vec<String>,
}

/// Viewer preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Whether the log panel is open.
    #[serde(default)]
    pub logs: bool,
    /// Model color.
    pub color: String,
    /// Whether to draw axes.
    #[serde(default)]
    pub show_axes: bool,
    /// Whether to draw shadows.
    #[serde(default)]
    pub show_shadows: bool,
    /// Whether the editor shows line numbers.
    #[serde(default)]
    pub line_numbers: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            logs: false,
            color: DEFAULT_MODEL_COLOR.into(),
            show_axes: false,
            show_shadows: false,
            line_numbers: false,
        }
    }
}

/// Diagnostics of the most recent tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerRun {
    /// Shifted log text.
    pub log_text: String,
    /// Editor markers.
    pub markers: Vec<Marker>,
}

impl From<Diagnostics> for CheckerRun {
    fn from(diagnostics: Diagnostics) -> Self {
        Self {
            log_text: diagnostics.log_text,
            markers: diagnostics.markers,
        }
    }
}

/// The artifact currently shown, together with its live handle.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputState {
    /// Whether the artifact came from a preview.
    pub is_preview: bool,
    /// Artifact content.
    pub artifact: Artifact,
    /// Live handle; released exactly once when replaced.
    pub handle: ArtifactHandle,
    /// Tool run duration.
    pub elapsed_millis: u64,
    /// Human readable duration.
    pub formatted_elapsed_millis: String,
    /// Human readable artifact size.
    pub formatted_file_size: String,
    /// Rounded print price.
    pub total_price: f64,
    /// Currency label.
    pub currency: String,
}

/// The persisted part of [`AppState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    /// Compile parameters.
    pub params: Params,
    /// Viewer preferences.
    #[serde(default)]
    pub view: ViewState,
}

/// Root of the application state.
///
/// Children sit behind `Arc` so unchanged subtrees are shared between
/// versions; compare versions with [`Arc::ptr_eq`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Compile parameters.
    pub params: Arc<Params>,
    /// Viewer preferences.
    pub view: Arc<ViewState>,
    /// Diagnostics of the last syntax check or render.
    pub last_checker_run: Option<Arc<CheckerRun>>,
    /// Parameter manifest of the last syntax check.
    pub parameter_set: Option<Arc<ParameterSet>>,
    /// A syntax check is scheduled or running.
    pub checking_syntax: bool,
    /// A preview render is scheduled or running.
    pub previewing: bool,
    /// A full render is scheduled or running.
    pub rendering: bool,
    /// Description of the last render failure.
    pub error: Option<String>,
    /// Currently displayed artifact.
    pub output: Option<Arc<OutputState>>,
}

impl AppState {
    /// Empty project: blank source at the default path.
    #[must_use]
    pub fn blank(cfg: &AppConfig) -> Self {
        Self::from_saved(SavedState {
            params: Params {
                source_path: cfg.default_source_path.clone(),
                source: String::new(),
                vars: VarBindings::new(),
                features: Vec::new(),
            },
            view: ViewState::default(),
        })
    }

    /// Startup state: `saved` if given, the default project otherwise.
    ///
    /// Writes the source to `fs` (and the default source when the saved
    /// path differs) and enables the configured default features.
    pub fn initial(cfg: &AppConfig, fs: &dyn VirtualFs, saved: Option<SavedState>) -> Self {
        let mut saved = saved.unwrap_or_else(|| SavedState {
            params: Params {
                source_path: cfg.default_source_path.clone(),
                source: DEFAULT_SOURCE.into(),
                vars: VarBindings::new(),
                features: Vec::new(),
            },
            view: ViewState::default(),
        });

        let params = &mut saved.params;
        if let Err(e) = fs.write_file(&params.source_path, params.source.as_bytes()) {
            warn!(path = %params.source_path, "failed to write source: {e}");
        }
        if params.source_path != cfg.default_source_path {
            if let Err(e) = fs.write_file(&cfg.default_source_path, DEFAULT_SOURCE.as_bytes()) {
                warn!(path = %cfg.default_source_path, "failed to write default source: {e}");
            }
        }
        for feature in &cfg.default_features {
            if !params.features.contains(feature) {
                params.features.push(feature.clone());
            }
        }

        Self::from_saved(saved)
    }

    fn from_saved(saved: SavedState) -> Self {
        Self {
            params: Arc::new(saved.params),
            view: Arc::new(saved.view),
            last_checker_run: None,
            parameter_set: None,
            checking_syntax: false,
            previewing: false,
            rendering: false,
            error: None,
            output: None,
        }
    }

    /// The part of this state worth persisting.
    #[must_use]
    pub fn saved(&self) -> SavedState {
        SavedState {
            params: Params::clone(&self.params),
            view: ViewState::clone(&self.view),
        }
    }

    /// Whether any pipeline is scheduled or running.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.checking_syntax || self.previewing || self.rendering
    }

    /// Set the busy flag of the given render kind.
    pub fn set_render_flag(&mut self, is_preview: bool, value: bool) {
        if is_preview {
            self.previewing = value;
        } else {
            self.rendering = value;
        }
    }
}

macro_rules! leaf_node {
    ($($ty:ty),* $(,)?) => {
        $(impl Reconcile for $ty {
            fn reconcile(base: &Arc<Self>, draft: Self) -> Arc<Self> {
                reconcile_leaf(base, draft)
            }
        })*
    };
}

leaf_node!(Params, ViewState, CheckerRun, ParameterSet, OutputState);

impl Reconcile for AppState {
    fn reconcile(base: &Arc<Self>, draft: Self) -> Arc<Self> {
        let params = reconcile_child(&base.params, draft.params);
        let view = reconcile_child(&base.view, draft.view);
        let last_checker_run =
            reconcile_option(base.last_checker_run.as_ref(), draft.last_checker_run);
        let parameter_set = reconcile_option(base.parameter_set.as_ref(), draft.parameter_set);
        let output = reconcile_option(base.output.as_ref(), draft.output);

        let unchanged = Arc::ptr_eq(&params, &base.params)
            && Arc::ptr_eq(&view, &base.view)
            && same_option(last_checker_run.as_ref(), base.last_checker_run.as_ref())
            && same_option(parameter_set.as_ref(), base.parameter_set.as_ref())
            && same_option(output.as_ref(), base.output.as_ref())
            && draft.checking_syntax == base.checking_syntax
            && draft.previewing == base.previewing
            && draft.rendering == base.rendering
            && draft.error == base.error;
        if unchanged {
            return Arc::clone(base);
        }

        Arc::new(Self {
            params,
            view,
            last_checker_run,
            parameter_set,
            checking_syntax: draft.checking_syntax,
            previewing: draft.previewing,
            rendering: draft.rendering,
            error: draft.error,
            output,
        })
    }
}
