//! Immutable application state and its structural-sharing store.

pub mod app_state;
pub mod store;

pub use app_state::{
    AppState, CheckerRun, OutputState, Params, SavedState, ViewState, DEFAULT_MODEL_COLOR,
    DEFAULT_SOURCE,
};
pub use store::{
    mutate, reconcile_child, reconcile_leaf, reconcile_option, same_option, Reconcile, StateStore,
};
