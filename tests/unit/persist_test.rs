//! Tests for the JSON state persister

use std::sync::Arc;

use compile_lane::config::AppConfig;
use compile_lane::core::StatePersister;
use compile_lane::infra::{InMemoryFs, JsonFilePersister};
use compile_lane::pipeline::VarValue;
use compile_lane::state::AppState;

#[test]
fn test_saved_state_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let persister = JsonFilePersister::new(dir.path().join("state.json"));
    assert!(persister.load().unwrap().is_none());

    let cfg = AppConfig::default();
    let mut state = AppState::initial(&cfg, &InMemoryFs::new(), None);
    Arc::make_mut(&mut state.params)
        .vars
        .insert("size".into(), VarValue::from(12));
    Arc::make_mut(&mut state.view).show_axes = true;
    state.rendering = true;
    persister.save(&Arc::new(state.clone()));

    let saved = persister.load().unwrap().unwrap();
    assert_eq!(saved, state.saved());

    // Restoring goes through the same startup path.
    let fs = InMemoryFs::new();
    let restored = AppState::initial(&cfg, &fs, Some(saved));
    assert_eq!(restored.params, state.params);
    assert!(restored.view.show_axes);
    assert!(!restored.rendering);
}

#[test]
fn test_load_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{").unwrap();
    assert!(JsonFilePersister::new(path).load().is_err());
}

#[test]
fn test_save_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let persister = JsonFilePersister::new(dir.path().join("missing").join("state.json"));
    let state = Arc::new(AppState::blank(&AppConfig::default()));
    persister.save(&state);
    assert!(persister.load().unwrap().is_none());
}
