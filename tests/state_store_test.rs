//! Identity preservation of the structural-sharing store over `AppState`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use compile_lane::config::AppConfig;
use compile_lane::core::{Artifact, ArtifactHandle};
use compile_lane::infra::InMemoryStatePersister;
use compile_lane::pipeline::VarValue;
use compile_lane::state::{mutate, AppState, CheckerRun, OutputState, StateStore};

fn base() -> Arc<AppState> {
    let mut state = AppState::blank(&AppConfig::default());
    Arc::make_mut(&mut state.params).source = "cube(1);".into();
    state.last_checker_run = Some(Arc::new(CheckerRun {
        log_text: "ok".into(),
        markers: Vec::new(),
    }));
    state.output = Some(Arc::new(OutputState {
        is_preview: true,
        artifact: Artifact::new("out.stl", vec![0; 84]),
        handle: ArtifactHandle("artifact:1".into()),
        elapsed_millis: 10,
        formatted_elapsed_millis: "10ms".into(),
        formatted_file_size: "84 B".into(),
        total_price: 0.0,
        currency: "Rp. ".into(),
    }));
    Arc::new(state)
}

#[test]
fn test_reading_only_returns_same_root() {
    let root = base();
    let next = mutate(&root, |s| {
        let _ = s.params.source.len();
        let _ = s.output.as_ref().map(|o| o.total_price);
    });
    assert!(Arc::ptr_eq(&root, &next));
}

#[test]
fn test_writing_equal_values_returns_same_root() {
    let root = base();
    let next = mutate(&root, |s| {
        Arc::make_mut(&mut s.params).source = "cube(1);".into();
        s.checking_syntax = false;
        s.error = None;
        s.last_checker_run = Some(Arc::new(CheckerRun {
            log_text: "ok".into(),
            markers: Vec::new(),
        }));
    });
    assert!(Arc::ptr_eq(&root, &next));
}

#[test]
fn test_flag_change_keeps_every_child() {
    let root = base();
    let next = mutate(&root, |s| s.previewing = true);

    assert!(!Arc::ptr_eq(&root, &next));
    assert!(next.previewing);
    assert!(Arc::ptr_eq(&root.params, &next.params));
    assert!(Arc::ptr_eq(&root.view, &next.view));
    assert!(Arc::ptr_eq(
        root.last_checker_run.as_ref().unwrap(),
        next.last_checker_run.as_ref().unwrap()
    ));
    assert!(Arc::ptr_eq(root.output.as_ref().unwrap(), next.output.as_ref().unwrap()));
}

#[test]
fn test_nested_change_rebuilds_its_ancestors_only() {
    let root = base();
    let next = mutate(&root, |s| {
        Arc::make_mut(&mut s.params)
            .vars
            .insert("size".into(), VarValue::from(20));
    });

    assert!(!Arc::ptr_eq(&root, &next));
    assert!(!Arc::ptr_eq(&root.params, &next.params));
    assert!(Arc::ptr_eq(&root.view, &next.view));
    assert!(Arc::ptr_eq(root.output.as_ref().unwrap(), next.output.as_ref().unwrap()));
    assert!(root.params.vars.is_empty());
    assert_eq!(next.params.vars["size"], VarValue::from(20));
}

#[test]
fn test_clearing_an_optional_child_is_a_change() {
    let root = base();
    let next = mutate(&root, |s| s.output = None);
    assert!(!Arc::ptr_eq(&root, &next));
    assert!(next.output.is_none());
    assert!(root.output.is_some());
}

#[test]
fn test_store_persists_and_notifies_only_real_changes() {
    let persister = Arc::new(InMemoryStatePersister::<AppState>::new(8));
    let notified = Arc::new(AtomicUsize::new(0));
    let mut store =
        StateStore::new(AppState::clone(&base())).with_persister(persister.clone());
    let counter = Arc::clone(&notified);
    store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let before = store.current();
    assert!(!store.mutate(|s| s.rendering = false));
    assert!(Arc::ptr_eq(&before, &store.current()));

    assert!(store.mutate(|s| s.rendering = true));
    assert!(store.mutate(|s| s.rendering = false));
    assert_eq!(notified.load(Ordering::SeqCst), 2);
    assert_eq!(persister.len(), 2);
    assert!(Arc::ptr_eq(&persister.last().unwrap(), &store.current()));
}
