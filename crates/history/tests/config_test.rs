//! Loading history options from files and attaching them to a store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::io::Write;

use common::{EventLog, module, named, names};
use rewind_history::{
    Error, HistoryOptions, Module, Namespace, Store, StoreBuilder, UndoRedoEngine,
};
use serde_json::json;

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_toml_config_drives_recording() {
    let file = write_config(
        ".toml",
        r#"
        [[paths]]
        namespace = "doc"
        ignore_mutations = ["select"]

        [[paths]]
        namespace = "sidebar"
        "#,
    );
    let options = HistoryOptions::from_file(file.path()).unwrap();

    let log = EventLog::default();
    let store = StoreBuilder::new()
        .module(module("doc", &log))
        .module(module("sidebar", &log))
        .build()
        .unwrap();
    let engine = UndoRedoEngine::attach(&options, &store).unwrap();

    store.commit("doc/add", named("A")).unwrap();
    store.commit("doc/select", named("A")).unwrap();
    store.commit("sidebar/add", named("S")).unwrap();

    let doc = engine.history(&Namespace::named("doc")).unwrap();
    assert_eq!(names(&doc.done), vec!["A"]);
    assert_eq!(doc.done_names(), vec!["add"]);

    store
        .dispatch("sidebar/undo", rewind_history::Payload::empty())
        .await
        .unwrap();
    assert_eq!(store.state()["sidebar"]["items"], json!([]));
    assert_eq!(store.state()["doc"]["items"], json!(["A"]));
}

#[tokio::test]
async fn test_root_json_config() {
    let file = write_config(".json", r#"{"ignoreMutations": ["select"]}"#);
    let options = HistoryOptions::from_file(file.path()).unwrap();

    let log = EventLog::default();
    let root = Module::root()
        .with_state(json!({"count": 0}))
        .mutation("bump", |state, _payload| {
            let count = state["count"].as_i64().unwrap_or(0);
            state["count"] = json!(count + 1);
            Ok(())
        })
        .mutation("select", |_state, _payload| Ok(()))
        .scaffold()
        .resettable();
    let store = StoreBuilder::new()
        .module(root)
        .module(module("doc", &log))
        .build()
        .unwrap();
    let engine = UndoRedoEngine::attach(&options, &store).unwrap();

    store.commit("bump", rewind_history::Payload::empty()).unwrap();
    store.commit("bump", rewind_history::Payload::empty()).unwrap();
    store.commit("select", rewind_history::Payload::empty()).unwrap();
    // Namespaced mutations never land in the root history.
    store.commit("doc/add", named("A")).unwrap();

    let root_history = engine.history(&Namespace::root()).unwrap();
    assert_eq!(root_history.done_names(), vec!["bump", "bump"]);
    assert_eq!(store.state()["canUndo"], json!(true));

    store
        .dispatch("undo", rewind_history::Payload::empty())
        .await
        .unwrap();
    assert_eq!(store.state()["count"], json!(1));
    assert_eq!(store.state()["doc"]["items"], json!(["A"]));
}

#[test]
fn test_attach_rejects_store_without_reset_mutation() {
    let store = StoreBuilder::new()
        .module(Module::new("doc").scaffold())
        .build()
        .unwrap();
    let options = HistoryOptions::from_toml_str("[[paths]]\nnamespace = \"doc\"\n").unwrap();

    let result = UndoRedoEngine::attach(&options, &store);
    assert!(matches!(
        result,
        Err(Error::MutationNotFound { ref mutation }) if mutation == "doc/emptyState"
    ));
}

#[test]
fn test_attach_rejects_store_without_status_mutation() {
    let store = StoreBuilder::new()
        .module(Module::new("doc").resettable())
        .build()
        .unwrap();
    let options = HistoryOptions::from_toml_str("[[paths]]\nnamespace = \"doc\"\n").unwrap();

    let result = UndoRedoEngine::attach(&options, &store);
    assert!(matches!(
        result,
        Err(Error::MutationNotFound { ref mutation }) if mutation == "doc/updateCanUndoRedo"
    ));
}

#[test]
fn test_duplicate_namespaces_rejected_at_load() {
    let file = write_config(
        ".toml",
        "[[paths]]\nnamespace = \"doc\"\n\n[[paths]]\nnamespace = \"doc/\"\n",
    );
    let result = HistoryOptions::from_file(file.path());
    assert!(matches!(result, Err(Error::InvalidConfig { .. })));
}

#[test]
fn test_unsupported_extension() {
    let file = write_config(".yaml", "paths: []");
    let result = HistoryOptions::from_file(file.path());
    assert!(matches!(result, Err(Error::Core(_))));
}
