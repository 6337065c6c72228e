//! Shared fixtures for history integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use rewind_history::{
    ActionHandler, Commit, FnAction, HistoryOptions, HistorySnapshot, MemoryStore,
    MutationListener, Module, Namespace, PathOptions, Payload, Result, Store, StoreBuilder,
    StoreHooks, UndoRedoEngine, object_mut,
};
use serde_json::{Value, json};

/// Ordered record of callbacks and commits seen during a test.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Logs every committed mutation as `commit:<type>`.
pub struct CommitProbe(pub EventLog);

impl MutationListener for CommitProbe {
    fn on_mutation(&self, _store: &dyn Store, mutation: &Commit) -> Result<()> {
        self.0.push(format!("commit:{}", mutation.mutation_type));
        Ok(())
    }
}

fn item_name(payload: &Payload) -> String {
    payload
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string()
}

/// Appends the payload's `name` to `items`.
fn add_item(state: &mut Value, payload: &Payload) -> Result<()> {
    let state = object_mut(state, "add")?;
    let items = state.entry("items").or_insert_with(|| json!([]));
    if let Some(items) = items.as_array_mut() {
        items.push(Value::String(item_name(payload)));
    }
    Ok(())
}

/// Sets `fields[name]` to the payload's `value`.
fn set_field(state: &mut Value, payload: &Payload) -> Result<()> {
    let state = object_mut(state, "set")?;
    let fields = state.entry("fields").or_insert_with(|| json!({}));
    if let Some(fields) = fields.as_object_mut() {
        let value = payload.get("value").cloned().unwrap_or(Value::Bool(true));
        fields.insert(item_name(payload), value);
    }
    Ok(())
}

/// Sets `selected` to the payload's `name`.
fn select(state: &mut Value, payload: &Payload) -> Result<()> {
    object_mut(state, "select")?.insert("selected".into(), Value::String(item_name(payload)));
    Ok(())
}

/// An action logging `<kind>:<name>`.
pub fn log_action(kind: &'static str, log: &EventLog) -> Arc<dyn ActionHandler> {
    let log = log.clone();
    Arc::new(FnAction::new(kind, move |_store: &dyn Store, payload: &Payload| {
        log.push(format!("{kind}:{}", item_name(payload)));
        Ok(())
    }))
}

/// A scaffolded, resettable module with `add`, `set` and `select`
/// mutations plus `logUndo` / `logRedo` actions.
pub fn module(name: &str, log: &EventLog) -> Module {
    Module::new(name)
        .with_state(json!({"items": [], "fields": {}, "selected": null}))
        .mutation("add", add_item)
        .mutation("set", set_field)
        .mutation("select", select)
        .action("logUndo", log_action("undo", log))
        .action("logRedo", log_action("redo", log))
        .scaffold()
        .resettable()
}

/// A payload naming an item.
pub fn named(name: &str) -> Payload {
    Payload::new(json!({ "name": name }))
}

/// Payload `name` fields of a stack, bottom first.
pub fn names(commits: &[Commit]) -> Vec<String> {
    commits.iter().map(|commit| item_name(&commit.payload)).collect()
}

/// A store with one module per namespace, all managed by the engine.
pub struct Session {
    pub store: MemoryStore,
    pub engine: Arc<UndoRedoEngine>,
    pub log: EventLog,
}

impl Session {
    pub fn new(namespaces: &[&str]) -> Self {
        let options = namespaces
            .iter()
            .fold(HistoryOptions::default(), |options, ns| {
                options.with_path(PathOptions::new(*ns))
            });
        Self::with_options(namespaces, &options, |module| module)
    }

    /// Build with explicit options; `customize` can add to every module.
    pub fn with_options<F>(namespaces: &[&str], options: &HistoryOptions, customize: F) -> Self
    where
        F: Fn(Module) -> Module,
    {
        let log = EventLog::default();
        let store = namespaces
            .iter()
            .fold(StoreBuilder::new(), |builder, ns| {
                builder.module(customize(module(ns, &log)))
            })
            .build()
            .unwrap_or_else(|err| unreachable!("fixture store must build: {err}"));
        let engine = UndoRedoEngine::attach(options, &store)
            .unwrap_or_else(|err| unreachable!("fixture engine must attach: {err}"));
        Self { store, engine, log }
    }

    /// Log every commit from now on.
    pub fn probe_commits(&self) {
        self.store.subscribe(Arc::new(CommitProbe(self.log.clone())));
    }

    pub fn commit(&self, mutation: &str, payload: Payload) -> Result<()> {
        self.store.commit(mutation, payload)
    }

    pub async fn undo(&self, ns: &str) -> Result<()> {
        self.store
            .dispatch(&Namespace::named(ns).qualify("undo"), Payload::empty())
            .await
    }

    pub async fn redo(&self, ns: &str) -> Result<()> {
        self.store
            .dispatch(&Namespace::named(ns).qualify("redo"), Payload::empty())
            .await
    }

    pub fn history(&self, ns: &str) -> Option<HistorySnapshot> {
        self.engine.history(&Namespace::named(ns))
    }

    pub fn state(&self, ns: &str) -> Value {
        self.store
            .module_state(&Namespace::named(ns))
            .unwrap_or(Value::Null)
    }
}
