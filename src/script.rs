//! Scripted sessions against the in-memory store.
//!
//! A script is a JSON (or TOML) document listing steps:
//!
//! ```json
//! {
//!   "steps": [
//!     { "op": "commit", "mutation": "doc/set", "payload": { "key": "title", "value": "Draft" } },
//!     { "op": "undo", "namespace": "doc" },
//!     { "op": "redo", "namespace": "doc" }
//!   ]
//! }
//! ```
//!
//! Every managed namespace gets a module with generic `set`, `push` and
//! `remove` mutations and a `log` action.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use rewind_history::{
    FnAction, HistoryOptions, HistorySnapshot, MemoryStore, Module, Namespace, Payload,
    ReservedAction, Store, StoreBuilder, UndoRedoEngine, object_mut,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

/// One scripted operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Commit a fully-qualified mutation.
    Commit {
        mutation: String,
        #[serde(default)]
        payload: Payload,
    },
    /// Dispatch a fully-qualified action.
    Dispatch {
        action: String,
        #[serde(default)]
        payload: Payload,
    },
    /// Dispatch the namespace's `undo` action.
    Undo {
        #[serde(default)]
        namespace: String,
    },
    /// Dispatch the namespace's `redo` action.
    Redo {
        #[serde(default)]
        namespace: String,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit { mutation, .. } => write!(f, "commit {mutation}"),
            Self::Dispatch { action, .. } => write!(f, "dispatch {action}"),
            Self::Undo { namespace } => write!(f, "undo {}", Namespace::named(namespace)),
            Self::Redo { namespace } => write!(f, "redo {}", Namespace::named(namespace)),
        }
    }
}

/// A list of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    /// Load a script from a `.json` or `.toml` file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> rewind_core::Result<Self> {
        rewind_core::read_config(path)
    }
}

/// Everything a finished session prints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub state: Value,
    pub history: BTreeMap<String, HistorySnapshot>,
    pub log: Vec<Value>,
}

type ActionLog = Arc<Mutex<Vec<Value>>>;

fn entry_key(payload: &Payload, mutation: &str) -> rewind_history::Result<String> {
    payload
        .get("key")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            rewind_history::Error::mutation_failed(mutation, "payload needs a string 'key'")
        })
}

fn set(state: &mut Value, payload: &Payload) -> rewind_history::Result<()> {
    let key = entry_key(payload, "set")?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);
    object_mut(state, "set")?.insert(key, value);
    Ok(())
}

fn push(state: &mut Value, payload: &Payload) -> rewind_history::Result<()> {
    let key = entry_key(payload, "push")?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);
    let list = object_mut(state, "push")?
        .entry(key)
        .or_insert_with(|| json!([]));
    match list.as_array_mut() {
        Some(items) => {
            items.push(value);
            Ok(())
        }
        None => Err(rewind_history::Error::mutation_failed("push", "target is not a list")),
    }
}

fn remove(state: &mut Value, payload: &Payload) -> rewind_history::Result<()> {
    let key = entry_key(payload, "remove")?;
    object_mut(state, "remove")?.remove(&key);
    Ok(())
}

/// A module with the generic mutations and a `log` action.
pub fn generic_module(namespace: Namespace, log: &ActionLog) -> Module {
    let action = namespace.qualify("log");
    let log = Arc::clone(log);
    let log_action = FnAction::new(
        action.clone(),
        move |_store: &dyn Store, payload: &Payload| {
            info!(action = %action, payload = %payload.value(), "log");
            let entry = json!({ "action": action.clone(), "payload": payload.value().clone() });
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(entry);
            Ok(())
        },
    );

    Module::for_namespace(namespace)
        .mutation("set", set)
        .mutation("push", push)
        .mutation("remove", remove)
        .action("log", Arc::new(log_action))
        .scaffold()
        .resettable()
}

/// A store with one generic module per managed namespace, with history attached.
pub struct Session {
    store: MemoryStore,
    engine: Arc<UndoRedoEngine>,
    namespaces: Vec<Namespace>,
    log: ActionLog,
}

impl Session {
    /// Build the store and attach the engine.
    ///
    /// # Errors
    ///
    /// Returns error if the options do not validate.
    pub fn new(options: &HistoryOptions) -> rewind_history::Result<Self> {
        let log = ActionLog::default();
        let namespaces: Vec<Namespace> = options
            .path_configs()?
            .into_iter()
            .map(|config| config.namespace().clone())
            .collect();

        let store = namespaces
            .iter()
            .fold(StoreBuilder::new(), |builder, namespace| {
                builder.module(generic_module(namespace.clone(), &log))
            })
            .build()?;
        let engine = UndoRedoEngine::attach(options, &store)?;

        Ok(Self {
            store,
            engine,
            namespaces,
            log,
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Run one step.
    ///
    /// # Errors
    ///
    /// Returns the store's or the engine's error.
    pub async fn run_step(&self, step: &Step) -> rewind_history::Result<()> {
        match step {
            Step::Commit { mutation, payload } => self.store.commit(mutation, payload.clone()),
            Step::Dispatch { action, payload } => {
                self.store.dispatch(action, payload.clone()).await
            }
            Step::Undo { namespace } => self.trigger(ReservedAction::Undo, namespace).await,
            Step::Redo { namespace } => self.trigger(ReservedAction::Redo, namespace).await,
        }
    }

    async fn trigger(&self, action: ReservedAction, namespace: &str) -> rewind_history::Result<()> {
        let namespace = Namespace::named(namespace);
        self.store
            .dispatch(&action.qualified(&namespace), Payload::empty())
            .await
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, naming the step.
    pub async fn run(&self, script: &Script) -> anyhow::Result<()> {
        for (index, step) in script.steps.iter().enumerate() {
            self.run_step(step)
                .await
                .with_context(|| format!("step {} ({step}) failed", index + 1))?;
        }
        info!(steps = script.steps.len(), "Script complete");
        Ok(())
    }

    /// Current state, history of every managed namespace, and logged actions.
    pub fn report(&self) -> SessionReport {
        let history = self
            .namespaces
            .iter()
            .filter_map(|namespace| {
                self.engine
                    .history(namespace)
                    .map(|snapshot| (namespace.to_string(), snapshot))
            })
            .collect();
        let log = self
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        SessionReport {
            state: self.store.state(),
            history,
            log,
        }
    }
}
