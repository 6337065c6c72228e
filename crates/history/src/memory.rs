//! In-memory host store over JSON state.
//!
//! Each [`Module`] owns one namespace of state, its mutations, and its
//! actions. Names are registered fully qualified, so `Module::new("doc")`
//! with a mutation `add` answers to `"doc/add"`.
//!
//! ```text
//! commit("doc/add")                 dispatch("doc/undo")
//!   │                                 │
//!   ├─ apply to a copy of doc state   ├─ await every ActionListener
//!   ├─ swap the copy in               └─ await the action handler
//!   └─ notify MutationListeners
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::capabilities::{CAN_REDO, CAN_UNDO};
use crate::error::{Error, Result};
use crate::store::{
    ActionHandler, ActionListener, MutationListener, NoOpAction, Store, StoreHooks,
};
use crate::types::{Commit, DispatchedAction, Namespace, Payload, ReservedAction, ReservedMutation};

/// A mutation handler: edits the module's state in place.
pub type MutationFn = Arc<dyn Fn(&mut Value, &Payload) -> Result<()> + Send + Sync>;

/// Borrow a state value as an object, turning `null` into an empty one.
///
/// # Errors
///
/// Returns `MutationFailed` when the state is an array or a scalar.
pub fn object_mut<'a>(state: &'a mut Value, mutation: &str) -> Result<&'a mut Map<String, Value>> {
    if state.is_null() {
        *state = Value::Object(Map::new());
    }
    state
        .as_object_mut()
        .ok_or_else(|| Error::mutation_failed(mutation, "module state is not an object"))
}

/// One namespace of a [`MemoryStore`], under construction.
pub struct Module {
    namespace: Namespace,
    state: Value,
    mutations: Vec<(String, MutationFn)>,
    actions: Vec<(String, Arc<dyn ActionHandler>)>,
}

impl Module {
    /// Create a module for the named namespace.
    pub fn new(name: &str) -> Self {
        Self::for_namespace(Namespace::named(name))
    }

    /// Create the root module.
    pub fn root() -> Self {
        Self::for_namespace(Namespace::root())
    }

    /// Create a module for an already-normalized namespace.
    pub fn for_namespace(namespace: Namespace) -> Self {
        Self {
            namespace,
            state: Value::Object(Map::new()),
            mutations: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// The module's namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Set the initial state.
    #[must_use]
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Register a mutation under its local name.
    #[must_use]
    pub fn mutation<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Value, &Payload) -> Result<()> + Send + Sync + 'static,
    {
        self.mutations.push((name.to_string(), Arc::new(handler)));
        self
    }

    /// Register an action under its local name.
    #[must_use]
    pub fn action(mut self, name: &str, handler: Arc<dyn ActionHandler>) -> Self {
        self.actions.push((name.to_string(), handler));
        self
    }

    /// Add what the history engine expects of a managed module.
    ///
    /// `canUndo`/`canRedo` start false, the status mutation applies each
    /// flag present in its payload, and `undo`/`redo` are no-op actions.
    #[must_use]
    pub fn scaffold(mut self) -> Self {
        if let Some(state) = self.state.as_object_mut() {
            state.insert(CAN_UNDO.to_string(), Value::Bool(false));
            state.insert(CAN_REDO.to_string(), Value::Bool(false));
        }

        let status = ReservedMutation::StatusUpdate.name();
        let mut module = self.mutation(status, move |state, payload| {
            let state = object_mut(state, status)?;
            for flag in [CAN_UNDO, CAN_REDO] {
                if let Some(value) = payload.get(flag) {
                    state.insert(flag.to_string(), value.clone());
                }
            }
            Ok(())
        });

        for action in [ReservedAction::Undo, ReservedAction::Redo] {
            let qualified = action.qualified(&module.namespace);
            module = module.action(action.name(), Arc::new(NoOpAction::new(qualified)));
        }
        module
    }

    /// Add a state-reset mutation that restores the current initial state.
    ///
    /// Capability flags survive the reset.
    #[must_use]
    pub fn resettable(self) -> Self {
        let baseline = self.state.clone();
        let reset = ReservedMutation::StateReset.name();
        self.mutation(reset, move |state, _payload| {
            let flags: Vec<(&str, Value)> = [CAN_UNDO, CAN_REDO]
                .into_iter()
                .filter_map(|flag| state.get(flag).cloned().map(|value| (flag, value)))
                .collect();
            *state = baseline.clone();
            if !flags.is_empty() {
                let state = object_mut(state, reset)?;
                state.extend(flags.into_iter().map(|(flag, value)| (flag.to_string(), value)));
            }
            Ok(())
        })
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("namespace", &self.namespace)
            .field("mutations", &self.mutations.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("actions", &self.actions.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`MemoryStore`].
#[derive(Debug, Default)]
pub struct StoreBuilder {
    modules: Vec<Module>,
}

impl StoreBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module.
    #[must_use]
    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    /// Build the store.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if two modules share a namespace.
    pub fn build(self) -> Result<MemoryStore> {
        let mut states = BTreeMap::new();
        let mut mutations = HashMap::new();
        let mut actions = HashMap::new();

        for module in self.modules {
            let namespace = module.namespace;
            if states.contains_key(&namespace) {
                return Err(Error::invalid_config(format!(
                    "module '{namespace}' registered twice"
                )));
            }

            for (name, handler) in module.mutations {
                mutations.insert(namespace.qualify(&name), (namespace.clone(), handler));
            }
            for (name, handler) in module.actions {
                actions.insert(namespace.qualify(&name), handler);
            }
            states.insert(namespace, module.state);
        }

        debug!(
            modules = states.len(),
            mutations = mutations.len(),
            actions = actions.len(),
            "Built memory store"
        );

        Ok(MemoryStore {
            states: RwLock::new(states),
            mutations,
            actions,
            listeners: RwLock::new(Vec::new()),
            action_listeners: RwLock::new(Vec::new()),
        })
    }
}

/// A [`Store`] keeping per-module JSON state in memory.
pub struct MemoryStore {
    states: RwLock<BTreeMap<Namespace, Value>>,
    mutations: HashMap<String, (Namespace, MutationFn)>,
    actions: HashMap<String, Arc<dyn ActionHandler>>,
    listeners: RwLock<Vec<Arc<dyn MutationListener>>>,
    action_listeners: RwLock<Vec<Arc<dyn ActionListener>>>,
}

impl MemoryStore {
    /// Create a builder.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// The whole state tree: root fields plus one field per named module.
    pub fn state(&self) -> Value {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        let mut tree = match states.get(&Namespace::root()) {
            Some(Value::Object(root)) => root.clone(),
            _ => Map::new(),
        };
        for (namespace, state) in states.iter().filter(|(ns, _)| !ns.is_root()) {
            tree.insert(namespace.module_name().to_string(), state.clone());
        }
        Value::Object(tree)
    }

    /// State of one module, or `None` if no such module exists.
    pub fn module_state(&self, namespace: &Namespace) -> Option<Value> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .cloned()
    }

    /// Check if a fully-qualified action is registered.
    pub fn has_action(&self, action_type: &str) -> bool {
        self.actions.contains_key(action_type)
    }

    fn apply(&self, mutation_type: &str, payload: &Payload) -> Result<()> {
        let (namespace, handler) = self
            .mutations
            .get(mutation_type)
            .ok_or_else(|| Error::mutation_not_found(mutation_type))?;

        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        let current = states.entry(namespace.clone()).or_insert(Value::Null);
        let mut next = current.clone();
        handler(&mut next, payload)?;
        *current = next;
        Ok(())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("mutations", &self.mutations.len())
            .field("actions", &self.actions.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn commit(&self, mutation_type: &str, payload: Payload) -> Result<()> {
        self.apply(mutation_type, &payload)?;
        trace!(mutation = %mutation_type, "Mutation applied");

        let commit = Commit::new(mutation_type, payload);
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_mutation(self, &commit)?;
        }
        Ok(())
    }

    async fn dispatch(&self, action_type: &str, payload: Payload) -> Result<()> {
        let handler = self
            .actions
            .get(action_type)
            .cloned()
            .ok_or_else(|| Error::action_not_found(action_type))?;

        let action = DispatchedAction::new(action_type, payload);
        let listeners = self
            .action_listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_action(self, &action).await?;
        }

        trace!(action = %action_type, handler = %handler.name(), "Running action");
        handler.call(self, &action.payload).await
    }

    fn has_mutation(&self, mutation_type: &str) -> bool {
        self.mutations.contains_key(mutation_type)
    }
}

impl StoreHooks for MemoryStore {
    fn subscribe(&self, listener: Arc<dyn MutationListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    fn subscribe_action(&self, listener: Arc<dyn ActionListener>) {
        self.action_listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::store::FnAction;

    fn push_item(state: &mut Value, payload: &Payload) -> Result<()> {
        let state = object_mut(state, "push")?;
        let items = state.entry("items").or_insert_with(|| json!([]));
        if let Some(items) = items.as_array_mut() {
            items.push(payload.value().clone());
        }
        Ok(())
    }

    fn doc() -> Module {
        Module::new("doc")
            .with_state(json!({"items": []}))
            .mutation("push", push_item)
            .scaffold()
            .resettable()
    }

    struct MutationLog(Mutex<Vec<String>>);

    impl MutationListener for MutationLog {
        fn on_mutation(&self, _store: &dyn Store, mutation: &Commit) -> Result<()> {
            self.0.lock().unwrap().push(mutation.mutation_type.clone());
            Ok(())
        }
    }

    #[test]
    fn test_commit_applies_and_notifies() {
        let store = StoreBuilder::new().module(doc()).build().unwrap();
        let log = Arc::new(MutationLog(Mutex::new(Vec::new())));
        store.subscribe(log.clone());

        store.commit("doc/push", Payload::new(json!(1))).unwrap();

        assert_eq!(store.state()["doc"]["items"], json!([1]));
        assert_eq!(*log.0.lock().unwrap(), vec!["doc/push"]);
    }

    #[test]
    fn test_unknown_mutation() {
        let store = StoreBuilder::new().module(doc()).build().unwrap();
        let result = store.commit("doc/pop", Payload::empty());
        assert!(matches!(result, Err(Error::MutationNotFound { .. })));
    }

    #[test]
    fn test_failed_mutation_leaves_state_unchanged() {
        let module = Module::new("doc")
            .with_state(json!({"n": 1}))
            .mutation("bump_then_fail", |state, _payload| {
                state["n"] = json!(2);
                Err(Error::mutation_failed("doc/bump_then_fail", "rejected"))
            });
        let store = StoreBuilder::new().module(module).build().unwrap();

        assert!(store.commit("doc/bump_then_fail", Payload::empty()).is_err());
        assert_eq!(store.module_state(&Namespace::named("doc")), Some(json!({"n": 1})));
    }

    #[test]
    fn test_scaffold_and_status_mutation() {
        let store = StoreBuilder::new().module(doc()).build().unwrap();
        assert!(store.has_mutation("doc/updateCanUndoRedo"));
        assert!(store.has_mutation("doc/emptyState"));
        assert!(store.has_action("doc/undo"));
        assert!(store.has_action("doc/redo"));
        assert_eq!(store.state()["doc"]["canUndo"], json!(false));

        // Flags are applied independently.
        store
            .commit("doc/updateCanUndoRedo", Payload::new(json!({"canRedo": true})))
            .unwrap();
        assert_eq!(store.state()["doc"]["canUndo"], json!(false));
        assert_eq!(store.state()["doc"]["canRedo"], json!(true));
    }

    #[test]
    fn test_reset_restores_baseline_and_keeps_flags() {
        let store = StoreBuilder::new().module(doc()).build().unwrap();
        store.commit("doc/push", Payload::new(json!("a"))).unwrap();
        store
            .commit("doc/updateCanUndoRedo", Payload::new(json!({"canUndo": true})))
            .unwrap();

        store.commit("doc/emptyState", Payload::empty()).unwrap();

        let doc = store.module_state(&Namespace::named("doc")).unwrap();
        assert_eq!(doc["items"], json!([]));
        assert_eq!(doc["canUndo"], json!(true));
    }

    #[test]
    fn test_root_fields_and_modules_compose() {
        let root = Module::root()
            .with_state(json!({"title": "untitled"}))
            .mutation("rename", |state, payload| {
                object_mut(state, "rename")?.insert("title".into(), payload.value().clone());
                Ok(())
            });
        let store = StoreBuilder::new().module(root).module(doc()).build().unwrap();

        store.commit("rename", Payload::new(json!("notes"))).unwrap();
        let state = store.state();
        assert_eq!(state["title"], json!("notes"));
        assert_eq!(state["doc"]["items"], json!([]));
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let result = StoreBuilder::new()
            .module(Module::new("doc"))
            .module(Module::new("doc/"))
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_dispatch_runs_handler() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let module = doc().action(
            "save",
            Arc::new(FnAction::new("doc/save", move |store: &dyn Store, payload: &Payload| {
                *counter.lock().unwrap() += 1;
                store.commit("doc/push", payload.clone())
            })),
        );
        let store = StoreBuilder::new().module(module).build().unwrap();

        store.dispatch("doc/save", Payload::new(json!("x"))).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(store.state()["doc"]["items"], json!(["x"]));

        let missing = store.dispatch("doc/load", Payload::empty()).await;
        assert!(matches!(missing, Err(Error::ActionNotFound { .. })));
    }
}
