//! Undo/redo engine.
//!
//! Undo replays from scratch: the module is reset to its baseline and the
//! remaining history is committed again. Redo commits the undone group
//! on top of the current state, in its original order.
//!
//! ```text
//!            undo                          redo
//!  ┌──────────────────────────┐   ┌──────────────────────────┐
//!  │ Replaying                │   │ Replaying                │
//!  │ 1. undoCallbacks (group) │   │ 1. commit group          │
//!  │ 2. commit <ns>emptyState │   │ 2. redoCallbacks (group) │
//!  │ 3. commit remaining done │   └──────────────────────────┘
//!  │ 4. redoCallbacks (done)  │
//!  └──────────────────────────┘
//!              │ Ok: move group, Idle, publish flags
//!              │ Err: stacks unchanged, Idle, publish flags, return Err
//! ```

use std::sync::Arc;

use rewind_core::GenericResultExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::config::HistoryOptions;
use crate::error::{Error, Result};
use crate::interceptor::ActionInterceptor;
use crate::path_config::{GroupSplit, PathConfig, ReplayState};
use crate::pipeline::{ActionCall, ActionPipeline};
use crate::recorder::HistoryRecorder;
use crate::registry::ConfigRegistry;
use crate::store::{Store, StoreHooks};
use crate::types::{Commit, Namespace, Payload, ReservedMutation};

/// Read-only view of one namespace's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySnapshot {
    pub namespace: Namespace,
    /// Oldest first.
    pub done: Vec<Commit>,
    /// Most recently undone last.
    pub undone: Vec<Commit>,
    pub state: ReplayState,
}

impl HistorySnapshot {
    fn of(config: &PathConfig) -> Self {
        Self {
            namespace: config.namespace().clone(),
            done: config.done().iter().cloned().collect(),
            undone: config.undone().iter().cloned().collect(),
            state: config.state(),
        }
    }

    /// Local mutation names on the `done` stack, oldest first.
    pub fn done_names(&self) -> Vec<&str> {
        self.local_names(&self.done)
    }

    /// Local mutation names on the `undone` stack.
    pub fn undone_names(&self) -> Vec<&str> {
        self.local_names(&self.undone)
    }

    fn local_names<'a>(&self, commits: &'a [Commit]) -> Vec<&'a str> {
        commits
            .iter()
            .map(|commit| {
                commit
                    .mutation_type
                    .strip_prefix(self.namespace.as_str())
                    .unwrap_or(&commit.mutation_type)
            })
            .collect()
    }
}

/// Namespaced undo/redo over a host store.
#[derive(Debug)]
pub struct UndoRedoEngine {
    registry: Arc<ConfigRegistry>,
}

impl UndoRedoEngine {
    /// Create an engine over an existing registry.
    pub fn new(registry: Arc<ConfigRegistry>) -> Self {
        Self { registry }
    }

    /// Create an engine with fresh, empty histories.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the options do not validate.
    pub fn from_options(options: &HistoryOptions) -> Result<Self> {
        Ok(Self::new(Arc::new(ConfigRegistry::from_options(options)?)))
    }

    /// Create an engine and hook it into a store.
    ///
    /// Every managed namespace must have its status and state-reset
    /// mutations registered. The recorder is subscribed to the mutation
    /// bus and the interceptor to the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for bad options, or `MutationNotFound`
    /// naming the first missing reserved mutation.
    pub fn attach<S>(options: &HistoryOptions, store: &S) -> Result<Arc<Self>>
    where
        S: Store + StoreHooks,
    {
        let engine = Arc::new(Self::from_options(options)?);
        engine.validate_store(store)?;

        store.subscribe(Arc::new(HistoryRecorder::new(engine.registry())));
        store.subscribe_action(Arc::new(ActionInterceptor::new(Arc::clone(&engine))));

        info!(
            namespaces = engine.registry.len(),
            "History attached to store"
        );
        Ok(engine)
    }

    /// Check that every managed namespace has its reserved mutations.
    ///
    /// # Errors
    ///
    /// Returns `MutationNotFound` for the first one missing.
    pub fn validate_store(&self, store: &dyn Store) -> Result<()> {
        for namespace in self.registry.namespaces() {
            for reserved in ReservedMutation::all() {
                let mutation = reserved.qualified(&namespace);
                if !store.has_mutation(&mutation) {
                    return Err(Error::mutation_not_found(mutation));
                }
            }
        }
        Ok(())
    }

    /// The shared registry.
    pub fn registry(&self) -> Arc<ConfigRegistry> {
        Arc::clone(&self.registry)
    }

    /// Check if the namespace is managed and has something to undo.
    pub fn can_undo(&self, namespace: &Namespace) -> bool {
        self.registry
            .get(namespace)
            .is_some_and(|config| config.can_undo())
    }

    /// Check if the namespace is managed and has something to redo.
    pub fn can_redo(&self, namespace: &Namespace) -> bool {
        self.registry
            .get(namespace)
            .is_some_and(|config| config.can_redo())
    }

    /// Inspect a namespace's history.
    pub fn history(&self, namespace: &Namespace) -> Option<HistorySnapshot> {
        self.registry
            .get(namespace)
            .map(|config| HistorySnapshot::of(&config))
    }

    /// Commit the namespace's current capability flags.
    ///
    /// Unmanaged namespaces are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the status mutation.
    pub fn publish_capabilities(&self, store: &dyn Store, namespace: &Namespace) -> Result<()> {
        match self.registry.get(namespace) {
            Some(config) => Capabilities::of(&config).publish(store, namespace),
            None => Ok(()),
        }
    }

    /// Undo the latest commit of a namespace, with its whole action group.
    ///
    /// Does nothing for unmanaged namespaces or an empty `done` stack.
    ///
    /// # Errors
    ///
    /// Returns the first failing callback or commit. The namespace is back
    /// to `Idle` and its stacks are unchanged.
    pub async fn undo(&self, store: &dyn Store, namespace: &Namespace) -> Result<()> {
        let Some(config) = self.registry.get(namespace) else {
            debug!(namespace = %namespace, "Undo on unmanaged namespace");
            return Ok(());
        };
        let Some(split) = config.take_undo() else {
            debug!(namespace = %namespace, "Nothing to undo");
            return Ok(());
        };

        info!(
            namespace = %namespace,
            commits = split.len(),
            replayed = split.remaining().len(),
            "Undoing"
        );

        self.registry.set_state(namespace, ReplayState::Replaying);
        let result = Self::replay_undo(store, namespace, &split).await;
        self.finish(store, namespace, result, |config| config.after_undo(&split))
    }

    /// Redo the latest undone commit of a namespace, with its whole action group.
    ///
    /// Does nothing for unmanaged namespaces or an empty `undone` stack.
    ///
    /// # Errors
    ///
    /// Returns the first failing commit or callback. The namespace is back
    /// to `Idle` and its stacks are unchanged.
    pub async fn redo(&self, store: &dyn Store, namespace: &Namespace) -> Result<()> {
        let Some(config) = self.registry.get(namespace) else {
            debug!(namespace = %namespace, "Redo on unmanaged namespace");
            return Ok(());
        };
        let Some(split) = config.take_redo() else {
            debug!(namespace = %namespace, "Nothing to redo");
            return Ok(());
        };

        info!(namespace = %namespace, commits = split.len(), "Redoing");

        self.registry.set_state(namespace, ReplayState::Replaying);
        let result = Self::replay_redo(store, namespace, &split).await;
        self.finish(store, namespace, result, |config| config.after_redo(&split))
    }

    async fn replay_undo(
        store: &dyn Store,
        namespace: &Namespace,
        split: &GroupSplit,
    ) -> Result<()> {
        let callbacks: ActionPipeline = split
            .ordered()
            .iter()
            .map(|commit| {
                let action = commit.undo_callback().map(|name| namespace.qualify(name));
                ActionCall::new(action, commit.payload.snapshot())
            })
            .collect();
        callbacks.run(store).await?;

        store.commit(
            &ReservedMutation::StateReset.qualified(namespace),
            Payload::empty(),
        )?;

        let executed = replay_commits(store, namespace, split.remaining().iter())?
            .run(store)
            .await?;
        debug!(namespace = %namespace, callbacks = executed, "Undo replay complete");
        Ok(())
    }

    async fn replay_redo(
        store: &dyn Store,
        namespace: &Namespace,
        split: &GroupSplit,
    ) -> Result<()> {
        // Chronological order, so the store matches `done` afterwards.
        let executed = replay_commits(store, namespace, split.stacked())?
            .run(store)
            .await?;
        debug!(namespace = %namespace, callbacks = executed, "Redo replay complete");
        Ok(())
    }

    /// Leave `Replaying` whatever happened, then republish the flags.
    fn finish<F>(
        &self,
        store: &dyn Store,
        namespace: &Namespace,
        result: Result<()>,
        apply: F,
    ) -> Result<()>
    where
        F: FnOnce(&PathConfig) -> PathConfig,
    {
        match result {
            Ok(()) => {
                let Some(updated) = self
                    .registry
                    .update(namespace, |config| apply(config).with_state(ReplayState::Idle))
                else {
                    return Ok(());
                };
                debug!(
                    namespace = %namespace,
                    done = updated.done().len(),
                    undone = updated.undone().len(),
                    "History moved"
                );
                Capabilities::of(&updated).publish(store, namespace)
            }
            Err(err) => {
                warn!(
                    namespace = %namespace,
                    error = %err,
                    "Replay failed, history left unchanged"
                );
                self.registry.set_state(namespace, ReplayState::Idle);
                self.publish_capabilities(store, namespace)
                    .ok_logged("failed to republish capabilities after replay error");
                Err(err)
            }
        }
    }
}

/// Commit each recorded mutation again with a fresh payload copy.
///
/// Returns the redo callbacks, queued in commit order, to run once every
/// commit has applied.
fn replay_commits<'a, I>(
    store: &dyn Store,
    namespace: &Namespace,
    commits: I,
) -> Result<ActionPipeline>
where
    I: IntoIterator<Item = &'a Commit>,
{
    let mut callbacks = ActionPipeline::new();
    for commit in commits {
        let payload = commit.payload.snapshot();
        store.commit(&commit.mutation_type, payload.clone())?;
        let action = commit.redo_callback().map(|name| namespace.qualify(name));
        callbacks.push(ActionCall::new(action, payload));
    }
    Ok(callbacks)
}
