//! Host store traits and action handler implementations.
//!
//! The engine never owns the store. Every listener and engine call
//! receives it as `&dyn Store`, the same way the store hands itself to
//! its subscribers.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{Commit, DispatchedAction, Payload};

/// The three collaborators the engine needs from a host store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Apply a named mutation synchronously.
    ///
    /// Mutation listeners are notified after the change has applied.
    ///
    /// # Errors
    ///
    /// Returns `MutationNotFound` for unknown names, or the handler's error.
    fn commit(&self, mutation_type: &str, payload: Payload) -> Result<()>;

    /// Run a named action and resolve when it has completed.
    ///
    /// # Errors
    ///
    /// Returns `ActionNotFound` for unknown names, or the handler's error.
    async fn dispatch(&self, action_type: &str, payload: Payload) -> Result<()>;

    /// Check if a fully-qualified mutation is registered.
    fn has_mutation(&self, mutation_type: &str) -> bool;
}

/// Subscription hooks, used once when the engine attaches.
pub trait StoreHooks {
    /// Register a listener on the mutation bus.
    fn subscribe(&self, listener: Arc<dyn MutationListener>);

    /// Register a listener that sees every action before its handler runs.
    fn subscribe_action(&self, listener: Arc<dyn ActionListener>);
}

/// Notified synchronously after every committed mutation.
pub trait MutationListener: Send + Sync {
    /// Handle a committed mutation.
    ///
    /// # Errors
    ///
    /// Errors propagate out of the store's `commit`.
    fn on_mutation(&self, store: &dyn Store, mutation: &Commit) -> Result<()>;
}

/// Awaited before a dispatched action's handler runs.
#[async_trait]
pub trait ActionListener: Send + Sync {
    /// Handle a dispatched action.
    ///
    /// # Errors
    ///
    /// Errors propagate out of the store's `dispatch`; the handler does not run.
    async fn on_action(&self, store: &dyn Store, action: &DispatchedAction) -> Result<()>;
}

/// Trait for action handlers registered in a store.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the action.
    ///
    /// # Errors
    ///
    /// Returns error if the action fails.
    async fn call(&self, store: &dyn Store, payload: &Payload) -> Result<()>;

    /// Get the handler name (for logging/debugging).
    fn name(&self) -> &str;
}

/// An action that does nothing; `undo` and `redo` are registered as these.
pub struct NoOpAction {
    name: String,
}

impl NoOpAction {
    /// Create a new no-op action with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ActionHandler for NoOpAction {
    async fn call(&self, _store: &dyn Store, _payload: &Payload) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An action that always fails (for testing).
pub struct FailingAction {
    name: String,
    error_message: String,
}

impl FailingAction {
    /// Create a new failing action.
    pub fn new(name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error_message: error_message.into(),
        }
    }
}

#[async_trait]
impl ActionHandler for FailingAction {
    async fn call(&self, _store: &dyn Store, _payload: &Payload) -> Result<()> {
        Err(Error::action_failed(&self.name, &self.error_message))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An action that runs a closure with access to the store.
pub struct FnAction<F>
where
    F: Fn(&dyn Store, &Payload) -> Result<()> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn(&dyn Store, &Payload) -> Result<()> + Send + Sync,
{
    /// Create a new function action.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> ActionHandler for FnAction<F>
where
    F: Fn(&dyn Store, &Payload) -> Result<()> + Send + Sync,
{
    async fn call(&self, store: &dyn Store, payload: &Payload) -> Result<()> {
        (self.func)(store, payload)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An action that delegates to an async function.
pub struct AsyncFnAction<F, Fut>
where
    F: Fn(Payload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    name: String,
    func: F,
}

impl<F, Fut> AsyncFnAction<F, Fut>
where
    F: Fn(Payload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    /// Create a new async function action.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> ActionHandler for AsyncFnAction<F, Fut>
where
    F: Fn(Payload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn call(&self, _store: &dyn Store, payload: &Payload) -> Result<()> {
        (self.func)(payload.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
