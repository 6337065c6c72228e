//! Dispatcher listener turning the reserved actions into engine calls.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::engine::UndoRedoEngine;
use crate::error::Result;
use crate::store::{ActionListener, Store};
use crate::types::{DispatchedAction, ReservedAction};

/// Runs `undo`/`redo` when `<ns>undo` or `<ns>redo` is dispatched.
///
/// The engine call completes before the store runs the (no-op) action
/// handler, so awaiting the dispatch awaits the whole replay.
#[derive(Debug, Clone)]
pub struct ActionInterceptor {
    engine: Arc<UndoRedoEngine>,
}

impl ActionInterceptor {
    /// Create an interceptor driving the given engine.
    pub fn new(engine: Arc<UndoRedoEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ActionListener for ActionInterceptor {
    async fn on_action(&self, store: &dyn Store, action: &DispatchedAction) -> Result<()> {
        let Some((namespace, kind)) = ReservedAction::parse(&action.action_type) else {
            return Ok(());
        };

        match kind {
            ReservedAction::Undo if self.engine.can_undo(&namespace) => {
                self.engine.undo(store, &namespace).await
            }
            ReservedAction::Redo if self.engine.can_redo(&namespace) => {
                self.engine.redo(store, &namespace).await
            }
            _ => {
                debug!(namespace = %namespace, action = %kind, "Nothing to replay");
                Ok(())
            }
        }
    }
}
