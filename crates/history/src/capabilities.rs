//! Capability flags published into presentation state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::path_config::PathConfig;
use crate::store::Store;
use crate::types::{Namespace, Payload, ReservedMutation};

/// State field holding the undo flag.
pub const CAN_UNDO: &str = "canUndo";
/// State field holding the redo flag.
pub const CAN_REDO: &str = "canRedo";

/// Whether undo and redo are currently possible for a namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_undo: bool,
    pub can_redo: bool,
}

impl Capabilities {
    /// Derive the flags from a history.
    pub fn of(config: &PathConfig) -> Self {
        Self {
            can_undo: config.can_undo(),
            can_redo: config.can_redo(),
        }
    }

    /// Payload for the status mutation.
    pub fn payload(self) -> Payload {
        Payload::empty()
            .with_field(CAN_UNDO, Value::Bool(self.can_undo))
            .with_field(CAN_REDO, Value::Bool(self.can_redo))
    }

    /// Commit the flags through the namespace's status mutation.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the status mutation.
    pub fn publish(self, store: &dyn Store, namespace: &Namespace) -> Result<()> {
        store.commit(
            &ReservedMutation::StatusUpdate.qualified(namespace),
            self.payload(),
        )
    }
}
