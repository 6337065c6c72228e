//! Mutation-bus listener that appends commits to history.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::registry::ConfigRegistry;
use crate::store::{MutationListener, Store};
use crate::types::Commit;

/// Records eligible mutations onto their namespace's `done` stack.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    registry: Arc<ConfigRegistry>,
}

impl HistoryRecorder {
    /// Create a recorder writing into the given registry.
    pub fn new(registry: Arc<ConfigRegistry>) -> Self {
        Self { registry }
    }
}

impl MutationListener for HistoryRecorder {
    fn on_mutation(&self, store: &dyn Store, mutation: &Commit) -> Result<()> {
        let namespace = mutation.namespace();
        let Some(config) = self.registry.get(&namespace) else {
            trace!(mutation = %mutation.mutation_type, "Unmanaged namespace");
            return Ok(());
        };

        if !config.should_record(&mutation.mutation_type) {
            trace!(
                namespace = %namespace,
                mutation = %mutation.mutation_type,
                state = %config.state(),
                "Mutation not recorded"
            );
            return Ok(());
        }

        let Some(updated) = self
            .registry
            .update(&namespace, |config| config.with_recorded(mutation.clone()))
        else {
            return Ok(());
        };

        debug!(
            namespace = %namespace,
            mutation = %mutation.mutation_type,
            done = updated.done().len(),
            "Mutation recorded"
        );

        Capabilities::of(&updated).publish(store, &namespace)
    }
}
