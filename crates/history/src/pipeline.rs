//! Strictly sequential execution of follow-up actions.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::Result;
use crate::store::Store;
use crate::types::Payload;

/// One queued dispatch. An absent or empty action is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    /// Fully-qualified action name.
    pub action: Option<String>,
    /// Payload handed to the action.
    pub payload: Payload,
}

impl ActionCall {
    /// Create a new queued call.
    pub fn new(action: Option<String>, payload: Payload) -> Self {
        Self { action, payload }
    }

    fn runnable(&self) -> Option<&str> {
        self.action.as_deref().filter(|name| !name.is_empty())
    }
}

/// Ordered queue of actions, drained one at a time.
///
/// Each dispatch is awaited before the next one starts, so callbacks that
/// yield never interleave. The first failure stops the pipeline and the
/// rest of the queue is dropped.
#[derive(Debug, Clone, Default)]
pub struct ActionPipeline {
    queue: VecDeque<ActionCall>,
}

impl ActionPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call to the end of the queue.
    pub fn push(&mut self, call: ActionCall) {
        self.queue.push_back(call);
    }

    /// Number of queued entries, including ones that will be skipped.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Dispatch every runnable entry in order.
    ///
    /// Returns the number of actions dispatched.
    ///
    /// # Errors
    ///
    /// Returns the first dispatch error; later entries are not run.
    pub async fn run(mut self, store: &dyn Store) -> Result<usize> {
        let mut executed = 0;
        while let Some(call) = self.queue.pop_front() {
            let Some(action) = call.runnable() else {
                continue;
            };
            trace!(action = %action, pending = self.queue.len(), "Dispatching queued action");
            store.dispatch(action, call.payload.clone()).await?;
            executed += 1;
        }
        Ok(executed)
    }
}

impl FromIterator<ActionCall> for ActionPipeline {
    fn from_iter<I: IntoIterator<Item = ActionCall>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}

impl Extend<ActionCall> for ActionPipeline {
    fn extend<I: IntoIterator<Item = ActionCall>>(&mut self, iter: I) {
        self.queue.extend(iter);
    }
}
