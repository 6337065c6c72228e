//! Namespaced undo/redo for mutation-based state stores.
//!
//! The engine attaches to a store organized into modules. Every committed
//! mutation is recorded onto its module's history; undo resets the module
//! and replays what is left, redo re-commits what was undone.
//!
//! - **Action groups**: commits sharing an `actionGroup` payload field
//!   undo and redo as one unit.
//! - **Callbacks**: `undoCallback` / `redoCallback` name actions that run,
//!   strictly one after another, around a replay.
//! - **Capability flags**: `canUndo` / `canRedo` are republished through
//!   the module's `updateCanUndoRedo` mutation after every change.
//!
//! # Example
//!
//! ```ignore
//! use rewind_history::{
//!     HistoryOptions, MemoryStore, Module, PathOptions, Payload, Store, UndoRedoEngine,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> rewind_history::Result<()> {
//!     let store = MemoryStore::builder()
//!         .module(
//!             Module::new("doc")
//!                 .with_state(json!({"text": ""}))
//!                 .mutation("write", |state, payload| {
//!                     state["text"] = payload.value().clone();
//!                     Ok(())
//!                 })
//!                 .scaffold()
//!                 .resettable(),
//!         )
//!         .build()?;
//!
//!     let options = HistoryOptions::default().with_path(PathOptions::new("doc"));
//!     let _engine = UndoRedoEngine::attach(&options, &store)?;
//!
//!     store.commit("doc/write", Payload::new(json!("hello")))?;
//!     store.dispatch("doc/undo", Payload::empty()).await?;
//!     assert_eq!(store.state()["doc"]["text"], json!(""));
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod capabilities;
pub mod config;
pub mod engine;
pub mod error;
pub mod interceptor;
pub mod memory;
pub mod path_config;
pub mod pipeline;
pub mod recorder;
pub mod registry;
pub mod store;
pub mod types;

// Re-export main types
pub use capabilities::{CAN_REDO, CAN_UNDO, Capabilities};
pub use config::{HistoryOptions, PathOptions};
pub use engine::{HistorySnapshot, UndoRedoEngine};
pub use error::{Error, Result};
pub use interceptor::ActionInterceptor;
pub use memory::{MemoryStore, Module, MutationFn, StoreBuilder, object_mut};
pub use path_config::{GroupSplit, PathConfig, ReplayState};
pub use pipeline::{ActionCall, ActionPipeline};
pub use recorder::HistoryRecorder;
pub use registry::ConfigRegistry;
pub use store::{
    ActionHandler, ActionListener, AsyncFnAction, FailingAction, FnAction, MutationListener,
    NoOpAction, Store, StoreHooks,
};
pub use types::{
    ACTION_GROUP, Commit, DispatchedAction, Namespace, Payload, REDO_CALLBACK, ReservedAction,
    ReservedMutation, UNDO_CALLBACK,
};
