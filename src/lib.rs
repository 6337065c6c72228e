#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # rewind
//!
//! Namespaced undo/redo for mutation-based state stores.
//!
//! This library re-exports the workspace crates and hosts the CLI's
//! command handlers and scripted sessions.

pub use rewind_core;
pub use rewind_history;

pub mod cli;
pub mod commands;
pub mod script;
