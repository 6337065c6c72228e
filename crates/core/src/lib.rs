//! Core types, errors, and utilities for rewind.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod files;
pub mod result;

pub use error::Error;
pub use files::{parse_json, parse_toml, read_config};
pub use result::{GenericResultExt, Result};
