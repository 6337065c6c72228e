//! Result type definition and extension traits for Railway-Oriented Programming.
//!
//! Provides combinators for Result types, enabling clean error handling
//! without unwrap/expect/panic.

use crate::error::Error;

/// The standard Result type for rewind core operations.
///
/// ```ignore
/// fn load() -> Result<String> {
///     let text = read_file(path)?;
///     Ok(text)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for any Result type.
///
/// Provides tap-style combinators for side effects such as logging.
pub trait GenericResultExt<T, E> {
    /// Perform a side effect on Ok value without consuming the Result.
    fn tap_ok<F: FnOnce(&T)>(self, f: F) -> Self;

    /// Perform a side effect on Err value without consuming the Result.
    fn tap_err<F: FnOnce(&E)>(self, f: F) -> Self;

    /// Convert to an Option, logging the error at `warn` with the given context.
    fn ok_logged(self, context: &str) -> Option<T>
    where
        E: std::fmt::Display;
}

impl<T, E> GenericResultExt<T, E> for std::result::Result<T, E> {
    fn tap_ok<F: FnOnce(&T)>(self, f: F) -> Self {
        if let Ok(ref v) = self {
            f(v);
        }
        self
    }

    fn tap_err<F: FnOnce(&E)>(self, f: F) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }

    fn ok_logged(self, context: &str) -> Option<T>
    where
        E: std::fmt::Display,
    {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "{context}");
                None
            }
        }
    }
}
