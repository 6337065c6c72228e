//! Error types for the history crate.

use thiserror::Error;

/// Result type alias for history operations.
pub type Result<T> = std::result::Result<T, Error>;

/// History error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Config file could not be read or parsed.
    #[error(transparent)]
    Core(#[from] rewind_core::Error),

    /// History options are inconsistent.
    #[error("invalid history config: {reason}")]
    InvalidConfig { reason: String },

    /// Commit named a mutation the store does not know.
    #[error("mutation '{mutation}' is not registered")]
    MutationNotFound { mutation: String },

    /// Dispatch named an action the store does not know.
    #[error("action '{action}' is not registered")]
    ActionNotFound { action: String },

    /// A mutation handler rejected its payload.
    #[error("mutation '{mutation}' failed: {reason}")]
    MutationFailed { mutation: String, reason: String },

    /// An action handler failed.
    #[error("action '{action}' failed: {reason}")]
    ActionFailed { action: String, reason: String },
}

impl Error {
    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a mutation not found error.
    pub fn mutation_not_found(mutation: impl Into<String>) -> Self {
        Self::MutationNotFound {
            mutation: mutation.into(),
        }
    }

    /// Create an action not found error.
    pub fn action_not_found(action: impl Into<String>) -> Self {
        Self::ActionNotFound {
            action: action.into(),
        }
    }

    /// Create a mutation failed error.
    pub fn mutation_failed(mutation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MutationFailed {
            mutation: mutation.into(),
            reason: reason.into(),
        }
    }

    /// Create an action failed error.
    pub fn action_failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionFailed {
            action: action.into(),
            reason: reason.into(),
        }
    }
}
