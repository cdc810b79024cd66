use thiserror::Error;

use crate::client::AuthClientError;

/// Errors a sign-in orchestrator surfaces to the UI. `Validation` and
/// `Backend` messages are shown to the user as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Required configuration is absent. `keys` holds the missing variable
    /// names in declared order; nothing was sent to the backend.
    #[error("missing configuration: {}", .keys.join(", "))]
    MissingConfig { keys: Vec<&'static str> },

    /// Local input failed validation; nothing was sent to the backend.
    #[error("{0}")]
    Validation(String),

    /// The backend or SDK rejected the attempt. The message is theirs when
    /// they provided one, else a fixed per-operation fallback.
    #[error("{0}")]
    Backend(String),

    /// Transport or contract failure, `<operation> failed: <cause>`.
    #[error("{0}")]
    Unexpected(String),

    /// Another attempt on this flow instance is still in flight.
    #[error("another sign-in attempt is already in progress")]
    AttemptInProgress,
}

impl FlowError {
    /// Map an adapter error at the orchestrator boundary: a rejection
    /// surfaces its message (or `fallback` when the body carried none),
    /// anything else becomes [`FlowError::Unexpected`] under `prefix`.
    pub(crate) fn from_backend(error: AuthClientError, fallback: &str, prefix: &str) -> Self {
        match &error {
            AuthClientError::Rejected { .. } => {
                Self::Backend(error.rejection_message().unwrap_or(fallback).to_string())
            }
            _ => Self::Unexpected(format!("{prefix}{error}")),
        }
    }
}
