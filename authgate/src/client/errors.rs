use thiserror::Error;

use crate::utils::UtilError;

/// Failures surfaced by an [`AuthClient`](super::AuthClient) operation.
///
/// `Rejected` is the expected, value-level failure: the backend answered and
/// said no. Everything else is transport- or programmer-level and callers
/// treat it as unexpected.
#[derive(Debug, Error, Clone)]
pub enum AuthClientError {
    /// Backend explicitly rejected the request. The message is the backend's
    /// own wording when it provided one, empty otherwise.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        error_code: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("No authorization request is pending")]
    MissingPkceVerifier,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Error from session storage operations
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl AuthClientError {
    /// Message to show for this failure when the caller has a fixed fallback
    /// for rejections that carried no wording.
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("Io error: {0}")]
    Io(String),

    #[error("Serde error: {0}")]
    Serde(String),
}
