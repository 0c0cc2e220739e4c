//! Typed error hierarchy for the Refer & Earn client.
//!
//! Two top-level enums cover the two layers:
//! - `BackendError`: one call to the referral backend failed
//! - `FlowError`: a popup operation was refused or its backend call failed

use thiserror::Error;

use crate::backend::Endpoint;
use crate::validate::FieldErrors;

/// Errors from a single call to the referral backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: Endpoint, status: u16 },

    #[error("Failed to read response from {endpoint}: {source}")]
    Body {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} is unavailable: {message}")]
    Unavailable { endpoint: Endpoint, message: String },
}

impl BackendError {
    /// The endpoint the failed call targeted, when known.
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            BackendError::ClientBuild(_) => None,
            BackendError::Transport { endpoint, .. }
            | BackendError::Status { endpoint, .. }
            | BackendError::Body { endpoint, .. }
            | BackendError::Unavailable { endpoint, .. } => Some(*endpoint),
        }
    }
}

/// Errors from a popup operation (`request_code`, `verify_code`, `submit`).
///
/// Only `Backend` means a request actually left the client; every other
/// variant is decided locally.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error("Cannot {action} while {stage}")]
    InvalidState {
        action: &'static str,
        stage: &'static str,
    },

    #[error("A request to {0} is already in flight")]
    Busy(Endpoint),

    #[error("The referral popup is closed")]
    PopupClosed,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl FlowError {
    /// Per-field messages when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            FlowError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, FlowError::Backend(_))
    }
}

impl From<FieldErrors> for FlowError {
    fn from(errors: FieldErrors) -> Self {
        FlowError::Validation(errors)
    }
}
