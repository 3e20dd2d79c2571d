//! Remote creation error types.

use super::credential::CredentialProblem;
use thiserror::Error;

/// Errors for a single battle creation. These are collected per slot and
/// never abort the rest of a batch.
#[derive(Debug, Error)]
pub enum CreationError {
    /// Credential rejected locally, no request was sent
    #[error("Invalid API credential: {0}")]
    InvalidCredential(#[from] CredentialProblem),

    /// Transport level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("Remote request failed with status {status}: {body}")]
    RemoteRequestFailed { status: u16, body: String },

    /// Success status but the body could not be understood
    #[error("Invalid response from remote: {0}")]
    InvalidResponse(String),
}

/// Result type for creation operations
pub type CreationResult<T> = Result<T, CreationError>;
