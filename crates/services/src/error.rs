//! Shared error types for the services crate.

use thiserror::Error;

use practice_core::PracticeError;

/// Errors emitted by the upstream API client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {status}{}", message_suffix(.message))]
    HttpStatus {
        status: reqwest::StatusCode,
        message: Option<String>,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("authentication expired")]
    AuthExpired,
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl ApiError {
    /// Taxonomy value for a failed answer submission.
    #[must_use]
    pub fn to_submission_error(&self) -> PracticeError {
        match self {
            ApiError::AuthExpired => PracticeError::AuthExpired,
            other => PracticeError::SubmissionFailed(other.to_string()),
        }
    }

    /// Taxonomy value for a failed question fetch or generation.
    #[must_use]
    pub fn to_fetch_error(&self) -> PracticeError {
        match self {
            ApiError::AuthExpired => PracticeError::AuthExpired,
            other => PracticeError::FetchFailed(other.to_string()),
        }
    }
}

/// Errors emitted by the credential session and its stores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("credential store failed: {0}")]
    Store(String),
    #[error("credential state lock poisoned")]
    Poisoned,
}
