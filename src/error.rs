//! Error types for the offer library.

use thiserror::Error;

/// Errors raised by the offer store, CSV codec and validation.
#[derive(Error, Debug)]
pub enum OfferError {
    /// No offer with the given id exists.
    #[error("offer not found: {0}")]
    NotFound(String),

    /// Input rejected before it reached the store.
    #[error("invalid offer: {0}")]
    Validation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl OfferError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type alias for offer operations.
pub type Result<T> = std::result::Result<T, OfferError>;
