//! Error types for the moderation module.

use thiserror::Error;

/// Errors from an image-safety classifier.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// Classifier is not configured.
    #[error("Classifier not configured: {0}")]
    NotConfigured(String),

    /// Network failure talking to the classifier.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Classifier returned an error response.
    #[error("Classifier error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Classifier response could not be understood.
    #[error("Failed to parse classifier response: {0}")]
    ParseError(String),

    /// Image could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
