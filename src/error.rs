//! Error types for the gdoc2doc crate.

use thiserror::Error;

/// Errors that can occur while listing, matching, or exporting documents.
#[derive(Error, Debug)]
pub enum GdocError {
    #[error("{name} not set\n\n{hint}")]
    MissingEnvVar { name: String, hint: String },

    #[error("Failed to parse token data: {0}")]
    TokenParse(#[source] serde_json::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to serialize completion request: {0}")]
    RequestSerialization(#[source] serde_json::Error),

    #[error("Failed to parse completion response: {0}")]
    ResponseParse(#[source] serde_json::Error),

    #[error("Completion API error: {0}")]
    MatcherApi(String),

    #[error("No response from AI model")]
    NoCompletion,

    #[error("Unsupported format '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

/// Result type alias for GdocError.
pub type Result<T> = std::result::Result<T, GdocError>;
