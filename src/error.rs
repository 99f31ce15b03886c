// src/error.rs
//! Application error types with structured error handling.
//!
//! Each stage of the pipeline owns one variant of [`AppError`], so a caller
//! can tell from the variant alone whether configuration, the database
//! connection, the Twitter API, the transform query or the write failed.
//! Collaborator errors are wrapped, never flattened, so the original cause
//! stays reachable through `source()`.

use crate::types::WriteMethod;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration for {field}: {message}")]
    Configuration { field: &'static str, message: String },

    #[error("Failed to connect to database: {0}")]
    Connection(#[source] StoreError),

    #[error("Twitter API request failed: {0}")]
    Upstream(#[from] TwitterError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Write operation {method} failed: {source}")]
    Write {
        method: WriteMethod,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Builds a configuration error for the named option.
    pub fn configuration(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Configuration {
            field,
            message: message.into(),
        }
    }

    /// Short, stable name of the failing stage (used in logs and CLI output).
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Configuration { .. } => "configuration",
            AppError::Connection(_) => "connection",
            AppError::Upstream(_) => "upstream",
            AppError::Transform(_) => "transform",
            AppError::Write { .. } => "write",
        }
    }
}

/// Failures reported by the Twitter API collaborator.
#[derive(Error, Debug)]
pub enum TwitterError {
    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// OAuth signature generation failed
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Twitter answered with a non-success status
    #[error("Twitter API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The stream delivered something that could not be decoded
    #[error("Stream error: {0}")]
    Stream(String),

    /// The client is missing something it needs to authenticate or build URLs
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TwitterError {
    /// HTTP status reported by Twitter, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Failures reported by the database collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("MongoDB driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("Failed to encode payload as BSON: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("Payload rejected by {method}: {reason}")]
    InvalidPayload { method: WriteMethod, reason: String },

    #[error("Invalid options for {method}: {source}")]
    Options {
        method: WriteMethod,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid connect options: {0}")]
    ConnectOptions(#[source] serde_json::Error),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// A transform query failed to compile or to evaluate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transform query '{query}' failed: {message}")]
pub struct TransformError {
    pub query: String,
    pub message: String,
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
