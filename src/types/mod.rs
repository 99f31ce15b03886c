// src/types/mod.rs

use thiserror::Error;

mod domain_types;
mod methods;
mod structured;

pub use domain_types::*;
pub use methods::*;
pub use structured::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid API path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Unknown request method '{0}' (expected get, post, delete or stream)")]
    UnknownRequestMethod(String),

    #[error("Unknown write method '{0}' (expected insertOne or insertMany)")]
    UnknownWriteMethod(String),

    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },
}
