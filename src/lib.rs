// src/lib.rs
//! twitter2mongodb library: pulls data from the Twitter API and stores it in
//! MongoDB, either from a single request or continuously from a stream.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `TwitterError`, `StoreError`, `TransformError`
//! - **Configuration**: `PipelineOptions`, `PipelineConfig`, `PayloadCheck`, `EventCallback`
//! - **Pipeline**: `Pipeline`, `PipelineOutput`, `PipelineStream`, result descriptors
//! - **Collaborators**: `TwitterApi`, `StoreConnector`, `DocumentCollection`

pub mod api;
mod config;
pub mod constants;
mod error;
mod pipeline;
pub mod store;
mod transform;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, Result, StoreError, TransformError, TwitterError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    ApiOptions, ApiSettings, CommandLineInput, ConnectionString, CredentialOptions,
    DatabaseOptions, DatabaseSettings, EventCallback, PayloadCheck, PipelineConfig,
    PipelineOptions,
};

// --- Domain Types ---
pub use crate::types::{
    ApiPath, BaseUrl, Credentials, RequestMethod, ResourceName, StructuredValue, WriteMethod,
};

// --- Collaborators ---
pub use crate::api::{TweetStream, TwitterApi, TwitterHttpClient};
pub use crate::store::{DocumentCollection, MongoConnector, StoreConnector, WriteResult};
pub use crate::transform::TransformQuery;

// --- Pipeline ---
pub use crate::pipeline::{
    twitter2mongodb, ApiOutcome, DatabaseOutcome, Pipeline, PipelineOutput, PipelineResult,
    PipelineStream, StreamApiOutcome, StreamControl, StreamEvent, StreamRecord,
};
