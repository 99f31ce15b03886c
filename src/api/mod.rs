// src/api/mod.rs
//! Twitter API interaction: single requests and continuous streams.
//!
//! The pipeline depends on the [`TwitterApi`] trait, never on HTTP details,
//! so the orchestration can be exercised without a network.

pub mod client;
pub mod oauth;
pub mod stream;

use crate::error::TwitterError;
use crate::types::{ApiPath, RequestMethod};
use futures::stream::BoxStream;
use serde_json::{Map, Value};

/// Decoded documents (or errors) arriving on an open stream.
pub type TweetStream = BoxStream<'static, Result<Value, TwitterError>>;

/// The ability to call the Twitter API.
#[async_trait::async_trait]
pub trait TwitterApi: Send + Sync {
    /// Performs one REST request and returns its JSON payload.
    async fn request(
        &self,
        method: RequestMethod,
        path: &ApiPath,
        params: &Map<String, Value>,
    ) -> Result<Value, TwitterError>;

    /// Opens a streaming endpoint. The connection lives as long as the
    /// returned stream; dropping it disconnects.
    async fn stream(
        &self,
        path: &ApiPath,
        params: &Map<String, Value>,
    ) -> Result<TweetStream, TwitterError>;
}

/// Flattens JSON parameters into the string pairs Twitter expects.
///
/// Strings pass through, numbers and booleans are rendered, arrays are
/// joined with commas (`track=a,b`), nulls are dropped and nested objects
/// are sent as JSON text.
pub fn flatten_parameters(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => Some(value.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

pub use client::TwitterHttpClient;
