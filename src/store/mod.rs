// src/store/mod.rs
//! Document storage: connecting to a collection and writing payloads to it.
//!
//! The pipeline only sees [`StoreConnector`] and [`DocumentCollection`];
//! pooling, wire protocol and durability belong to the implementation.

pub mod mongo;

use crate::config::DatabaseSettings;
use crate::error::StoreError;
use crate::types::WriteMethod;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The ability to obtain a collection handle from connection settings.
#[async_trait::async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(
        &self,
        settings: &DatabaseSettings,
    ) -> Result<Arc<dyn DocumentCollection>, StoreError>;
}

/// A connected collection accepting named write operations.
#[async_trait::async_trait]
pub trait DocumentCollection: Send + Sync {
    fn database_name(&self) -> &str;

    fn collection_name(&self) -> &str;

    /// Runs `method` with `payload`. `options` is the method's option object
    /// or `null`.
    async fn write(
        &self,
        method: WriteMethod,
        payload: &Value,
        options: &Value,
    ) -> Result<WriteResult, StoreError>;
}

/// Driver-defined outcome of a write, forwarded to the caller untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WriteResult(Value);

impl WriteResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Display for WriteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub use mongo::MongoConnector;
