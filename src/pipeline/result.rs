// src/pipeline/result.rs
//! Result descriptors handed back to the caller.

use super::stream::StreamControl;
use crate::api::TwitterApi;
use crate::store::{DocumentCollection, WriteResult};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// API side of a one-shot result: the client used and the payload considered
/// for persistence (after any transform).
#[derive(Clone)]
pub struct ApiOutcome {
    pub client: Arc<dyn TwitterApi>,
    pub payload: Value,
}

/// API side of a stream record: the live stream's control handle and this
/// event's payload (after any transform).
#[derive(Clone, Debug)]
pub struct StreamApiOutcome {
    pub stream: StreamControl,
    pub payload: Value,
}

/// Database side of a result.
///
/// `write_result` is `None` when the check predicate skipped persistence.
#[derive(Clone)]
pub struct DatabaseOutcome {
    pub collection: Arc<dyn DocumentCollection>,
    pub write_result: Option<WriteResult>,
}

impl DatabaseOutcome {
    pub fn database_name(&self) -> &str {
        self.collection.database_name()
    }

    pub fn collection_name(&self) -> &str {
        self.collection.collection_name()
    }

    /// Whether the payload was actually written.
    pub fn was_written(&self) -> bool {
        self.write_result.is_some()
    }

    fn summary(&self) -> Value {
        json!({
            "database": self.database_name(),
            "collection": self.collection_name(),
            "writeResult": self.write_result.as_ref().map(WriteResult::as_value),
        })
    }
}

/// Outcome of a one-shot pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineResult {
    pub api: ApiOutcome,
    pub database: DatabaseOutcome,
}

impl PipelineResult {
    /// JSON view without the live handles, for printing.
    pub fn summary(&self) -> Value {
        json!({
            "api": { "payload": self.api.payload },
            "database": self.database.summary(),
        })
    }
}

/// Outcome of one streamed event.
#[derive(Clone, Debug)]
pub struct StreamRecord {
    pub api: StreamApiOutcome,
    pub database: DatabaseOutcome,
}

impl StreamRecord {
    /// JSON view without the live handles, for printing.
    pub fn summary(&self) -> Value {
        json!({
            "api": { "payload": self.api.payload },
            "database": self.database.summary(),
        })
    }
}

impl fmt::Debug for ApiOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiOutcome")
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for DatabaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseOutcome")
            .field("database", &self.database_name())
            .field("collection", &self.collection_name())
            .field("write_result", &self.write_result)
            .finish()
    }
}
