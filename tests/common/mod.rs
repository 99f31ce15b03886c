// tests/common/mod.rs
//! In-memory collaborators for exercising the pipeline without a network.

#![allow(dead_code)]

use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use twitter2mongodb::{
    ApiPath, DatabaseSettings, DocumentCollection, PipelineConfig, PipelineOptions,
    RequestMethod, StoreConnector, StoreError, TweetStream, TwitterApi, TwitterError, WriteMethod,
    WriteResult,
};

/// Resolves options against an empty environment.
pub fn resolve(options: PipelineOptions) -> PipelineConfig {
    PipelineConfig::resolve_with(options, |_| None).expect("options should resolve")
}

/// Scripted Twitter API.
#[derive(Default)]
pub struct FakeApi {
    payload: Value,
    events: Vec<Result<Value, String>>,
    fail_request: Option<u16>,
    fail_open: bool,
    pub requests: Mutex<Vec<(RequestMethod, String, Map<String, Value>)>>,
    pub streams_opened: AtomicUsize,
}

impl FakeApi {
    pub fn returning(payload: Value) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    /// A stream that yields `events` in order; `Err` entries become stream errors.
    pub fn streaming(events: Vec<Result<Value, String>>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_request: Some(status),
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TwitterApi for FakeApi {
    async fn request(
        &self,
        method: RequestMethod,
        path: &ApiPath,
        params: &Map<String, Value>,
    ) -> Result<Value, TwitterError> {
        self.requests
            .lock()
            .unwrap()
            .push((method, path.to_string(), params.clone()));
        match self.fail_request {
            Some(status) => Err(TwitterError::Api {
                status,
                message: "Rate limit exceeded".to_string(),
            }),
            None => Ok(self.payload.clone()),
        }
    }

    async fn stream(
        &self,
        _path: &ApiPath,
        _params: &Map<String, Value>,
    ) -> Result<TweetStream, TwitterError> {
        self.streams_opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(TwitterError::Api {
                status: 401,
                message: "Unauthorized".to_string(),
            });
        }
        let items: Vec<Result<Value, TwitterError>> = self
            .events
            .iter()
            .cloned()
            .map(|event| event.map_err(TwitterError::Stream))
            .collect();
        Ok(stream::iter(items).boxed())
    }
}

/// A stream that never yields and never ends, for stop tests.
pub struct PendingApi;

#[async_trait::async_trait]
impl TwitterApi for PendingApi {
    async fn request(
        &self,
        _method: RequestMethod,
        _path: &ApiPath,
        _params: &Map<String, Value>,
    ) -> Result<Value, TwitterError> {
        Ok(Value::Null)
    }

    async fn stream(
        &self,
        _path: &ApiPath,
        _params: &Map<String, Value>,
    ) -> Result<TweetStream, TwitterError> {
        Ok(stream::pending::<Result<Value, TwitterError>>().boxed())
    }
}

/// Records writes in memory.
#[derive(Default)]
pub struct FakeStore {
    refuse_connection: bool,
    reject_writes: bool,
    /// Per-payload write delay, keyed by the payload's `id` field.
    delays: HashMap<i64, Duration>,
    pub connects: AtomicUsize,
    pub writes: Arc<Mutex<Vec<(WriteMethod, Value)>>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_connection() -> Self {
        Self {
            refuse_connection: true,
            ..Self::default()
        }
    }

    pub fn rejecting_writes() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, id: i64, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    pub fn written(&self) -> Vec<(WriteMethod, Value)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StoreConnector for FakeStore {
    async fn connect(
        &self,
        settings: &DatabaseSettings,
    ) -> Result<Arc<dyn DocumentCollection>, StoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connection {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(Arc::new(FakeCollection {
            database_name: settings.database_name.to_string(),
            collection_name: settings.collection_name.to_string(),
            reject_writes: self.reject_writes,
            delays: self.delays.clone(),
            writes: Arc::clone(&self.writes),
        }))
    }
}

struct FakeCollection {
    database_name: String,
    collection_name: String,
    reject_writes: bool,
    delays: HashMap<i64, Duration>,
    writes: Arc<Mutex<Vec<(WriteMethod, Value)>>>,
}

#[async_trait::async_trait]
impl DocumentCollection for FakeCollection {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    async fn write(
        &self,
        method: WriteMethod,
        payload: &Value,
        _options: &Value,
    ) -> Result<WriteResult, StoreError> {
        let id = payload.get("id").and_then(Value::as_i64);
        if let Some(delay) = id.and_then(|id| self.delays.get(&id)) {
            tokio::time::sleep(*delay).await;
        }
        if self.reject_writes {
            return Err(StoreError::Rejected("duplicate key".to_string()));
        }
        self.writes.lock().unwrap().push((method, payload.clone()));
        Ok(WriteResult::new(serde_json::json!({ "acknowledged": true })))
    }
}
