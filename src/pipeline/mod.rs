// src/pipeline/mod.rs
//! The request → transform → persist pipeline.
//!
//! Both modes share the same per-payload stages (transform, check, write);
//! they differ only in where payloads come from and how results are
//! delivered.
//!
//! Ordering: the database is connected before the API is called, so a
//! connection failure never costs an API request. The check predicate gates
//! persistence only.

mod result;
mod stream;

pub use result::{ApiOutcome, DatabaseOutcome, PipelineResult, StreamApiOutcome, StreamRecord};
pub use stream::{PipelineStream, StreamControl, StreamEvent};

use crate::api::{TwitterApi, TwitterHttpClient};
use crate::config::{DatabaseSettings, PipelineConfig, PipelineOptions};
use crate::error::AppError;
use crate::store::{DocumentCollection, MongoConnector, StoreConnector, WriteResult};
use serde_json::Value;
use std::sync::Arc;

/// What [`Pipeline::execute`] produced, depending on the request method.
#[derive(Debug)]
pub enum PipelineOutput {
    Completed(PipelineResult),
    Streaming(PipelineStream),
}

/// Orchestrates one API collaborator and one storage collaborator.
#[derive(Clone)]
pub struct Pipeline {
    api: Arc<dyn TwitterApi>,
    store: Arc<dyn StoreConnector>,
}

impl Pipeline {
    pub fn new(api: Arc<dyn TwitterApi>, store: Arc<dyn StoreConnector>) -> Self {
        Self { api, store }
    }

    /// Builds the production pipeline: Twitter over HTTP, MongoDB for storage.
    pub fn for_config(config: &PipelineConfig) -> Result<Self, AppError> {
        let api = TwitterHttpClient::new(&config.api)?;
        Ok(Self::new(Arc::new(api), Arc::new(MongoConnector::new())))
    }

    /// Runs one-shot or streaming mode according to `config.api.method`.
    pub async fn execute(&self, config: PipelineConfig) -> Result<PipelineOutput, AppError> {
        if config.api.method.is_stream() {
            Ok(PipelineOutput::Streaming(self.stream(config).await?))
        } else {
            Ok(PipelineOutput::Completed(self.run(&config).await?))
        }
    }

    /// One-shot mode: connect, request, transform, check, write.
    pub async fn run(&self, config: &PipelineConfig) -> Result<PipelineResult, AppError> {
        let settings = &config.api;
        if settings.method.is_stream() {
            return Err(AppError::configuration(
                "api.method",
                "stream requests must be started with Pipeline::stream",
            ));
        }

        let collection = self.connect(&config.database).await?;

        log::info!("Requesting {} {}", settings.method, settings.path);
        let raw = self
            .api
            .request(settings.method, &settings.path, &settings.parameters)
            .await?;

        let (payload, write_result) = process_payload(collection.as_ref(), config, raw).await?;

        Ok(PipelineResult {
            api: ApiOutcome {
                client: Arc::clone(&self.api),
                payload,
            },
            database: DatabaseOutcome {
                collection,
                write_result,
            },
        })
    }

    /// Streaming mode: connect, then return a live handle without waiting
    /// for the first event.
    pub async fn stream(&self, config: PipelineConfig) -> Result<PipelineStream, AppError> {
        if !config.api.method.is_stream() {
            return Err(AppError::configuration(
                "api.method",
                format!(
                    "'{}' is a single request; use Pipeline::run",
                    config.api.method
                ),
            ));
        }

        let collection = self.connect(&config.database).await?;
        Ok(PipelineStream::spawn(
            Arc::clone(&self.api),
            collection,
            config,
        ))
    }

    async fn connect(
        &self,
        settings: &DatabaseSettings,
    ) -> Result<Arc<dyn DocumentCollection>, AppError> {
        log::info!(
            "Connecting to {} ({}.{})",
            settings.connection_string,
            settings.database_name,
            settings.collection_name
        );
        self.store.connect(settings).await.map_err(|e| {
            log::error!("Database connection failed: {}", e);
            AppError::Connection(e)
        })
    }
}

/// Applies the transform and the check, then writes if allowed.
///
/// Returns the payload that was considered for persistence and the write
/// result, which is `None` when the check declined the payload.
pub(crate) async fn process_payload(
    collection: &dyn DocumentCollection,
    config: &PipelineConfig,
    raw: Value,
) -> Result<(Value, Option<WriteResult>), AppError> {
    let payload = match &config.transform {
        Some(query) => query.apply(&raw)?,
        None => raw,
    };

    let settings = &config.database;
    if let Some(check) = &settings.check {
        if !check.allows(&payload) {
            log::info!("Check declined payload; skipping {}", settings.write_method);
            return Ok((payload, None));
        }
    }

    let write_result = collection
        .write(settings.write_method, &payload, &settings.write_options)
        .await
        .map_err(|source| AppError::Write {
            method: settings.write_method,
            source,
        })?;
    log::debug!("{} returned {}", settings.write_method, write_result);

    Ok((payload, Some(write_result)))
}

/// Resolves `options` from the process environment and runs the production
/// pipeline.
pub async fn twitter2mongodb(options: PipelineOptions) -> Result<PipelineOutput, AppError> {
    let config = PipelineConfig::resolve(options)?;
    let pipeline = Pipeline::for_config(&config)?;
    pipeline.execute(config).await
}
