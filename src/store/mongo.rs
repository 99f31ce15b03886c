// src/store/mongo.rs
//! MongoDB implementation of the storage traits.

use super::{DocumentCollection, StoreConnector, WriteResult};
use crate::config::DatabaseSettings;
use crate::error::StoreError;
use crate::types::WriteMethod;
use bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, InsertManyOptions, InsertOneOptions};
use mongodb::{Client, Collection};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Connects to MongoDB with the official driver.
#[derive(Debug, Default, Clone)]
pub struct MongoConnector;

impl MongoConnector {
    pub fn new() -> Self {
        Self
    }
}

/// Connect options understood on top of the connection string.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    pub app_name: Option<String>,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
    #[serde(rename = "connectTimeoutMS")]
    pub connect_timeout_ms: Option<u64>,
    #[serde(rename = "serverSelectionTimeoutMS")]
    pub server_selection_timeout_ms: Option<u64>,
    pub direct_connection: Option<bool>,
}

const KNOWN_CONNECT_OPTIONS: &[&str] = &[
    "appName",
    "maxPoolSize",
    "minPoolSize",
    "connectTimeoutMS",
    "serverSelectionTimeoutMS",
    "directConnection",
];

impl ConnectOptions {
    /// Reads the known keys from an options object; `null` means no options.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
    }

    /// Checks an options object up front, warning about keys that are ignored.
    pub fn validate(value: &Value) -> Result<(), serde_json::Error> {
        if let Value::Object(map) = value {
            for key in map.keys() {
                if !KNOWN_CONNECT_OPTIONS.contains(&key.as_str()) {
                    log::warn!("Ignoring unsupported MongoDB connect option '{}'", key);
                }
            }
        }
        Self::from_value(value).map(|_| ())
    }

    fn apply(self, options: &mut ClientOptions) {
        if let Some(app_name) = self.app_name {
            options.app_name = Some(app_name);
        }
        if let Some(size) = self.max_pool_size {
            options.max_pool_size = Some(size);
        }
        if let Some(size) = self.min_pool_size {
            options.min_pool_size = Some(size);
        }
        if let Some(ms) = self.connect_timeout_ms {
            options.connect_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.server_selection_timeout_ms {
            options.server_selection_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }
    }
}

#[async_trait::async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(
        &self,
        settings: &DatabaseSettings,
    ) -> Result<Arc<dyn DocumentCollection>, StoreError> {
        let mut options = ClientOptions::parse(settings.connection_string.as_str()).await?;
        ConnectOptions::from_value(&settings.connect_options)
            .map_err(StoreError::ConnectOptions)?
            .apply(&mut options);

        let client = Client::with_options(options)?;
        let database = client.database(settings.database_name.as_str());

        // The driver connects lazily; ping so failures surface here.
        database.run_command(doc! { "ping": 1 }).await?;
        log::info!(
            "Connected to MongoDB database '{}', collection '{}'",
            settings.database_name,
            settings.collection_name
        );

        Ok(Arc::new(MongoCollection {
            database_name: settings.database_name.as_str().to_string(),
            collection_name: settings.collection_name.as_str().to_string(),
            collection: database.collection::<Document>(settings.collection_name.as_str()),
        }))
    }
}

/// A MongoDB collection bound to its database.
pub struct MongoCollection {
    database_name: String,
    collection_name: String,
    collection: Collection<Document>,
}

#[async_trait::async_trait]
impl DocumentCollection for MongoCollection {
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
        options: &Value,
    ) -> Result<WriteResult, StoreError> {
        match method {
            WriteMethod::InsertOne => {
                let document = to_document(method, payload)?;
                let options: Option<InsertOneOptions> = parse_options(method, options)?;
                let result = self
                    .collection
                    .insert_one(document)
                    .with_options(options)
                    .await?;
                Ok(WriteResult::new(json!({
                    "insertedId": result.inserted_id.into_relaxed_extjson()
                })))
            }
            WriteMethod::InsertMany => {
                let documents = to_documents(method, payload)?;
                let options: Option<InsertManyOptions> = parse_options(method, options)?;
                let result = self
                    .collection
                    .insert_many(documents)
                    .with_options(options)
                    .await?;
                let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
                ids.sort_by_key(|(index, _)| *index);
                let inserted_ids: Map<String, Value> = ids
                    .into_iter()
                    .map(|(index, id)| (index.to_string(), id.into_relaxed_extjson()))
                    .collect();
                Ok(WriteResult::new(json!({ "insertedIds": inserted_ids })))
            }
        }
    }
}

/// Converts an object payload into a BSON document.
fn to_document(method: WriteMethod, payload: &Value) -> Result<Document, StoreError> {
    if !payload.is_object() {
        return Err(StoreError::InvalidPayload {
            method,
            reason: format!(
                "expected an object, found {}",
                crate::types::json_kind(payload)
            ),
        });
    }
    Ok(bson::to_document(payload)?)
}

/// Converts an array payload into documents; a lone object is a batch of one.
fn to_documents(method: WriteMethod, payload: &Value) -> Result<Vec<Document>, StoreError> {
    match payload {
        Value::Array(items) if items.is_empty() => Err(StoreError::InvalidPayload {
            method,
            reason: "cannot insert an empty array".to_string(),
        }),
        Value::Array(items) => items.iter().map(|item| to_document(method, item)).collect(),
        Value::Object(_) => Ok(vec![to_document(method, payload)?]),
        other => Err(StoreError::InvalidPayload {
            method,
            reason: format!(
                "expected an array of objects, found {}",
                crate::types::json_kind(other)
            ),
        }),
    }
}

fn parse_options<T: serde::de::DeserializeOwned>(
    method: WriteMethod,
    options: &Value,
) -> Result<Option<T>, StoreError> {
    if options.is_null() {
        return Ok(None);
    }
    serde_json::from_value(options.clone())
        .map(Some)
        .map_err(|source| StoreError::Options { method, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_one_requires_object() {
        assert!(to_document(WriteMethod::InsertOne, &json!({"id": 1})).is_ok());
        let err = to_document(WriteMethod::InsertOne, &json!([{"id": 1}])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Payload rejected by insertOne: expected an object, found an array"
        );
    }

    #[test]
    fn test_insert_many_shapes() {
        let docs = to_documents(WriteMethod::InsertMany, &json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[1].contains_key("id"));

        let single = to_documents(WriteMethod::InsertMany, &json!({"id": 1})).unwrap();
        assert_eq!(single.len(), 1);

        assert!(to_documents(WriteMethod::InsertMany, &json!([])).is_err());
        assert!(to_documents(WriteMethod::InsertMany, &json!("text")).is_err());
        assert!(to_documents(WriteMethod::InsertMany, &json!([1, 2])).is_err());
    }

    #[test]
    fn test_connect_options() {
        let options = ConnectOptions::from_value(&json!({
            "appName": "collector",
            "maxPoolSize": 5,
            "serverSelectionTimeoutMS": 2000,
            "somethingElse": true
        }))
        .unwrap();
        assert_eq!(options.app_name.as_deref(), Some("collector"));
        assert_eq!(options.max_pool_size, Some(5));
        assert_eq!(options.server_selection_timeout_ms, Some(2000));
        assert_eq!(
            ConnectOptions::from_value(&Value::Null).unwrap(),
            ConnectOptions::default()
        );
    }

    #[test]
    fn test_connect_options_with_wrong_types_are_rejected() {
        assert!(ConnectOptions::validate(&json!({"maxPoolSize": "five"})).is_err());
        assert!(ConnectOptions::validate(&json!({"directConnection": 1})).is_err());
        assert!(ConnectOptions::validate(&json!({"unknownKey": "kept"})).is_ok());
        assert!(ConnectOptions::validate(&Value::Null).is_ok());
    }

    #[test]
    fn test_null_options_are_absent() {
        let parsed: Option<InsertOneOptions> =
            parse_options(WriteMethod::InsertOne, &Value::Null).unwrap();
        assert!(parsed.is_none());
        let err = parse_options::<InsertOneOptions>(
            WriteMethod::InsertOne,
            &json!({"bypassDocumentValidation": "yes"}),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Options { .. }));
    }
}
