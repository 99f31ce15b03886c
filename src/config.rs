// src/config.rs
//! Option resolution: caller value, then environment variable, then default.

use crate::constants::*;
use crate::error::AppError;
use crate::pipeline::StreamRecord;
use crate::store::mongo::ConnectOptions;
use crate::transform::TransformQuery;
use crate::types::{
    ApiPath, BaseUrl, Credentials, RequestMethod, ResourceName, StructuredValue, ValidationError,
    WriteMethod,
};
use clap::Parser;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied gate deciding whether a payload is persisted.
#[derive(Clone)]
pub struct PayloadCheck(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl PayloadCheck {
    pub fn new(check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }

    /// Skips `null`, empty arrays and empty objects.
    pub fn skip_empty() -> Self {
        Self::new(|payload| match payload {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            _ => true,
        })
    }

    pub fn allows(&self, payload: &Value) -> bool {
        (self.0)(payload)
    }
}

impl fmt::Debug for PayloadCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PayloadCheck(..)")
    }
}

/// Per-event handler for streaming mode, called with each event's own result.
#[derive(Clone)]
pub struct EventCallback(Arc<dyn Fn(Result<&StreamRecord, &AppError>) + Send + Sync>);

impl EventCallback {
    pub fn new(callback: impl Fn(Result<&StreamRecord, &AppError>) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    pub fn call(&self, result: Result<&StreamRecord, &AppError>) {
        (self.0)(result)
    }
}

impl fmt::Debug for EventCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventCallback(..)")
    }
}

// ---------------------------------------------------------------------------
// Caller-supplied options (every field optional)
// ---------------------------------------------------------------------------

/// Pipeline options as given by the caller; missing fields are filled in by
/// [`PipelineConfig::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOptions {
    pub api: ApiOptions,
    pub database: DatabaseOptions,
    pub transform_query: Option<String>,
    #[serde(skip)]
    pub on_event: Option<EventCallback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiOptions {
    pub method: Option<String>,
    pub path: Option<String>,
    pub parameters: Option<StructuredValue>,
    pub credentials: CredentialOptions,
    pub rest_base_url: Option<String>,
    pub stream_base_url: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialOptions {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token_key: Option<String>,
    pub access_token_secret: Option<String>,
    pub bearer_token: Option<String>,
}

impl fmt::Debug for CredentialOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let given = |v: &Option<String>| if v.is_some() { "<given>" } else { "<none>" };
        f.debug_struct("CredentialOptions")
            .field("consumer_key", &given(&self.consumer_key))
            .field("consumer_secret", &given(&self.consumer_secret))
            .field("access_token_key", &given(&self.access_token_key))
            .field("access_token_secret", &given(&self.access_token_secret))
            .field("bearer_token", &given(&self.bearer_token))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseOptions {
    pub connection_string: Option<String>,
    pub database_name: Option<String>,
    pub collection_name: Option<String>,
    pub connect_options: Option<StructuredValue>,
    pub write_method: Option<String>,
    pub write_options: Option<StructuredValue>,
    #[serde(skip)]
    pub check: Option<PayloadCheck>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved configuration, immutable for the life of one invocation.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api: ApiSettings,
    pub database: DatabaseSettings,
    pub transform: Option<TransformQuery>,
    pub on_event: Option<EventCallback>,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub method: RequestMethod,
    pub path: ApiPath,
    pub parameters: Map<String, Value>,
    pub credentials: Credentials,
    pub rest_base_url: BaseUrl,
    pub stream_base_url: BaseUrl,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub connection_string: ConnectionString,
    pub database_name: ResourceName,
    pub collection_name: ResourceName,
    pub connect_options: Value,
    pub write_method: WriteMethod,
    pub write_options: Value,
    pub check: Option<PayloadCheck>,
}

/// MongoDB connection string; `Debug` and `Display` hide the password.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString(String);

impl ConnectionString {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        match url::Url::parse(&self.0) {
            Ok(mut parsed) if parsed.password().is_some() => {
                let _ = parsed.set_password(Some("***"));
                parsed.to_string()
            }
            _ => self.0.clone(),
        }
    }
}

impl AsRef<str> for ConnectionString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionString({})", self.redacted())
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl PipelineConfig {
    /// Resolves options against the process environment.
    pub fn resolve(options: PipelineOptions) -> Result<Self, AppError> {
        Self::resolve_with(options, |name| std::env::var(name).ok())
    }

    /// Resolves options against an arbitrary variable lookup.
    ///
    /// Empty variables count as unset.
    pub fn resolve_with<F>(options: PipelineOptions, env: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|value| !value.is_empty());
        let pick = |explicit: Option<String>, name: &str, default: &str| {
            explicit
                .or_else(|| lookup(name))
                .unwrap_or_else(|| default.to_string())
        };
        let pick_structured = |explicit: Option<StructuredValue>, name: &str| {
            explicit.or_else(|| lookup(name).map(StructuredValue::Raw))
        };

        let PipelineOptions {
            api,
            database,
            transform_query,
            on_event,
        } = options;

        // --- api ---
        let method: RequestMethod = pick(api.method, ENV_TWITTER_METHOD, DEFAULT_TWITTER_METHOD)
            .parse()
            .map_err(invalid("api.method"))?;
        let path = ApiPath::new(pick(api.path, ENV_TWITTER_PATH, DEFAULT_TWITTER_PATH))
            .map_err(invalid("api.path"))?;
        let parameters = pick_structured(api.parameters, ENV_TWITTER_PARAMS)
            .unwrap_or_else(|| StructuredValue::from(DEFAULT_TWITTER_PARAMS))
            .into_object()
            .map_err(invalid("api.parameters"))?;

        let given = api.credentials;
        let credentials = Credentials {
            consumer_key: pick(given.consumer_key, ENV_TWITTER_CONSUMER_KEY, ""),
            consumer_secret: pick(given.consumer_secret, ENV_TWITTER_CONSUMER_SECRET, ""),
            access_token_key: pick(given.access_token_key, ENV_TWITTER_ACCESS_TOKEN_KEY, ""),
            access_token_secret: pick(
                given.access_token_secret,
                ENV_TWITTER_ACCESS_TOKEN_SECRET,
                "",
            ),
            bearer_token: given
                .bearer_token
                .or_else(|| lookup(ENV_TWITTER_BEARER_TOKEN)),
        };

        let rest_base_url = BaseUrl::parse(&pick(
            api.rest_base_url,
            ENV_TWITTER_REST_BASE_URL,
            DEFAULT_REST_BASE_URL,
        ))
        .map_err(invalid("api.rest_base_url"))?;
        let stream_base_url = BaseUrl::parse(&pick(
            api.stream_base_url,
            ENV_TWITTER_STREAM_BASE_URL,
            DEFAULT_STREAM_BASE_URL,
        ))
        .map_err(invalid("api.stream_base_url"))?;

        // --- database ---
        let connection_string = ConnectionString::new(pick(
            database.connection_string,
            ENV_MONGODB_CONNECTION,
            DEFAULT_MONGODB_CONNECTION,
        ));
        let database_name = ResourceName::new(
            "database.database_name",
            pick(database.database_name, ENV_MONGODB_DATABASE, DEFAULT_MONGODB_DATABASE),
        )
        .map_err(invalid("database.database_name"))?;
        let collection_name = ResourceName::new(
            "database.collection_name",
            pick(
                database.collection_name,
                ENV_MONGODB_COLLECTION,
                DEFAULT_MONGODB_COLLECTION,
            ),
        )
        .map_err(invalid("database.collection_name"))?;
        let connect_options = pick_structured(database.connect_options, ENV_MONGODB_OPTIONS)
            .map(StructuredValue::into_optional_object)
            .transpose()
            .map_err(invalid("database.connect_options"))?
            .unwrap_or(Value::Null);
        ConnectOptions::validate(&connect_options).map_err(|e| {
            AppError::configuration("database.connect_options", e.to_string())
        })?;
        let write_method: WriteMethod =
            pick(database.write_method, ENV_MONGODB_METHOD, DEFAULT_MONGODB_METHOD)
                .parse()
                .map_err(invalid("database.write_method"))?;
        let write_options = pick_structured(database.write_options, ENV_MONGODB_METHOD_OPTIONS)
            .map(StructuredValue::into_optional_object)
            .transpose()
            .map_err(invalid("database.write_options"))?
            .unwrap_or(Value::Null);

        // --- transform ---
        let transform = transform_query
            .or_else(|| lookup(ENV_TRANSFORM_QUERY))
            .and_then(TransformQuery::new);

        Ok(PipelineConfig {
            api: ApiSettings {
                method,
                path,
                parameters,
                credentials,
                rest_base_url,
                stream_base_url,
            },
            database: DatabaseSettings {
                connection_string,
                database_name,
                collection_name,
                connect_options,
                write_method,
                write_options,
                check: database.check,
            },
            transform,
            on_event,
        })
    }
}

/// Maps a validation failure on `field` to a configuration error.
fn invalid(field: &'static str) -> impl Fn(ValidationError) -> AppError {
    move |e| AppError::configuration(field, e.to_string())
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Parsed command-line input. Credentials are read from the environment only.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Request method: get, post, delete or stream
    #[arg(short, long)]
    pub method: Option<String>,

    /// API endpoint path, e.g. "search/tweets" or "statuses/filter"
    #[arg(short, long)]
    pub path: Option<String>,

    /// Request parameters as JSON, e.g. '{"q":"rust"}'
    #[arg(long)]
    pub params: Option<String>,

    /// MongoDB connection string
    #[arg(short, long)]
    pub connection: Option<String>,

    /// MongoDB database name
    #[arg(short, long)]
    pub database: Option<String>,

    /// MongoDB collection name
    #[arg(long)]
    pub collection: Option<String>,

    /// MongoDB connect options as JSON
    #[arg(long)]
    pub connect_options: Option<String>,

    /// Write method: insertOne or insertMany
    #[arg(short, long)]
    pub write_method: Option<String>,

    /// Write method options as JSON
    #[arg(long)]
    pub write_options: Option<String>,

    /// JMESPath query applied to each payload before it is stored
    #[arg(short, long)]
    pub query: Option<String>,

    /// Skip storing null, empty arrays and empty objects
    #[arg(long, default_value_t = false)]
    pub skip_empty: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CommandLineInput {
    pub fn into_options(self) -> PipelineOptions {
        PipelineOptions {
            api: ApiOptions {
                method: self.method,
                path: self.path,
                parameters: self.params.map(StructuredValue::Raw),
                ..ApiOptions::default()
            },
            database: DatabaseOptions {
                connection_string: self.connection,
                database_name: self.database,
                collection_name: self.collection,
                connect_options: self.connect_options.map(StructuredValue::Raw),
                write_method: self.write_method,
                write_options: self.write_options.map(StructuredValue::Raw),
                check: self.skip_empty.then(PayloadCheck::skip_empty),
            },
            transform_query: self.query,
            on_event: None,
        }
    }
}
