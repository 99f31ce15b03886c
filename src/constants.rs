// src/constants.rs
//! Names and defaults that define how the pipeline is configured.
//!
//! Every option can come from the caller, from an environment variable, or
//! from the literal default listed here, in that order.

// ---------------------------------------------------------------------------
// Twitter API
// ---------------------------------------------------------------------------

pub const ENV_TWITTER_METHOD: &str = "TWITTER_METHOD";
pub const ENV_TWITTER_PATH: &str = "TWITTER_PATH";
pub const ENV_TWITTER_PARAMS: &str = "TWITTER_PARAMS";
pub const ENV_TWITTER_CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
pub const ENV_TWITTER_CONSUMER_SECRET: &str = "TWITTER_CONSUMER_SECRET";
pub const ENV_TWITTER_ACCESS_TOKEN_KEY: &str = "TWITTER_ACCESS_TOKEN_KEY";
pub const ENV_TWITTER_ACCESS_TOKEN_SECRET: &str = "TWITTER_ACCESS_TOKEN_SECRET";
pub const ENV_TWITTER_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
pub const ENV_TWITTER_REST_BASE_URL: &str = "TWITTER_REST_BASE_URL";
pub const ENV_TWITTER_STREAM_BASE_URL: &str = "TWITTER_STREAM_BASE_URL";

pub const DEFAULT_TWITTER_METHOD: &str = "get";
pub const DEFAULT_TWITTER_PATH: &str = "search/tweets";
pub const DEFAULT_TWITTER_PARAMS: &str = r#"{"q":"twitter"}"#;

/// Base URL for REST endpoints; `{path}.json` is appended.
pub const DEFAULT_REST_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Base URL for streaming endpoints; `{path}.json` is appended.
pub const DEFAULT_STREAM_BASE_URL: &str = "https://stream.twitter.com/1.1";

/// Request timeout for REST calls. Streams have no overall timeout.
pub const REST_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Capacity of the channel between the stream reader task and its consumer.
pub const STREAM_CHANNEL_CAPACITY: usize = 256;

/// Capacity of a `PipelineStream`'s event queue. When an `on_event` callback
/// is installed, data events beyond this are dropped from the queue after the
/// callback has seen them; without one, event tasks wait for the reader.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// MongoDB
// ---------------------------------------------------------------------------

pub const ENV_MONGODB_CONNECTION: &str = "MONGODB_CONNECTION";
pub const ENV_MONGODB_DATABASE: &str = "MONGODB_DATABASE";
pub const ENV_MONGODB_COLLECTION: &str = "MONGODB_COLLECTION";
pub const ENV_MONGODB_OPTIONS: &str = "MONGODB_OPTIONS";
pub const ENV_MONGODB_METHOD: &str = "MONGODB_METHOD";
pub const ENV_MONGODB_METHOD_OPTIONS: &str = "MONGODB_METHOD_OPTIONS";

pub const DEFAULT_MONGODB_CONNECTION: &str = "mongodb://localhost:27017";
pub const DEFAULT_MONGODB_DATABASE: &str = "test";
pub const DEFAULT_MONGODB_COLLECTION: &str = "twitter2mongodb_data";
pub const DEFAULT_MONGODB_METHOD: &str = "insertOne";

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

pub const ENV_TRANSFORM_QUERY: &str = "JMESPATH";

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log file written by the command-line binary, inside the temp directory.
pub const LOG_FILE_NAME: &str = "twitter2mongodb.log";
