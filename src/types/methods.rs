//! Enumerated option values: how to call the API and how to write to the store.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Twitter API request method. `Stream` selects streaming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    Get,
    Post,
    Delete,
    Stream,
}

impl RequestMethod {
    /// Whether this method opens a continuous stream instead of a single request.
    pub fn is_stream(self) -> bool {
        matches!(self, Self::Stream)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Stream => "stream",
        }
    }
}

impl FromStr for RequestMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "delete" => Ok(Self::Delete),
            "stream" => Ok(Self::Stream),
            _ => Err(ValidationError::UnknownRequestMethod(s.to_string())),
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named persistence operation on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteMethod {
    #[serde(rename = "insertOne")]
    InsertOne,
    #[serde(rename = "insertMany")]
    InsertMany,
}

impl WriteMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsertOne => "insertOne",
            Self::InsertMany => "insertMany",
        }
    }
}

impl FromStr for WriteMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "insertOne" | "insert_one" => Ok(Self::InsertOne),
            "insertMany" | "insert_many" => Ok(Self::InsertMany),
            other => Err(ValidationError::UnknownWriteMethod(other.to_string())),
        }
    }
}

impl fmt::Display for WriteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
