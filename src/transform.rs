// src/transform.rs
//! Payload reshaping with JMESPath queries.

use crate::error::TransformError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A JMESPath expression applied to each payload before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformQuery(String);

impl TransformQuery {
    /// Wraps an expression. Blank expressions mean "no transform".
    pub fn new(expression: impl Into<String>) -> Option<Self> {
        let expression = expression.into();
        if expression.trim().is_empty() {
            None
        } else {
            Some(Self(expression))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Evaluates the query against `doc` and returns the derived value.
    ///
    /// Pure: the same query over the same document always yields the same value.
    pub fn apply(&self, doc: &Value) -> Result<Value, TransformError> {
        let expression = jmespath::compile(&self.0).map_err(|e| self.error(e))?;
        let result = expression.search(doc).map_err(|e| self.error(e))?;
        serde_json::to_value(&*result).map_err(|e| self.error(e))
    }

    fn error(&self, cause: impl fmt::Display) -> TransformError {
        TransformError {
            query: self.0.clone(),
            message: cause.to_string(),
        }
    }
}

impl fmt::Display for TransformQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
