//! Call parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tessera_query::{type_name, QueryError};

/// Parameters of a service call.
///
/// A missing query is the same as an empty one, except for `patch`, which
/// needs either an id or a query to know what to touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Raw filter query.
    pub query: Option<Map<String, Value>>,
}

impl Params {
    /// Parameters without a query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters carrying `query`.
    pub fn with_query(query: Map<String, Value>) -> Self {
        Params { query: Some(query) }
    }

    /// Parameters from a JSON value, which must be an object.
    pub fn from_query(query: Value) -> Result<Self, QueryError> {
        match query {
            Value::Object(map) => Ok(Self::with_query(map)),
            other => Err(QueryError::NotAnObject(type_name(&other))),
        }
    }

    /// Returns `true` if a query was given.
    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    /// The query, empty when absent.
    pub fn into_query(self) -> Map<String, Value> {
        self.query.unwrap_or_default()
    }
}
