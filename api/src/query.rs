//! Query-string filters
//!
//! Filters are plain serde structs with optional fields. Keys whose value is
//! `None` (JSON `null`) are omitted from the request entirely.

use crate::error::ApiError;
use serde::Serialize;
use serde_json::Value;

/// Ordered query-string parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Empty query
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Add a parameter when `value` is present
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.pairs.push((key.into(), value.to_string()));
        }
        self
    }

    /// Build a query from any serializable filter object
    ///
    /// Top-level `null` fields are dropped, arrays are joined with commas and
    /// strings are passed through unquoted.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the filter does not serialize
    /// to a JSON object.
    pub fn from_filter<F: Serialize>(filter: &F) -> Result<Self, ApiError> {
        let value = serde_json::to_value(filter)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(ApiError::InvalidRequest(format!(
                    "filter must serialize to an object, got {other}"
                )));
            },
        };

        let pairs = map
            .into_iter()
            .filter_map(|(key, value)| render(value).map(|v| (key, v)))
            .collect();

        Ok(Self { pairs })
    }

    /// The parameters in insertion order
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// True when no parameter will be sent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn render(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(values) => {
            let parts: Vec<String> = values.into_iter().filter_map(render).collect();
            (!parts.is_empty()).then(|| parts.join(","))
        },
        other => Some(other.to_string()),
    }
}
