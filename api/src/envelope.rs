//! Response envelope handling
//!
//! The backend wraps payloads inconsistently: `{ data }`, `{ success, data }`,
//! or a bare body. Every decoder here accepts all three, so service modules
//! unwrap uniformly and hand typed values to their callers.

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination metadata returned alongside list responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    /// Current page (1-based)
    pub page: u32,
    /// Page size
    #[serde(alias = "pageSize", alias = "perPage")]
    pub limit: u32,
    /// Total number of records across all pages
    #[serde(alias = "totalCount", alias = "count")]
    pub total: u64,
    /// Total number of pages
    #[serde(alias = "pages")]
    pub total_pages: u32,
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records in server order
    pub items: Vec<T>,
    /// Pagination metadata, when the backend sent any
    pub pagination: Option<Pagination>,
}

/// Strip the `{ success, data }` envelope, returning the payload
///
/// # Errors
///
/// Returns [`ApiError::Rejected`] when the body carries `success: false`.
pub fn unwrap_envelope(body: Value) -> Result<Value, ApiError> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };

    if map.get("success").and_then(Value::as_bool) == Some(false) {
        let message = map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(ApiError::Rejected(message));
    }

    match map.remove("data") {
        Some(data) => Ok(data),
        None => Ok(Value::Object(map)),
    }
}

/// Decode a single payload from an enveloped body
///
/// # Errors
///
/// Returns [`ApiError::Decode`] if the payload does not match `T`, or
/// [`ApiError::Rejected`] for `success: false` bodies.
pub fn decode_data<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let data = unwrap_envelope(body)?;
    Ok(serde_json::from_value(data)?)
}

/// Decode a list payload from an enveloped body
///
/// Accepted shapes, checked in order:
/// - `{ data: [..], pagination }`
/// - `{ data: { <collection_key> | items | results: [..], pagination } }`
/// - `[..]`
///
/// # Errors
///
/// Returns [`ApiError::Decode`] when no list can be found or an element
/// does not match `T`.
pub fn decode_page<T: DeserializeOwned>(body: Value, collection_key: &str) -> Result<Page<T>, ApiError> {
    let outer_pagination = pagination_of(&body);
    let data = unwrap_envelope(body)?;

    let (list, inner_pagination) = match data {
        Value::Array(_) => (data, None),
        Value::Object(mut map) => {
            let pagination = map
                .get("pagination")
                .or_else(|| map.get("meta"))
                .and_then(|p| serde_json::from_value(p.clone()).ok());
            let list = [collection_key, "items", "results"]
                .iter()
                .find_map(|key| map.remove(*key))
                .ok_or_else(|| {
                    ApiError::Decode(format!("response has no `{collection_key}` list"))
                })?;
            (list, pagination)
        },
        other => {
            return Err(ApiError::Decode(format!("expected a list, got {other}")));
        },
    };

    Ok(Page {
        items: serde_json::from_value(list)?,
        pagination: inner_pagination.or(outer_pagination),
    })
}

/// Decode a delete confirmation, returning the backend's message
///
/// # Errors
///
/// Returns [`ApiError::Rejected`] for `success: false` bodies.
pub fn decode_confirmation(body: Value, fallback: &str) -> Result<String, ApiError> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);
    unwrap_envelope(body)?;
    Ok(message.unwrap_or_else(|| fallback.to_string()))
}

fn pagination_of(body: &Value) -> Option<Pagination> {
    body.get("pagination")
        .or_else(|| body.get("meta"))
        .and_then(|p| serde_json::from_value(p.clone()).ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: String,
    }

    #[test]
    fn data_envelope_is_unwrapped() {
        let row: Row = decode_data(json!({ "success": true, "data": { "id": "a1" } })).unwrap();
        assert_eq!(row, Row { id: "a1".to_string() });
    }

    #[test]
    fn bare_body_is_accepted() {
        let row: Row = decode_data(json!({ "id": "a1" })).unwrap();
        assert_eq!(row.id, "a1");
    }

    #[test]
    fn unsuccessful_body_is_rejected() {
        let err = decode_data::<Row>(json!({ "success": false, "message": "Plan is archived" }))
            .unwrap_err();
        assert_eq!(err, ApiError::Rejected("Plan is archived".to_string()));
    }

    #[test]
    fn list_with_outer_pagination() {
        let page: Page<Row> = decode_page(
            json!({
                "data": [{ "id": "a" }, { "id": "b" }],
                "pagination": { "page": 2, "limit": 2, "total": 9, "totalPages": 5 }
            }),
            "customers",
        )
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(
            page.pagination,
            Some(Pagination { page: 2, limit: 2, total: 9, total_pages: 5 })
        );
    }

    #[test]
    fn list_nested_under_collection_key() {
        let page: Page<Row> = decode_page(
            json!({
                "success": true,
                "data": { "invoices": [{ "id": "inv-1" }], "pagination": { "page": 1, "pages": 1 } }
            }),
            "invoices",
        )
        .unwrap();

        assert_eq!(page.items, vec![Row { id: "inv-1".to_string() }]);
        assert_eq!(page.pagination.unwrap().total_pages, 1);
    }

    #[test]
    fn list_missing_collection_is_decode_error() {
        let err = decode_page::<Row>(json!({ "data": { "count": 3 } }), "tasks").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn confirmation_prefers_server_message() {
        let message =
            decode_confirmation(json!({ "success": true, "message": "Vehicle removed" }), "Deleted")
                .unwrap();
        assert_eq!(message, "Vehicle removed");
        assert_eq!(decode_confirmation(Value::Null, "Deleted").unwrap(), "Deleted");
    }
}
