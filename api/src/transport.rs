//! The request/response seam between service modules and HTTP
//!
//! Service modules only ever see [`Transport`], so tests can swap the real
//! [`ApiClient`](crate::ApiClient) for a scripted one.

use crate::error::ApiError;
use crate::query::Query;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP method used by the backend API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// One backend call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base URL, without a leading slash
    pub path: String,
    /// Query-string parameters
    pub query: Query,
    /// JSON body
    pub body: Option<Value>,
}

impl ApiRequest {
    /// `GET path`
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `POST path` with a JSON body
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    /// `PUT path` with a JSON body
    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    /// `DELETE path`
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            path: path.trim_start_matches('/').to_string(),
            query: Query::new(),
            body: None,
        }
    }

    /// Attach query parameters
    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method, self.path)
    }
}

/// Performs exactly one backend call per `execute`
///
/// Implementations must not retry or cache; the caller decides what a
/// failure means.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request and return the decoded JSON body
    ///
    /// An empty success body decodes to `Value::Null`.
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leading_slash_is_trimmed() {
        let request = ApiRequest::get("/services/catalog");
        assert_eq!(request.path, "services/catalog");
        assert_eq!(request.to_string(), "GET /services/catalog");
    }

    #[test]
    fn builders_set_body() {
        let request = ApiRequest::put("tasks/t1", json!({ "status": "done" }));
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.body, Some(json!({ "status": "done" })));
    }
}
