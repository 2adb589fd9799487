//! Backend API client implementation

use crate::{
    error::ApiError,
    transport::{ApiRequest, Method, Transport},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Backend API client
///
/// Attaches the bearer token (when configured) to every request and turns
/// non-success responses into [`ApiError::Http`] with the body's `message`
/// or `error` field.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `base_url` with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the base URL is empty or the
    /// underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::InvalidRequest("API base URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Attach a bearer token to every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The configured base URL, without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.url(&request.path);
        tracing::debug!(method = %request.method, %url, "Sending API request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if !request.query.is_empty() {
            builder = builder.query(request.query.pairs());
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if status.is_success() {
            if text.trim().is_empty() || status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        tracing::debug!(status = status.as_u16(), %url, "API request failed");
        Err(ApiError::Http {
            status: status.as_u16(),
            message: error_message(&text),
        })
    }
}

/// Pull the `message` (or `error`) string out of an error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let field = |v: &Value| {
        v.get("message")
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    field(&value).or_else(|| value.get("data").and_then(field))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn error_message_reads_common_fields() {
        assert_eq!(error_message(r#"{"message":"Not found"}"#), Some("Not found".to_string()));
        assert_eq!(error_message(r#"{"error":"Forbidden"}"#), Some("Forbidden".to_string()));
        assert_eq!(
            error_message(r#"{"data":{"message":"VIN taken"}}"#),
            Some("VIN taken".to_string())
        );
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(client.url("customers"), "http://localhost:5000/api/customers");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(ApiClient::new("", Duration::from_secs(1)).is_err());
    }
}
