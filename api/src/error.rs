//! Error types for the backend API client

use thiserror::Error;

/// Message shown when a failure carries nothing more specific
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Errors that can occur when talking to the backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, reset)
    #[error("Request failed: {0}")]
    Network(String),

    /// The request exceeded the client timeout
    #[error("Request timed out")]
    Timeout,

    /// The backend answered with a non-success status
    #[error("API error (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        /// HTTP status code
        status: u16,
        /// `message` (or `error`) field from the response body, if any
        message: Option<String>,
    },

    /// The backend answered 2xx but flagged the call as unsuccessful
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The response body did not match the expected shape
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// The request could not be built (bad base URL, unserializable filter)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// The structured message the backend sent, if any
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref().filter(|m| !m.trim().is_empty()),
            Self::Rejected(message) if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Message suitable for showing to a user
    ///
    /// Uses the backend's structured message when present, otherwise `fallback`.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    /// [`message_or`](Self::message_or) with the generic default
    #[must_use]
    pub fn user_message(&self) -> String {
        self.message_or(GENERIC_ERROR_MESSAGE)
    }

    /// HTTP status, for errors that carry one
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_message_wins_over_fallback() {
        let error = ApiError::Http {
            status: 422,
            message: Some("Email already in use".to_string()),
        };
        assert_eq!(error.message_or("Failed to create customer"), "Email already in use");
        assert_eq!(error.status(), Some(422));
    }

    #[test]
    fn fallback_used_without_structured_message() {
        let blank = ApiError::Http {
            status: 500,
            message: Some("  ".to_string()),
        };
        assert_eq!(blank.message_or("Failed to load invoices"), "Failed to load invoices");
        assert_eq!(ApiError::Timeout.message_or("Failed"), "Failed");
        assert_eq!(
            ApiError::Network("connection refused".to_string()).message_or("Failed"),
            "Failed"
        );
    }

    #[test]
    fn user_message_defaults_to_generic_text() {
        assert_eq!(ApiError::Decode("eof".to_string()).user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(
            ApiError::Rejected("Plan is in use".to_string()).user_message(),
            "Plan is in use"
        );
    }

    #[test]
    fn display_includes_status() {
        let error = ApiError::Http { status: 404, message: None };
        assert_eq!(error.to_string(), "API error (status 404): no message");
    }
}
