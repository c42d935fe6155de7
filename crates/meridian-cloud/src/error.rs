//! Error handling for the Meridian Cloud API client
//!
//! Maps HTTP failures into a typed taxonomy with consistent helper methods,
//! so callers can branch on the class of failure without inspecting status
//! codes themselves.
//!
//! # Example
//!
//! ```rust
//! use meridian_cloud::ApiError;
//!
//! fn handle_error(err: ApiError) {
//!     if err.is_not_found() {
//!         println!("Resource not found");
//!     } else if err.is_retryable() {
//!         println!("Temporary error, can retry");
//!     }
//! }
//! ```

use thiserror::Error;

/// Error type for all Meridian Cloud API operations
#[derive(Error, Debug)]
pub enum ApiError {
    /// The requested resource does not exist (404)
    #[error("resource not found: {message}")]
    NotFound { message: String },

    /// Authentication or authorization failed (401/403)
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The request was rejected as invalid (400/422)
    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// A conflicting change is already in flight (409/412)
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The API rate limit was exceeded (429)
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// The service failed to process the request (5xx)
    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Any other non-success status
    #[error("unexpected response ({status}): {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// Connection-level failure (DNS, TLS, timeout, ...)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be decoded into the expected type
    #[error("failed to decode response: {message}")]
    Deserialization {
        message: String,
        /// The raw body, kept for debugging
        body: String,
    },

    /// The request body could not be serialized
    #[error("failed to serialize request: {0}")]
    Serialization(String),

    /// The client itself was misconfigured (bad URL, bad header value, ...)
    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Build a typed error from a non-success HTTP status and its body.
    ///
    /// The service reports failures as `{"message": "..."}`; anything else is
    /// carried through verbatim.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str().map(String::from)))
            .unwrap_or_else(|| body.trim().to_string());

        match status.as_u16() {
            404 => ApiError::NotFound { message },
            401 | 403 => ApiError::AuthenticationFailed { message },
            400 | 422 => ApiError::BadRequest { message },
            409 | 412 => ApiError::Conflict { message },
            429 => ApiError::RateLimited { message },
            s if status.is_server_error() => ApiError::ServerError { status: s, message },
            s => ApiError::UnexpectedStatus { status: s, message },
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::AuthenticationFailed { .. })
    }

    /// Returns true if this is a bad request error (400/422)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ApiError::BadRequest { .. })
    }

    /// Returns true if this is a conflict/precondition error (409/412)
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }

    /// Returns true if this is a rate limiting error (429)
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, ApiError::ServerError { .. })
    }

    /// Returns true if this error is potentially retryable
    ///
    /// Network failures, 5xx responses, and 429 responses may succeed on a
    /// later attempt. Everything else is deterministic and retrying would
    /// only repeat the failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::ServerError { .. } | ApiError::RateLimited { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_common_codes() {
        let err = ApiError::from_status(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"message": "database db-1 not found"}"#,
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("db-1"));

        let err = ApiError::from_status(reqwest::StatusCode::UNAUTHORIZED, "nope");
        assert!(err.is_unauthorized());

        let err = ApiError::from_status(reqwest::StatusCode::CONFLICT, "busy");
        assert!(err.is_conflict());

        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(err.is_server_error());
    }

    #[test]
    fn test_from_status_plain_text_body() {
        let err = ApiError::from_status(reqwest::StatusCode::BAD_REQUEST, "name is required");
        match err {
            ApiError::BadRequest { message } => assert_eq!(message, "name is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            ApiError::ServerError {
                status: 503,
                message: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(
            ApiError::RateLimited {
                message: "slow down".into()
            }
            .is_retryable()
        );
        assert!(
            !ApiError::NotFound {
                message: "gone".into()
            }
            .is_retryable()
        );
        assert!(
            !ApiError::BadRequest {
                message: "bad".into()
            }
            .is_retryable()
        );
    }
}
