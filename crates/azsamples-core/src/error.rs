//! Unified error handling for azsamples-core
//!
//! Service errors are carried verbatim: the HTTP status plus the `code` and
//! `message` that ARM placed in its error envelope. Nothing is retried or
//! translated; the helper predicates only classify.
//!
//! # Example
//!
//! ```rust
//! use azsamples_core::CoreError;
//!
//! let err = CoreError::from_service_response(
//!     404,
//!     br#"{"error":{"code":"ResourceNotFound","message":"vm-1 was not found"}}"#,
//! );
//! assert!(err.is_not_found());
//! assert!(err.to_string().contains("ResourceNotFound"));
//! ```

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for every wrapper in this crate
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings could not be loaded or are incomplete
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential material was missing or a token could not be acquired
    #[error("Credential error: {0}")]
    Credential(String),

    /// Transport-level failure (DNS, TLS, connection reset, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the service
    #[error("Service error ({status}) {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// A long-running operation reached a failed or canceled terminal state
    #[error("Operation {status}: {code}: {message}")]
    OperationFailed {
        status: String,
        code: String,
        message: String,
    },

    /// The poll policy's maximum duration elapsed before a terminal state
    #[error("Operation did not complete within {0:?}")]
    PollTimeout(Duration),

    /// The caller's cancellation token fired while waiting
    #[error("Operation wait was canceled")]
    Canceled,

    /// The service answered with something this crate cannot interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A caller-supplied resource id is not of the ARM form
    #[error("Invalid resource id: '{0}'")]
    InvalidResourceId(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed endpoint or poll URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// ARM error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

/// The `error` object ARM returns in failed responses and failed operation bodies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CoreError {
    /// Build a [`CoreError::Service`] from a failed response
    ///
    /// Falls back to the canonical status text and raw body when the body is
    /// not an ARM error envelope.
    pub fn from_service_response(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_default();

        let code = detail.code.unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("HttpError")
                .to_string()
        });
        let message = detail
            .message
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

        CoreError::Service {
            status,
            code,
            message,
        }
    }

    fn status(&self) -> Option<u16> {
        match self {
            CoreError::Service { status, .. } => Some(*status),
            CoreError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Credential(_)) || matches!(self.status(), Some(401 | 403))
    }

    /// Returns true if this is a conflict/precondition error (409/412)
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409 | 412))
    }

    /// Returns true if this is a bad request error (400)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(400)
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Returns true if the service throttled the request (429)
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.status() == Some(429)
    }

    /// Returns true if the wait stopped because the caller canceled it
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, CoreError::Canceled)
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::PollTimeout(_) => true,
            CoreError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_from_arm_envelope() {
        let err = CoreError::from_service_response(
            409,
            br#"{"error":{"code":"OperationNotAllowed","message":"VM is busy"}}"#,
        );

        match &err {
            CoreError::Service {
                status,
                code,
                message,
            } => {
                assert_eq!(*status, 409);
                assert_eq!(code, "OperationNotAllowed");
                assert_eq!(message, "VM is busy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_service_error_without_envelope() {
        let err = CoreError::from_service_response(503, b"upstream unavailable");

        match &err {
            CoreError::Service { code, message, .. } => {
                assert_eq!(code, "Service Unavailable");
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_server_error());
    }

    #[test]
    fn test_status_helpers() {
        assert!(CoreError::from_service_response(400, b"").is_bad_request());
        assert!(CoreError::from_service_response(401, b"").is_unauthorized());
        assert!(CoreError::from_service_response(403, b"").is_unauthorized());
        assert!(CoreError::from_service_response(412, b"").is_conflict());
        assert!(CoreError::from_service_response(429, b"").is_throttled());
        assert!(!CoreError::from_service_response(429, b"").is_server_error());
    }

    #[test]
    fn test_credential_error_is_unauthorized() {
        let err = CoreError::Credential("no client secret".to_string());
        assert!(err.is_unauthorized());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_poll_timeout_and_cancel() {
        let timeout = CoreError::PollTimeout(Duration::from_secs(60));
        assert!(timeout.is_timeout());
        assert!(!timeout.is_canceled());
        assert!(timeout.to_string().contains("did not complete"));

        assert!(CoreError::Canceled.is_canceled());
        assert!(!CoreError::Canceled.is_timeout());
    }
}
