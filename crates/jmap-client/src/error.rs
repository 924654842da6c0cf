//! Error types for session resolution and method dispatch.

use jmap_protocol_types::MethodError;
use thiserror::Error;

/// Failures of the HTTP layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or body read failure from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, as text.
        body: String,
    },

    /// A configured header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors surfaced by the JMAP client.
///
/// Precondition variants are raised before anything is sent.
#[derive(Debug, Error)]
pub enum JmapError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No session has been fetched yet.
    #[error("Session not initialized, fetch the session first")]
    SessionNotInitialized,

    /// The session lists no accounts.
    #[error("Session has no accounts")]
    NoAccount,

    /// The session has no primary account for the capability.
    #[error("No primary account for capability {0}")]
    NoPrimaryAccount(String),

    /// The session does not advertise a capability the operation needs.
    #[error("Capability not advertised by the session: {0}")]
    MissingCapability(String),

    /// Caller-supplied arguments cannot be sent.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The server rejected the method call.
    #[error("Method error: {0}")]
    Method(MethodError),

    /// The response envelope does not contain the expected invocation.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl JmapError {
    /// Whether the error was raised locally, before any request.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            JmapError::SessionNotInitialized
                | JmapError::NoAccount
                | JmapError::NoPrimaryAccount(_)
                | JmapError::MissingCapability(_)
                | JmapError::InvalidArguments(_)
        )
    }

    /// The server-side method error, if that is what this is.
    pub fn method_error(&self) -> Option<&MethodError> {
        match self {
            JmapError::Method(error) => Some(error),
            _ => None,
        }
    }
}

/// Result type alias using JmapError.
pub type JmapResult<T> = Result<T, JmapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use jmap_protocol_types::ErrorType;

    #[test]
    fn test_precondition_classification() {
        assert!(JmapError::SessionNotInitialized.is_precondition());
        assert!(JmapError::NoPrimaryAccount("urn".into()).is_precondition());
        assert!(!JmapError::MalformedResponse("x".into()).is_precondition());
        assert!(!JmapError::Transport(TransportError::Status {
            status: 500,
            body: String::new()
        })
        .is_precondition());
    }

    #[test]
    fn test_method_error_accessor() {
        let error = JmapError::Method(MethodError::new(ErrorType::AccountNotFound));
        assert_eq!(
            error.method_error().map(|e| &e.error_type),
            Some(&ErrorType::AccountNotFound)
        );
        assert_eq!(error.to_string(), "Method error: accountNotFound");
        assert!(JmapError::NoAccount.method_error().is_none());
    }
}
