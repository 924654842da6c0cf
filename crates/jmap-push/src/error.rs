//! Push error types.
//!
//! `PushError` is `Clone` because a single failure is broadcast to every
//! entity stream; non-`Clone` sources are held in an `Arc`.

use jmap_client::{JmapError, TransportError};
use std::sync::Arc;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Clone, Error)]
pub enum PushError {
    /// Session precondition or other client failure.
    #[error(transparent)]
    Client(Arc<JmapError>),

    /// The ticket endpoint could not be reached or refused.
    #[error("Push ticket request failed: {0}")]
    Ticket(Arc<TransportError>),

    /// The ticket endpoint answered without a usable `value`.
    #[error("Malformed push ticket response: {0}")]
    MalformedTicket(String),

    /// WebSocket handshake or read failure.
    #[error("WebSocket error: {0}")]
    WebSocket(Arc<tungstenite::Error>),

    #[error("Invalid push URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Push URL scheme is not http, https, ws or wss.
    #[error("Unsupported push URL scheme: {0}")]
    UnsupportedScheme(String),

    /// An outbound frame could not be encoded.
    #[error("Failed to encode push frame: {0}")]
    Encode(String),

    /// The connection attempt ended without reporting an outcome.
    #[error("Push connection attempt abandoned")]
    Aborted,
}

impl From<JmapError> for PushError {
    fn from(error: JmapError) -> Self {
        PushError::Client(Arc::new(error))
    }
}

impl From<tungstenite::Error> for PushError {
    fn from(error: tungstenite::Error) -> Self {
        PushError::WebSocket(Arc::new(error))
    }
}

/// Result type alias using PushError.
pub type PushResult<T> = Result<T, PushError>;
