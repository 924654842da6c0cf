//! JMAP client: session resolution and method dispatch.
//!
//! ```text
//! caller → JmapClient::invoke → Transport::post → apiUrl
//!                 ↑
//!          SessionContext (accounts, capabilities, endpoints)
//! ```
//!
//! The push multiplexer in `jmap-push` reuses the same [`JmapClient`] for
//! the ticket exchange and the push endpoint.

mod client;
mod error;
mod methods;
mod session;
mod transport;

pub use client::{JmapClient, JMAP_ACCEPT};
pub use error::{JmapError, JmapResult, TransportError, TransportResult};
pub use session::SessionContext;
pub use reqwest::header::HeaderMap;
pub use transport::{insert_header, ReqwestTransport, Transport};

#[cfg(test)]
mod tests;
