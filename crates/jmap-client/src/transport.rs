//! HTTP transport seam.
//!
//! The client and the push multiplexer only talk to the network through
//! [`Transport`], so tests can substitute a recording mock.

use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

/// Insert `name: value` into `headers`, replacing any existing value.
///
/// Names compare case-insensitively. Invalid names or values are rejected
/// here, before anything is sent.
pub fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> TransportResult<()> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| TransportError::InvalidHeader(format!("{name}: {e}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| TransportError::InvalidHeader(format!("{name}: {e}")))?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// Authenticated JSON over HTTP.
///
/// Implementations return the parsed body for 2xx responses and
/// [`TransportError::Status`] for everything else.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and parse the body as JSON.
    async fn get(&self, url: &str, headers: &HeaderMap) -> TransportResult<Value>;

    /// POST `body` (or an empty body) to `url` and parse the reply as JSON.
    async fn post(&self, url: &str, body: Option<&Value>, headers: &HeaderMap)
        -> TransportResult<Value>;

    /// POST raw bytes to `url` and parse the reply as JSON.
    async fn upload(&self, url: &str, bytes: Vec<u8>, headers: &HeaderMap)
        -> TransportResult<Value>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxy, timeouts, TLS roots).
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> TransportResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body_len = body.len(), "JMAP HTTP error");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> TransportResult<Value> {
        debug!(url, "GET");
        let request = self.http_client.get(url).headers(headers.clone());
        self.send(request).await
    }

    async fn post(
        &self,
        url: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
    ) -> TransportResult<Value> {
        debug!(url, has_body = body.is_some(), "POST");
        let mut request = self.http_client.post(url).headers(headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await
    }

    async fn upload(
        &self,
        url: &str,
        bytes: Vec<u8>,
        headers: &HeaderMap,
    ) -> TransportResult<Value> {
        debug!(url, size = bytes.len(), "POST blob");
        let request = self
            .http_client
            .post(url)
            .headers(headers.clone())
            .body(bytes);
        self.send(request).await
    }
}
