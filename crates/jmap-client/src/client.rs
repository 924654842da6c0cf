//! Invocation dispatcher.
//!
//! Every call is a request with exactly one invocation, call id `"0"`.

use crate::error::{JmapError, JmapResult, TransportResult};
use crate::session::SessionContext;
use crate::transport::{insert_header, ReqwestTransport, Transport};
use jmap_config_and_utils::ClientConfig;
use jmap_protocol_types::{
    Invocation, MethodError, MethodName, Request, Response, Session, UploadResponse,
    DEFAULT_CALL_ID,
};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// `Accept` value every call sends.
pub const JMAP_ACCEPT: &str = "application/json;jmapVersion=rfc-8621";

const ACCOUNT_ID: &str = "accountId";

/// JMAP client: session context plus dispatch over a [`Transport`].
///
/// Cheap to clone; clones share the session snapshot.
#[derive(Clone)]
pub struct JmapClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionContext>,
    headers: HeaderMap,
}

impl JmapClient {
    /// Build a client from configuration with the reqwest transport.
    ///
    /// Fails if a configured header name or value is not valid HTTP.
    pub fn new(config: &ClientConfig) -> JmapResult<Self> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Build a client over a custom transport.
    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> JmapResult<Self> {
        let session = SessionContext::new(config.session_url.clone())
            .with_api_url(config.api_url.clone())
            .with_push_url(config.push_url.clone());

        Ok(Self {
            transport,
            session: Arc::new(session),
            headers: default_headers(config)?,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Headers sent with every HTTP call.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Fetch the session, with `extra_headers` applied on top of the
    /// configured ones.
    pub async fn fetch_session(&self, extra_headers: &HeaderMap) -> JmapResult<Arc<Session>> {
        let mut headers = self.headers.clone();
        // Replaces configured values of the same name
        headers.extend(extra_headers.clone());
        self.session.fetch(self.transport.as_ref(), &headers).await
    }

    /// Build the request envelope for `method` without sending it.
    ///
    /// A null or absent `accountId` is replaced with the default account
    /// for the method's capability.
    pub fn build_request<A: Serialize>(&self, method: MethodName, args: &A) -> JmapResult<Request> {
        let mut arguments = match serde_json::to_value(args)? {
            Value::Object(map) => map,
            other => {
                return Err(JmapError::InvalidArguments(format!(
                    "{method} arguments must be an object, got {other}"
                )))
            }
        };

        let needs_account = arguments.get(ACCOUNT_ID).map_or(true, Value::is_null);
        if needs_account {
            let account_id = self.session.default_account_id(method.capability())?;
            arguments.insert(ACCOUNT_ID.to_string(), Value::String(account_id));
        }

        Ok(Request {
            using: self.session.negotiated_capabilities(),
            method_calls: vec![Invocation::new(
                method.as_str(),
                Value::Object(arguments),
                DEFAULT_CALL_ID,
            )],
        })
    }

    /// Dispatch one invocation and decode its result.
    pub async fn invoke<A, R>(&self, method: MethodName, args: &A) -> JmapResult<R>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let request = self.build_request(method, args)?;
        let api_url = self.session.api_url()?;
        let body = serde_json::to_value(&request)?;

        debug!(method = %method, url = %api_url, "Dispatching JMAP call");
        let raw = self
            .transport
            .post(&api_url, Some(&body), &self.headers)
            .await?;

        let payload = unwrap_single(method, raw)?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Upload a blob for the default mail account.
    pub async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> JmapResult<UploadResponse> {
        let account_id = self.session.default_account_id(MethodName::EmailImport.capability())?;
        let url = self
            .session
            .upload_url()?
            .replace("{accountId}", &account_id);
        let mut headers = self.headers.clone();
        insert_header(&mut headers, CONTENT_TYPE.as_str(), content_type)?;

        debug!(url = %url, size = bytes.len(), content_type, "Uploading blob");
        let raw = self.transport.upload(&url, bytes, &headers).await?;
        Ok(serde_json::from_value(raw)?)
    }
}

/// Headers from configuration: `Accept`, bearer token, then configured extras.
fn default_headers(config: &ClientConfig) -> TransportResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    insert_header(&mut headers, ACCEPT.as_str(), JMAP_ACCEPT)?;
    if let Some(token) = &config.access_token {
        insert_header(&mut headers, AUTHORIZATION.as_str(), &format!("Bearer {token}"))?;
    }
    for (name, value) in &config.headers {
        insert_header(&mut headers, name, value)?;
    }
    Ok(headers)
}

/// Pull the payload of the single response invocation out of the envelope.
fn unwrap_single(method: MethodName, raw: Value) -> JmapResult<Value> {
    let response: Response = serde_json::from_value(raw)
        .map_err(|e| JmapError::MalformedResponse(format!("bad response envelope: {e}")))?;

    let invocation = response
        .method_responses
        .into_iter()
        .next()
        .ok_or_else(|| JmapError::MalformedResponse("no method responses".to_string()))?;

    if invocation.call_id() != DEFAULT_CALL_ID {
        return Err(JmapError::MalformedResponse(format!(
            "unexpected call id {:?}",
            invocation.call_id()
        )));
    }

    if invocation.is_error() {
        let error: MethodError = serde_json::from_value(invocation.into_arguments())
            .map_err(|e| JmapError::MalformedResponse(format!("bad error response: {e}")))?;
        debug!(method = %method, error = %error, "JMAP method error");
        return Err(JmapError::Method(error));
    }

    if invocation.name() != method.as_str() {
        warn!(
            expected = %method,
            actual = invocation.name(),
            "Response method name does not match request"
        );
    }

    Ok(invocation.into_arguments())
}
