//! Test harness: a recording in-memory transport and session fixtures.

use crate::error::{TransportError, TransportResult};
use crate::transport::Transport;
use reqwest::header::HeaderMap;
use crate::JmapClient;
use async_trait::async_trait;
use jmap_config_and_utils::ClientConfig;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const SESSION_URL: &str = "https://jmap.test/jmap/session";
pub const API_URL: &str = "https://jmap.test/jmap";

/// One HTTP call seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub verb: &'static str,
    pub url: String,
    pub body: Option<Value>,
    pub bytes: Option<Vec<u8>>,
    pub headers: HeaderMap,
}

/// Canned reply for the next call.
#[derive(Debug)]
pub enum Reply {
    Json(Value),
    Status(u16, String),
}

/// Transport that records every call and replays queued replies.
///
/// GETs of the session URL answer with the configured session unless a
/// reply is queued.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<RecordedCall>>,
    replies: Mutex<VecDeque<Reply>>,
    session: Mutex<Option<Value>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_session(session: Value) -> Arc<Self> {
        let transport = Self::default();
        *transport.session.lock().unwrap() = Some(session);
        Arc::new(transport)
    }

    pub fn queue(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn queue_json(&self, value: Value) {
        self.queue(Reply::Json(value));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.verb == "POST")
            .collect()
    }

    fn record(&self, call: RecordedCall) -> TransportResult<Value> {
        let is_session = call.verb == "GET" && call.url == SESSION_URL;
        self.calls.lock().unwrap().push(call);

        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return match reply {
                Reply::Json(value) => Ok(value),
                Reply::Status(status, body) => Err(TransportError::Status { status, body }),
            };
        }
        match self.session.lock().unwrap().clone() {
            Some(session) if is_session => Ok(session),
            _ => Err(TransportError::Status {
                status: 404,
                body: "no reply queued".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> TransportResult<Value> {
        self.record(RecordedCall {
            verb: "GET",
            url: url.to_string(),
            body: None,
            bytes: None,
            headers: headers.clone(),
        })
    }

    async fn post(
        &self,
        url: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
    ) -> TransportResult<Value> {
        self.record(RecordedCall {
            verb: "POST",
            url: url.to_string(),
            body: body.cloned(),
            bytes: None,
            headers: headers.clone(),
        })
    }

    async fn upload(
        &self,
        url: &str,
        bytes: Vec<u8>,
        headers: &HeaderMap,
    ) -> TransportResult<Value> {
        self.record(RecordedCall {
            verb: "UPLOAD",
            url: url.to_string(),
            body: None,
            bytes: Some(bytes),
            headers: headers.clone(),
        })
    }
}

/// Session with primary mail account `A1` listed second.
pub fn session_json() -> Value {
    json!({
        "capabilities": {
            "urn:ietf:params:jmap:core": { "maxCallsInRequest": 16 },
            "urn:ietf:params:jmap:mail": {},
            "urn:ietf:params:jmap:submission": {}
        },
        "accounts": {
            "Z9": { "name": "shared@jmap.test", "isPersonal": false },
            "A1": { "name": "bob@jmap.test", "isPersonal": true }
        },
        "primaryAccounts": { "urn:ietf:params:jmap:mail": "A1" },
        "username": "bob@jmap.test",
        "apiUrl": API_URL,
        "downloadUrl": "https://jmap.test/download/{accountId}/{blobId}",
        "uploadUrl": "https://jmap.test/upload/{accountId}",
        "eventSourceUrl": "https://jmap.test/eventSource",
        "state": "s0"
    })
}

pub fn config() -> ClientConfig {
    ClientConfig::new(SESSION_URL).with_access_token("t0k")
}

/// Client over `transport` with the session already fetched.
pub async fn ready_client(transport: Arc<MockTransport>) -> JmapClient {
    let client = JmapClient::with_transport(&config(), transport).unwrap();
    client.fetch_session(&HeaderMap::new()).await.unwrap();
    client
}

/// Envelope with one invocation.
pub fn envelope(name: &str, payload: Value, call_id: &str) -> Value {
    json!({
        "sessionState": "s0",
        "methodResponses": [[name, payload, call_id]]
    })
}
