//! Session resource and capability types.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Core protocol capability.
pub const CORE_CAPABILITY: &str = "urn:ietf:params:jmap:core";
/// Mail capability (Mailbox, Email, Thread).
pub const MAIL_CAPABILITY: &str = "urn:ietf:params:jmap:mail";
/// Submission capability (EmailSubmission).
pub const SUBMISSION_CAPABILITY: &str = "urn:ietf:params:jmap:submission";
/// WebSocket transport capability (RFC 8887).
pub const WEBSOCKET_CAPABILITY: &str = "urn:ietf:params:jmap:websocket";
/// Ticket-based WebSocket authentication extension.
pub const WS_TICKET_CAPABILITY: &str = "com:linagora:params:jmap:ws:ticket";

/// Capabilities declared when no session has been fetched yet.
pub const DEFAULT_USING: [&str; 2] = [CORE_CAPABILITY, MAIL_CAPABILITY];

/// Capability URN → capability-specific configuration, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(IndexMap<String, Value>);

impl Capabilities {
    /// Capability URNs in the order the server listed them.
    pub fn urns(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Whether `urn` is advertised.
    pub fn contains(&self, urn: &str) -> bool {
        self.0.contains_key(urn)
    }

    /// Raw configuration for `urn`.
    pub fn raw(&self, urn: &str) -> Option<&Value> {
        self.0.get(urn)
    }

    /// Decode the configuration for `urn`.
    ///
    /// `Ok(None)` when the capability is absent; an error when it is present
    /// but does not have the expected shape.
    pub fn get<T: DeserializeOwned>(&self, urn: &str) -> Result<Option<T>, serde_json::Error> {
        self.0
            .get(urn)
            .map(|value| T::deserialize(value))
            .transpose()
    }

    /// Core limits.
    pub fn core(&self) -> Result<Option<CoreCapability>, serde_json::Error> {
        self.get(CORE_CAPABILITY)
    }

    /// WebSocket endpoint.
    pub fn websocket(&self) -> Result<Option<WebSocketCapability>, serde_json::Error> {
        self.get(WEBSOCKET_CAPABILITY)
    }

    /// Push ticket endpoint.
    pub fn ws_ticket(&self) -> Result<Option<WsTicketCapability>, serde_json::Error> {
        self.get(WS_TICKET_CAPABILITY)
    }
}

impl FromIterator<(String, Value)> for Capabilities {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// `urn:ietf:params:jmap:core` limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreCapability {
    pub max_size_upload: u64,
    pub max_concurrent_upload: u64,
    pub max_size_request: u64,
    pub max_concurrent_requests: u64,
    pub max_calls_in_request: u64,
    pub max_objects_in_get: u64,
    pub max_objects_in_set: u64,
    #[serde(default)]
    pub collation_algorithms: Vec<String>,
}

/// `urn:ietf:params:jmap:websocket` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketCapability {
    pub url: String,
    #[serde(default)]
    pub supports_push: bool,
}

/// `com:linagora:params:jmap:ws:ticket` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsTicketCapability {
    pub generation_endpoint: String,
    #[serde(default)]
    pub revocation_endpoint: Option<String>,
}

/// An account the authenticated user can access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub is_personal: bool,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default)]
    pub account_capabilities: IndexMap<String, Value>,
}

/// The session resource returned by the session URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub capabilities: Capabilities,
    /// Accounts keyed by id, in server order.
    pub accounts: IndexMap<String, Account>,
    /// Capability URN → preferred account id.
    #[serde(default)]
    pub primary_accounts: IndexMap<String, String>,
    #[serde(default)]
    pub username: String,
    pub api_url: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub upload_url: String,
    #[serde(default)]
    pub event_source_url: String,
    pub state: String,
}
