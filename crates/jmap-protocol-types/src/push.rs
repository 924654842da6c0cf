//! WebSocket push frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// `@type` of a state-change notification.
pub const STATE_CHANGE_TYPE: &str = "StateChange";

/// Entity types a client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Mailbox,
    Email,
    EmailSubmission,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [
        EntityType::Mailbox,
        EntityType::Email,
        EntityType::EmailSubmission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Mailbox => "Mailbox",
            EntityType::Email => "Email",
            EntityType::EmailSubmission => "EmailSubmission",
        }
    }

    /// Case-insensitive lookup used by command-line parsing.
    pub fn parse(name: &str) -> Option<Self> {
        EntityType::ALL
            .into_iter()
            .find(|entity| entity.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account id → new state token for one entity type.
pub type AccountStates = BTreeMap<String, String>;

/// `{"@type": "StateChange", "changed": {accountId: {type: state}}}`.
///
/// Per-account entries are kept as raw JSON so one odd value does not
/// reject the whole frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateChange {
    #[serde(default)]
    pub changed: HashMap<String, Value>,
}

impl StateChange {
    /// Accounts that reported a new state for `entity`.
    ///
    /// `None` when no account did. Empty or non-string state tokens are
    /// skipped.
    pub fn states_for(&self, entity: EntityType) -> Option<AccountStates> {
        let states: AccountStates = self
            .changed
            .iter()
            .filter_map(|(account_id, types)| {
                types
                    .get(entity.as_str())
                    .and_then(Value::as_str)
                    .filter(|state| !state.is_empty())
                    .map(|state| (account_id.clone(), state.to_string()))
            })
            .collect();

        (!states.is_empty()).then_some(states)
    }
}

/// Frames the client writes to the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum OutboundFrame {
    #[serde(rename_all = "camelCase")]
    WebSocketPushEnable {
        data_types: Vec<EntityType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        push_state: Option<String>,
    },
    WebSocketPushDisable,
}

impl OutboundFrame {
    /// Enable push for `data_types`, starting from now.
    pub fn enable(data_types: &[EntityType]) -> Self {
        OutboundFrame::WebSocketPushEnable {
            data_types: data_types.to_vec(),
            push_state: None,
        }
    }
}
