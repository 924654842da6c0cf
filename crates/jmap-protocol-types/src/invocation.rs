//! Invocations and the request/response envelopes that carry them.

use crate::session::{MAIL_CAPABILITY, SUBMISSION_CAPABILITY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Name the server uses in place of a method name when the call failed.
pub const ERROR_MARKER: &str = "error";

/// Call id of the single invocation this client puts in a request.
pub const DEFAULT_CALL_ID: &str = "0";

/// Methods the client dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodName {
    #[serde(rename = "Mailbox/get")]
    MailboxGet,
    #[serde(rename = "Mailbox/changes")]
    MailboxChanges,
    #[serde(rename = "Mailbox/set")]
    MailboxSet,
    #[serde(rename = "Email/get")]
    EmailGet,
    #[serde(rename = "Email/changes")]
    EmailChanges,
    #[serde(rename = "Email/query")]
    EmailQuery,
    #[serde(rename = "Email/set")]
    EmailSet,
    #[serde(rename = "Email/import")]
    EmailImport,
    #[serde(rename = "Thread/get")]
    ThreadGet,
    #[serde(rename = "EmailSubmission/get")]
    EmailSubmissionGet,
    #[serde(rename = "EmailSubmission/changes")]
    EmailSubmissionChanges,
    #[serde(rename = "EmailSubmission/set")]
    EmailSubmissionSet,
}

impl MethodName {
    pub const ALL: [MethodName; 12] = [
        MethodName::MailboxGet,
        MethodName::MailboxChanges,
        MethodName::MailboxSet,
        MethodName::EmailGet,
        MethodName::EmailChanges,
        MethodName::EmailQuery,
        MethodName::EmailSet,
        MethodName::EmailImport,
        MethodName::ThreadGet,
        MethodName::EmailSubmissionGet,
        MethodName::EmailSubmissionChanges,
        MethodName::EmailSubmissionSet,
    ];

    /// Wire name, e.g. `Mailbox/get`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodName::MailboxGet => "Mailbox/get",
            MethodName::MailboxChanges => "Mailbox/changes",
            MethodName::MailboxSet => "Mailbox/set",
            MethodName::EmailGet => "Email/get",
            MethodName::EmailChanges => "Email/changes",
            MethodName::EmailQuery => "Email/query",
            MethodName::EmailSet => "Email/set",
            MethodName::EmailImport => "Email/import",
            MethodName::ThreadGet => "Thread/get",
            MethodName::EmailSubmissionGet => "EmailSubmission/get",
            MethodName::EmailSubmissionChanges => "EmailSubmission/changes",
            MethodName::EmailSubmissionSet => "EmailSubmission/set",
        }
    }

    /// Capability whose primary account serves this method.
    pub fn capability(&self) -> &'static str {
        match self {
            MethodName::EmailSubmissionGet
            | MethodName::EmailSubmissionChanges
            | MethodName::EmailSubmissionSet => SUBMISSION_CAPABILITY,
            _ => MAIL_CAPABILITY,
        }
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodName::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("unknown method: {s}"))
    }
}

/// `[name, arguments, callId]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation(pub String, pub Value, pub String);

impl Invocation {
    pub fn new(name: impl Into<String>, arguments: Value, call_id: impl Into<String>) -> Self {
        Self(name.into(), arguments, call_id.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn arguments(&self) -> &Value {
        &self.1
    }

    pub fn call_id(&self) -> &str {
        &self.2
    }

    /// Whether the server reported a method-level error.
    pub fn is_error(&self) -> bool {
        self.0 == ERROR_MARKER
    }

    pub fn into_arguments(self) -> Value {
        self.1
    }
}

/// Request envelope (POST body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub using: Vec<String>,
    pub method_calls: Vec<Invocation>,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default)]
    pub session_state: String,
    pub method_responses: Vec<Invocation>,
}
