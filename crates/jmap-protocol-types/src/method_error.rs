//! Method-level and set-level errors reported by the server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Error type strings from RFC 8620 and RFC 8621.
///
/// Unknown values are kept verbatim in [`ErrorType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorType {
    ServerUnavailable,
    ServerFail,
    ServerPartialFail,
    UnknownMethod,
    InvalidArguments,
    InvalidResultReference,
    Forbidden,
    AccountNotFound,
    AccountNotSupportedByMethod,
    AccountReadOnly,
    RequestTooLarge,
    CannotCalculateChanges,
    StateMismatch,
    AnchorNotFound,
    UnsupportedSort,
    UnsupportedFilter,
    TooManyChanges,
    FromAccountNotFound,
    FromAccountNotSupportedByMethod,
    // SetError types
    OverQuota,
    TooLarge,
    RateLimit,
    NotFound,
    InvalidPatch,
    WillDestroy,
    InvalidProperties,
    Singleton,
    AlreadyExists,
    MailboxHasChild,
    MailboxHasEmail,
    BlobNotFound,
    TooManyKeywords,
    TooManyMailboxes,
    InvalidEmail,
    TooManyRecipients,
    NoRecipients,
    InvalidRecipients,
    ForbiddenMailFrom,
    ForbiddenFrom,
    ForbiddenToSend,
    CannotUnsend,
    Other(String),
}

impl ErrorType {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorType::ServerUnavailable => "serverUnavailable",
            ErrorType::ServerFail => "serverFail",
            ErrorType::ServerPartialFail => "serverPartialFail",
            ErrorType::UnknownMethod => "unknownMethod",
            ErrorType::InvalidArguments => "invalidArguments",
            ErrorType::InvalidResultReference => "invalidResultReference",
            ErrorType::Forbidden => "forbidden",
            ErrorType::AccountNotFound => "accountNotFound",
            ErrorType::AccountNotSupportedByMethod => "accountNotSupportedByMethod",
            ErrorType::AccountReadOnly => "accountReadOnly",
            ErrorType::RequestTooLarge => "requestTooLarge",
            ErrorType::CannotCalculateChanges => "cannotCalculateChanges",
            ErrorType::StateMismatch => "stateMismatch",
            ErrorType::AnchorNotFound => "anchorNotFound",
            ErrorType::UnsupportedSort => "unsupportedSort",
            ErrorType::UnsupportedFilter => "unsupportedFilter",
            ErrorType::TooManyChanges => "tooManyChanges",
            ErrorType::FromAccountNotFound => "fromAccountNotFound",
            ErrorType::FromAccountNotSupportedByMethod => "fromAccountNotSupportedByMethod",
            ErrorType::OverQuota => "overQuota",
            ErrorType::TooLarge => "tooLarge",
            ErrorType::RateLimit => "rateLimit",
            ErrorType::NotFound => "notFound",
            ErrorType::InvalidPatch => "invalidPatch",
            ErrorType::WillDestroy => "willDestroy",
            ErrorType::InvalidProperties => "invalidProperties",
            ErrorType::Singleton => "singleton",
            ErrorType::AlreadyExists => "alreadyExists",
            ErrorType::MailboxHasChild => "mailboxHasChild",
            ErrorType::MailboxHasEmail => "mailboxHasEmail",
            ErrorType::BlobNotFound => "blobNotFound",
            ErrorType::TooManyKeywords => "tooManyKeywords",
            ErrorType::TooManyMailboxes => "tooManyMailboxes",
            ErrorType::InvalidEmail => "invalidEmail",
            ErrorType::TooManyRecipients => "tooManyRecipients",
            ErrorType::NoRecipients => "noRecipients",
            ErrorType::InvalidRecipients => "invalidRecipients",
            ErrorType::ForbiddenMailFrom => "forbiddenMailFrom",
            ErrorType::ForbiddenFrom => "forbiddenFrom",
            ErrorType::ForbiddenToSend => "forbiddenToSend",
            ErrorType::CannotUnsend => "cannotUnsend",
            ErrorType::Other(raw) => raw,
        }
    }
}

impl From<String> for ErrorType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "serverUnavailable" => ErrorType::ServerUnavailable,
            "serverFail" => ErrorType::ServerFail,
            "serverPartialFail" => ErrorType::ServerPartialFail,
            "unknownMethod" => ErrorType::UnknownMethod,
            "invalidArguments" => ErrorType::InvalidArguments,
            "invalidResultReference" => ErrorType::InvalidResultReference,
            "forbidden" => ErrorType::Forbidden,
            "accountNotFound" => ErrorType::AccountNotFound,
            "accountNotSupportedByMethod" => ErrorType::AccountNotSupportedByMethod,
            "accountReadOnly" => ErrorType::AccountReadOnly,
            "requestTooLarge" => ErrorType::RequestTooLarge,
            "cannotCalculateChanges" => ErrorType::CannotCalculateChanges,
            "stateMismatch" => ErrorType::StateMismatch,
            "anchorNotFound" => ErrorType::AnchorNotFound,
            "unsupportedSort" => ErrorType::UnsupportedSort,
            "unsupportedFilter" => ErrorType::UnsupportedFilter,
            "tooManyChanges" => ErrorType::TooManyChanges,
            "fromAccountNotFound" => ErrorType::FromAccountNotFound,
            "fromAccountNotSupportedByMethod" => ErrorType::FromAccountNotSupportedByMethod,
            "overQuota" => ErrorType::OverQuota,
            "tooLarge" => ErrorType::TooLarge,
            "rateLimit" => ErrorType::RateLimit,
            "notFound" => ErrorType::NotFound,
            "invalidPatch" => ErrorType::InvalidPatch,
            "willDestroy" => ErrorType::WillDestroy,
            "invalidProperties" => ErrorType::InvalidProperties,
            "singleton" => ErrorType::Singleton,
            "alreadyExists" => ErrorType::AlreadyExists,
            "mailboxHasChild" => ErrorType::MailboxHasChild,
            "mailboxHasEmail" => ErrorType::MailboxHasEmail,
            "blobNotFound" => ErrorType::BlobNotFound,
            "tooManyKeywords" => ErrorType::TooManyKeywords,
            "tooManyMailboxes" => ErrorType::TooManyMailboxes,
            "invalidEmail" => ErrorType::InvalidEmail,
            "tooManyRecipients" => ErrorType::TooManyRecipients,
            "noRecipients" => ErrorType::NoRecipients,
            "invalidRecipients" => ErrorType::InvalidRecipients,
            "forbiddenMailFrom" => ErrorType::ForbiddenMailFrom,
            "forbiddenFrom" => ErrorType::ForbiddenFrom,
            "forbiddenToSend" => ErrorType::ForbiddenToSend,
            "cannotUnsend" => ErrorType::CannotUnsend,
            _ => ErrorType::Other(raw),
        }
    }
}

impl From<ErrorType> for String {
    fn from(error_type: ErrorType) -> Self {
        match error_type {
            ErrorType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of an `["error", {...}, callId]` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any other fields the server attached (e.g. `properties`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MethodError {
    pub fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            description: None,
            extra: Map::new(),
        }
    }

    /// Offending property names for `invalidProperties`.
    pub fn properties(&self) -> Vec<String> {
        self.extra
            .get("properties")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.error_type, description),
            None => write!(f, "{}", self.error_type),
        }
    }
}

impl std::error::Error for MethodError {}

/// Per-object failure inside a `/set` response. Same shape as a method error.
pub type SetError = MethodError;
