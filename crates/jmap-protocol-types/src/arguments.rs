//! Typed method arguments and responses for the standard methods.
//!
//! `accountId` is always serialized, as `null` when unset, so the
//! dispatcher can fill in the default account before the call goes out.

use crate::method_error::SetError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `Foo/get` arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetArguments {
    pub account_id: Option<String>,
    /// `None` fetches every object.
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
    /// Method-specific extras (e.g. `fetchTextBodyValues` on `Email/get`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GetArguments {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(properties.into_iter().map(Into::into).collect());
        self
    }
}

/// `Foo/get` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse<T = Value> {
    pub account_id: String,
    pub state: String,
    pub list: Vec<T>,
    #[serde(default)]
    pub not_found: Vec<String>,
}

/// `Foo/changes` arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesArguments {
    pub account_id: Option<String>,
    pub since_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_changes: Option<u64>,
}

impl ChangesArguments {
    pub fn since(state: impl Into<String>) -> Self {
        Self {
            account_id: None,
            since_state: state.into(),
            max_changes: None,
        }
    }
}

/// `Foo/changes` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesResponse {
    pub account_id: String,
    pub old_state: String,
    pub new_state: String,
    pub has_more_changes: bool,
    #[serde(default)]
    pub created: Vec<String>,
    #[serde(default)]
    pub updated: Vec<String>,
    #[serde(default)]
    pub destroyed: Vec<String>,
    /// Only on `Mailbox/changes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_properties: Option<Vec<String>>,
}

/// `Foo/set` arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetArguments {
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_in_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<IndexMap<String, Value>>,
    /// Object id → patch object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<IndexMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destroy: Option<Vec<String>>,
    /// Method-specific extras (e.g. `onSuccessUpdateEmail`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SetArguments {
    pub fn create(mut self, creation_id: impl Into<String>, object: Value) -> Self {
        self.create
            .get_or_insert_with(IndexMap::new)
            .insert(creation_id.into(), object);
        self
    }

    pub fn update(mut self, id: impl Into<String>, patch: Value) -> Self {
        self.update
            .get_or_insert_with(IndexMap::new)
            .insert(id.into(), patch);
        self
    }

    pub fn destroy(mut self, id: impl Into<String>) -> Self {
        self.destroy.get_or_insert_with(Vec::new).push(id.into());
        self
    }
}

/// `Foo/set` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResponse<T = Value> {
    pub account_id: String,
    #[serde(default)]
    pub old_state: Option<String>,
    pub new_state: String,
    #[serde(default)]
    pub created: Option<IndexMap<String, T>>,
    /// Id → server-set properties, or `null` when nothing else changed.
    #[serde(default)]
    pub updated: Option<IndexMap<String, Option<Value>>>,
    #[serde(default)]
    pub destroyed: Option<Vec<String>>,
    #[serde(default)]
    pub not_created: Option<IndexMap<String, SetError>>,
    #[serde(default)]
    pub not_updated: Option<IndexMap<String, SetError>>,
    #[serde(default)]
    pub not_destroyed: Option<IndexMap<String, SetError>>,
}

/// Sort criterion for `Foo/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparator {
    pub property: String,
    #[serde(default = "ascending")]
    pub is_ascending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

fn ascending() -> bool {
    true
}

impl Comparator {
    pub fn ascending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            is_ascending: true,
            collation: None,
        }
    }

    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            is_ascending: false,
            ..Self::ascending(property)
        }
    }
}

/// `Foo/query` arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryArguments {
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Comparator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculate_total: Option<bool>,
    /// Method-specific extras (e.g. `collapseThreads`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `Foo/query` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub account_id: String,
    pub query_state: String,
    pub can_calculate_changes: bool,
    pub position: u64,
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// One message to import from an uploaded blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailImport {
    pub blob_id: String,
    pub mailbox_ids: IndexMap<String, bool>,
    #[serde(default)]
    pub keywords: IndexMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
}

impl EmailImport {
    pub fn new<I, S>(blob_id: impl Into<String>, mailbox_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blob_id: blob_id.into(),
            mailbox_ids: mailbox_ids.into_iter().map(|id| (id.into(), true)).collect(),
            keywords: IndexMap::new(),
            received_at: None,
        }
    }
}

/// `Email/import` arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailImportArguments {
    pub account_id: Option<String>,
    pub if_in_state: Option<String>,
    /// Creation id → import.
    pub emails: IndexMap<String, EmailImport>,
}

/// `Email/import` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailImportResponse {
    pub account_id: String,
    #[serde(default)]
    pub old_state: Option<String>,
    pub new_state: String,
    #[serde(default)]
    pub created: Option<IndexMap<String, Value>>,
    #[serde(default)]
    pub not_created: Option<IndexMap<String, SetError>>,
}

/// Body returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub account_id: String,
    pub blob_id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
}
