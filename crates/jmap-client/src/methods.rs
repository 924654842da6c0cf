//! Typed wrappers over [`JmapClient::invoke`].

use crate::client::JmapClient;
use crate::error::JmapResult;
use jmap_protocol_types::{
    ChangesArguments, ChangesResponse, EmailImportArguments, EmailImportResponse, GetArguments,
    GetResponse, MethodName, QueryArguments, QueryResponse, SetArguments, SetResponse,
};
use serde_json::Value;

impl JmapClient {
    pub async fn mailbox_get(&self, args: &GetArguments) -> JmapResult<GetResponse> {
        self.invoke(MethodName::MailboxGet, args).await
    }

    pub async fn mailbox_changes(&self, args: &ChangesArguments) -> JmapResult<ChangesResponse> {
        self.invoke(MethodName::MailboxChanges, args).await
    }

    pub async fn mailbox_set(&self, args: &SetArguments) -> JmapResult<SetResponse> {
        self.invoke(MethodName::MailboxSet, args).await
    }

    pub async fn email_get(&self, args: &GetArguments) -> JmapResult<GetResponse> {
        self.invoke(MethodName::EmailGet, args).await
    }

    pub async fn email_changes(&self, args: &ChangesArguments) -> JmapResult<ChangesResponse> {
        self.invoke(MethodName::EmailChanges, args).await
    }

    pub async fn email_query(&self, args: &QueryArguments) -> JmapResult<QueryResponse> {
        self.invoke(MethodName::EmailQuery, args).await
    }

    pub async fn email_set(&self, args: &SetArguments) -> JmapResult<SetResponse> {
        self.invoke(MethodName::EmailSet, args).await
    }

    pub async fn email_import(
        &self,
        args: &EmailImportArguments,
    ) -> JmapResult<EmailImportResponse> {
        self.invoke(MethodName::EmailImport, args).await
    }

    pub async fn thread_get(&self, args: &GetArguments) -> JmapResult<GetResponse> {
        self.invoke(MethodName::ThreadGet, args).await
    }

    pub async fn email_submission_get(&self, args: &GetArguments) -> JmapResult<GetResponse> {
        self.invoke(MethodName::EmailSubmissionGet, args).await
    }

    pub async fn email_submission_changes(
        &self,
        args: &ChangesArguments,
    ) -> JmapResult<ChangesResponse> {
        self.invoke(MethodName::EmailSubmissionChanges, args).await
    }

    pub async fn email_submission_set(&self, args: &SetArguments) -> JmapResult<SetResponse> {
        self.invoke(MethodName::EmailSubmissionSet, args).await
    }

    /// Untyped call, for methods whose shape the caller builds by hand.
    pub async fn call(&self, method: MethodName, args: &Value) -> JmapResult<Value> {
        self.invoke(method, args).await
    }
}
