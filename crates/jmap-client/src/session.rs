//! Session context: the fetched session plus the endpoints derived from it.

use crate::error::{JmapError, JmapResult};
use crate::transport::Transport;
use jmap_protocol_types::{Session, DEFAULT_USING, WEBSOCKET_CAPABILITY, WS_TICKET_CAPABILITY};
use reqwest::header::HeaderMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Holds the latest session snapshot.
///
/// The snapshot is replaced wholesale on every successful fetch and never
/// mutated in place. Readers get an `Arc` so a concurrent re-fetch cannot
/// change what they are looking at.
pub struct SessionContext {
    session_url: String,
    api_url: Option<String>,
    push_url: Option<String>,
    session: RwLock<Option<Arc<Session>>>,
}

impl SessionContext {
    pub fn new(session_url: impl Into<String>) -> Self {
        Self {
            session_url: session_url.into(),
            api_url: None,
            push_url: None,
            session: RwLock::new(None),
        }
    }

    /// Use `url` instead of the session's `apiUrl`.
    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        self.api_url = url;
        self
    }

    /// Use `url` instead of the session's WebSocket URL.
    pub fn with_push_url(mut self, url: Option<String>) -> Self {
        self.push_url = url;
        self
    }

    pub fn session_url(&self) -> &str {
        &self.session_url
    }

    /// GET the session resource and store it.
    ///
    /// A failed fetch leaves the previous snapshot in place.
    pub async fn fetch(
        &self,
        transport: &dyn Transport,
        headers: &HeaderMap,
    ) -> JmapResult<Arc<Session>> {
        let body = transport.get(&self.session_url, headers).await?;
        let session: Session = serde_json::from_value(body)?;

        info!(
            username = %session.username,
            state = %session.state,
            accounts = session.accounts.len(),
            "JMAP session fetched"
        );

        let session = Arc::new(session);
        self.replace(session.clone());
        Ok(session)
    }

    /// Install a session obtained elsewhere.
    pub fn replace(&self, session: Arc<Session>) {
        *self.write() = Some(session);
    }

    /// The current snapshot.
    pub fn current(&self) -> JmapResult<Arc<Session>> {
        self.read().ok_or(JmapError::SessionNotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.read().is_some()
    }

    /// Account ids in session order.
    pub fn account_ids(&self) -> JmapResult<Vec<String>> {
        Ok(self.current()?.accounts.keys().cloned().collect())
    }

    /// Primary account for `urn`.
    pub fn primary_account_id(&self, urn: &str) -> JmapResult<String> {
        self.current()?
            .primary_accounts
            .get(urn)
            .cloned()
            .ok_or_else(|| JmapError::NoPrimaryAccount(urn.to_string()))
    }

    /// First account the session lists.
    pub fn first_account_id(&self) -> JmapResult<String> {
        self.current()?
            .accounts
            .keys()
            .next()
            .cloned()
            .ok_or(JmapError::NoAccount)
    }

    /// Account used when a call does not name one: the primary account for
    /// `urn`, else the first listed account.
    pub fn default_account_id(&self, urn: &str) -> JmapResult<String> {
        let session = self.current()?;
        if let Some(id) = session.primary_accounts.get(urn) {
            return Ok(id.clone());
        }
        let first = session.accounts.keys().next().cloned();
        debug!(urn, account_id = ?first, "No primary account, using first account");
        first.ok_or(JmapError::NoAccount)
    }

    /// Endpoint for method calls.
    pub fn api_url(&self) -> JmapResult<String> {
        if let Some(url) = &self.api_url {
            return Ok(url.clone());
        }
        Ok(self.current()?.api_url.clone())
    }

    /// WebSocket endpoint.
    pub fn push_url(&self) -> JmapResult<String> {
        if let Some(url) = &self.push_url {
            return Ok(url.clone());
        }
        self.current()?
            .capabilities
            .websocket()?
            .map(|ws| ws.url)
            .ok_or_else(|| JmapError::MissingCapability(WEBSOCKET_CAPABILITY.to_string()))
    }

    /// Endpoint that issues push tickets.
    pub fn ticket_url(&self) -> JmapResult<String> {
        self.current()?
            .capabilities
            .ws_ticket()?
            .map(|ticket| ticket.generation_endpoint)
            .ok_or_else(|| JmapError::MissingCapability(WS_TICKET_CAPABILITY.to_string()))
    }

    /// Upload URL template (`{accountId}` not yet expanded).
    pub fn upload_url(&self) -> JmapResult<String> {
        let session = self.current()?;
        if session.upload_url.is_empty() {
            return Err(JmapError::MalformedResponse(
                "session has no uploadUrl".to_string(),
            ));
        }
        Ok(session.upload_url.clone())
    }

    /// Capability URNs to declare in `using`.
    pub fn negotiated_capabilities(&self) -> Vec<String> {
        match self.read() {
            Some(session) => session.capabilities.urns(),
            None => DEFAULT_USING.iter().map(|urn| urn.to_string()).collect(),
        }
    }

    fn read(&self) -> Option<Arc<Session>> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<Session>>> {
        self.session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
