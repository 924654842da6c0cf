//! Test harness for push multiplexer tests.
//!
//! Provides:
//! - MockPushServer: a local WebSocket server that records handshake URIs
//!   and inbound frames, and can push, close or drop on command
//! - TicketTransport: a Transport serving the session and issuing tickets
//! - TestHarness: wires both to a PushMultiplexer

use crate::{EntityStream, PushMultiplexer};
use async_trait::async_trait;
use futures_util::{FutureExt, SinkExt, StreamExt};
use jmap_client::{HeaderMap, JmapClient, Transport, TransportError, TransportResult};
use jmap_config_and_utils::ClientConfig;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

pub const SESSION_URL: &str = "http://jmap.test/jmap/session";
pub const TICKET_URL: &str = "http://jmap.test/jmap/ws/ticket";

/// How long tests wait for something that should happen.
pub const WAIT: Duration = Duration::from_secs(5);

/// Command for the currently connected client.
#[derive(Debug)]
pub enum ServerCommand {
    /// Send a text frame.
    Send(String),
    /// Start a clean close handshake.
    Close,
    /// Drop the TCP connection without a close handshake.
    Drop,
}

#[derive(Default)]
struct ServerState {
    uris: Mutex<Vec<String>>,
    frames: Mutex<Vec<Value>>,
    connections: AtomicUsize,
    current: Mutex<Option<mpsc::UnboundedSender<ServerCommand>>>,
}

/// Local WebSocket server speaking just enough of the push protocol.
pub struct MockPushServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    accept_loop: tokio::task::JoinHandle<()>,
}

impl MockPushServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState::default());

        let accept_state = state.clone();
        let accept_loop = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(serve_connection(stream, state));
            }
        });

        Self {
            addr,
            state,
            accept_loop,
        }
    }

    /// Push URL as the session advertises it (http, mapped to ws by the client).
    pub fn push_url(&self) -> String {
        format!("http://{}/jmap/ws", self.addr)
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn uris(&self) -> Vec<String> {
        self.state.uris.lock().unwrap().clone()
    }

    pub fn frames(&self) -> Vec<Value> {
        self.state.frames.lock().unwrap().clone()
    }

    /// Data types of every WebSocketPushEnable frame received, in order.
    pub fn enabled_sets(&self) -> Vec<Vec<String>> {
        self.frames()
            .iter()
            .filter(|frame| frame["@type"] == "WebSocketPushEnable")
            .map(|frame| {
                frame["dataTypes"]
                    .as_array()
                    .map(|types| {
                        types
                            .iter()
                            .filter_map(|t| t.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn command(&self, command: ServerCommand) {
        let current = self.state.current.lock().unwrap();
        current
            .as_ref()
            .expect("no client connected")
            .send(command)
            .expect("connection task gone");
    }

    pub fn send_json(&self, value: Value) {
        self.command(ServerCommand::Send(value.to_string()));
    }

    /// Wait until at least `count` frames have been received.
    pub async fn wait_for_frames(&self, count: usize) -> Vec<Value> {
        wait_until(|| self.frames().len() >= count).await;
        self.frames()
    }
}

impl Drop for MockPushServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve_connection(stream: tokio::net::TcpStream, state: Arc<ServerState>) {
    let uri_state = state.clone();
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        uri_state
            .uris
            .lock()
            .unwrap()
            .push(request.uri().to_string());
        Ok(response)
    };

    let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
        return;
    };

    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    *state.current.lock().unwrap() = Some(command_tx);
    state.connections.fetch_add(1, Ordering::SeqCst);

    loop {
        tokio::select! {
            message = ws.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(value) = serde_json::from_str::<Value>(text.as_str()) {
                        state.frames.lock().unwrap().push(value);
                    }
                }
                // Keep reading so the close reply is flushed
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
            command = command_rx.recv() => match command {
                Some(ServerCommand::Send(text)) => {
                    if ws.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(ServerCommand::Close) => {
                    let _ = ws.close(None).await;
                }
                Some(ServerCommand::Drop) | None => break,
            },
        }
    }
}

/// Poll `condition` until it holds or [`WAIT`] elapses.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Transport serving the session document and issuing numbered tickets.
pub struct TicketTransport {
    session: Value,
    ticket_posts: AtomicUsize,
    fail_tickets: AtomicBool,
}

impl TicketTransport {
    pub fn new(push_url: &str) -> Arc<Self> {
        Arc::new(Self {
            session: json!({
                "capabilities": {
                    "urn:ietf:params:jmap:core": {},
                    "urn:ietf:params:jmap:mail": {},
                    "urn:ietf:params:jmap:websocket": { "url": push_url, "supportsPush": true },
                    "com:linagora:params:jmap:ws:ticket": { "generationEndpoint": TICKET_URL }
                },
                "accounts": { "acct1": { "name": "bob@jmap.test" } },
                "primaryAccounts": { "urn:ietf:params:jmap:mail": "acct1" },
                "apiUrl": "http://jmap.test/jmap",
                "state": "s0"
            }),
            ticket_posts: AtomicUsize::new(0),
            fail_tickets: AtomicBool::new(false),
        })
    }

    pub fn ticket_posts(&self) -> usize {
        self.ticket_posts.load(Ordering::SeqCst)
    }

    pub fn fail_tickets(&self, fail: bool) {
        self.fail_tickets.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for TicketTransport {
    async fn get(&self, url: &str, _headers: &HeaderMap) -> TransportResult<Value> {
        if url == SESSION_URL {
            return Ok(self.session.clone());
        }
        Err(TransportError::Status {
            status: 404,
            body: url.to_string(),
        })
    }

    async fn post(
        &self,
        url: &str,
        body: Option<&Value>,
        _headers: &HeaderMap,
    ) -> TransportResult<Value> {
        assert_eq!(url, TICKET_URL);
        assert!(body.is_none(), "ticket request must have an empty body");

        let n = self.ticket_posts.fetch_add(1, Ordering::SeqCst) + 1;
        // Let concurrent starters pile up on the same attempt
        tokio::time::sleep(Duration::from_millis(20)).await;

        if self.fail_tickets.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                status: 401,
                body: "no ticket for you".to_string(),
            });
        }
        Ok(json!({ "value": format!("ticket-{n}") }))
    }

    async fn upload(
        &self,
        url: &str,
        _bytes: Vec<u8>,
        _headers: &HeaderMap,
    ) -> TransportResult<Value> {
        Err(TransportError::Status {
            status: 404,
            body: url.to_string(),
        })
    }
}

/// Server, transport and a multiplexer over a fetched session.
pub struct TestHarness {
    pub server: MockPushServer,
    pub transport: Arc<TicketTransport>,
    pub client: JmapClient,
    pub push: PushMultiplexer,
}

impl TestHarness {
    pub async fn new() -> Self {
        let harness = Self::unfetched().await;
        harness
            .client
            .fetch_session(&HeaderMap::new())
            .await
            .unwrap();
        harness
    }

    /// Like [`new`](Self::new) but without fetching the session.
    pub async fn unfetched() -> Self {
        let server = MockPushServer::start().await;
        let transport = TicketTransport::new(&server.push_url());
        let client = JmapClient::with_transport(
            &ClientConfig::new(SESSION_URL).with_access_token("t0k"),
            transport.clone(),
        )
        .unwrap();
        let push = PushMultiplexer::new(client.clone());

        Self {
            server,
            transport,
            client,
            push,
        }
    }
}

/// State-change frame with `changed` as given.
pub fn state_change(changed: Value) -> Value {
    json!({ "@type": "StateChange", "changed": changed })
}

/// Poll `stream` once so its subscription is registered.
pub fn subscribed(mut stream: EntityStream) -> EntityStream {
    assert!(
        stream.next().now_or_never().is_none(),
        "stream yielded before any change"
    );
    stream
}
