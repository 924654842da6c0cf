//! WebSocket push multiplexer.
//!
//! One socket per multiplexer. Each entity type has its own broadcast
//! channel; callers get a stream per entity type and the multiplexer
//! (re)announces the cumulative set of subscribed types whenever a new one
//! is requested.

use crate::error::{PushError, PushResult};
use crate::fsm::{PushMachine, PushMachineInput, PushState};
use futures_util::stream::{self, BoxStream};
use futures_util::{SinkExt, StreamExt};
use jmap_client::JmapClient;
use jmap_protocol_types::{AccountStates, EntityType, OutboundFrame, StateChange, STATE_CHANGE_TYPE};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use url::Url;

/// Item of an entity stream: new states per account, or the error that
/// ended the connection (always the last item).
pub type PushEvent = Result<AccountStates, PushError>;

/// Stream of state changes for one entity type.
pub type EntityStream = BoxStream<'static, PushEvent>;

/// Buffered events per entity type before slow subscribers lag.
const CHANNEL_CAPACITY: usize = 256;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Body returned by the ticket endpoint.
#[derive(Debug, Deserialize)]
struct Ticket {
    value: String,
}

/// Outcome of the in-flight connection attempt, shared by every `start()`
/// caller.
#[derive(Debug, Clone)]
enum StartStatus {
    Pending,
    Ready,
    Failed(PushError),
}

struct EntityChannels {
    mailbox: broadcast::Sender<PushEvent>,
    email: broadcast::Sender<PushEvent>,
    email_submission: broadcast::Sender<PushEvent>,
}

impl EntityChannels {
    fn new() -> Self {
        Self {
            mailbox: broadcast::channel(CHANNEL_CAPACITY).0,
            email: broadcast::channel(CHANNEL_CAPACITY).0,
            email_submission: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    fn get(&self, entity: EntityType) -> &broadcast::Sender<PushEvent> {
        match entity {
            EntityType::Mailbox => &self.mailbox,
            EntityType::Email => &self.email,
            EntityType::EmailSubmission => &self.email_submission,
        }
    }
}

struct MuxState {
    machine: PushMachine,
    /// Bumped for every connection attempt; stale tasks compare against it.
    connection_id: u64,
    start_status: Option<watch::Receiver<StartStatus>>,
    /// Writer queue of the open socket.
    outbound: Option<mpsc::UnboundedSender<Message>>,
    /// Subscription set, in request order.
    enabled: Vec<EntityType>,
    channels: EntityChannels,
}

impl MuxState {
    fn transition(&mut self, input: PushMachineInput) {
        let from = PushState::from(self.machine.state());
        match self.machine.consume(&input) {
            Ok(_) => debug!(
                from = ?from,
                to = ?PushState::from(self.machine.state()),
                "Push state transition"
            ),
            Err(_) => warn!(input = ?input, state = ?from, "Ignoring invalid push transition"),
        }
    }

    /// Forget the current connection and return to Idle.
    ///
    /// Returns the old channels; dropping them completes their streams.
    fn reset(&mut self, input: PushMachineInput) -> EntityChannels {
        self.outbound = None;
        self.start_status = None;
        self.enabled.clear();
        self.transition(input);
        std::mem::replace(&mut self.channels, EntityChannels::new())
    }
}

struct Shared {
    client: JmapClient,
    state: Mutex<MuxState>,
}

/// Multiplexes one JMAP WebSocket push connection into per-entity-type
/// streams.
///
/// Cheap to clone; clones drive the same connection.
#[derive(Clone)]
pub struct PushMultiplexer {
    shared: Arc<Shared>,
}

impl PushMultiplexer {
    /// Create an idle multiplexer. The session must be fetched on `client`
    /// before [`start`](Self::start).
    pub fn new(client: JmapClient) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                state: Mutex::new(MuxState {
                    machine: PushMachine::new(),
                    connection_id: 0,
                    start_status: None,
                    outbound: None,
                    enabled: Vec::new(),
                    channels: EntityChannels::new(),
                }),
            }),
        }
    }

    /// Open the push connection if it is not open yet.
    ///
    /// Resolves once the initial subscription frame has been written.
    /// Concurrent callers share one attempt and all see its outcome; an
    /// already open connection resolves immediately.
    pub async fn start(&self) -> PushResult<()> {
        let mut status = self.begin_start()?;

        loop {
            let current = status.borrow_and_update().clone();
            match current {
                StartStatus::Ready => return Ok(()),
                StartStatus::Failed(e) => return Err(e),
                StartStatus::Pending => {}
            }
            if status.changed().await.is_err() {
                // Sender gone; whatever it last published is the outcome
                let last = status.borrow().clone();
                return match last {
                    StartStatus::Ready => Ok(()),
                    StartStatus::Failed(e) => Err(e),
                    StartStatus::Pending => Err(PushError::Aborted),
                };
            }
        }
    }

    /// Close the socket if one is open. No-op otherwise.
    ///
    /// The multiplexer is Idle when this returns: entity streams complete,
    /// the subscription set is cleared, and the next [`start`](Self::start)
    /// opens a fresh connection while the old socket finishes closing.
    pub fn stop(&self) {
        let channels = {
            let mut state = self.shared.state.lock();
            let Some(outbound) = state.outbound.take() else {
                debug!("No open push connection to stop");
                return;
            };
            info!(connection_id = state.connection_id, "Closing push connection");
            let _ = outbound.send(Message::Close(None));
            // Detach the closing socket; its reader no longer owns this state
            state.connection_id += 1;
            state.reset(PushMachineInput::SocketClosed)
        };
        drop(channels);
    }

    /// Ask the server to stop pushing without closing the socket.
    ///
    /// The subscription set is kept; [`resume`](Self::resume) re-announces it.
    pub fn pause(&self) -> PushResult<()> {
        self.send_frame(&OutboundFrame::WebSocketPushDisable)
    }

    /// Re-announce the current subscription set.
    pub fn resume(&self) -> PushResult<()> {
        let enabled = self.shared.state.lock().enabled.clone();
        self.send_frame(&OutboundFrame::enable(&enabled))
    }

    /// Stream of state changes for `entity`.
    ///
    /// Nothing happens until the stream is first polled. Then the entity
    /// type joins the subscription set (sending the full updated set when
    /// the socket is open) and the stream attaches to the shared channel for
    /// that type; earlier changes are not replayed. The stream completes
    /// when the connection closes and yields the error before completing
    /// when it fails.
    pub fn stream_for(&self, entity: EntityType) -> EntityStream {
        let shared = self.shared.clone();
        stream::once(async move { shared.subscribe(entity) })
            .flat_map(move |receiver| entity_stream(entity, receiver))
            .boxed()
    }

    pub fn mailbox(&self) -> EntityStream {
        self.stream_for(EntityType::Mailbox)
    }

    pub fn email(&self) -> EntityStream {
        self.stream_for(EntityType::Email)
    }

    pub fn email_submission(&self) -> EntityStream {
        self.stream_for(EntityType::EmailSubmission)
    }

    pub fn state(&self) -> PushState {
        PushState::from(self.shared.state.lock().machine.state())
    }

    /// Entity types subscribed on the current connection, in request order.
    pub fn subscribed_entity_types(&self) -> Vec<EntityType> {
        self.shared.state.lock().enabled.clone()
    }

    /// Join the in-flight attempt or spawn a new one.
    fn begin_start(&self) -> PushResult<watch::Receiver<StartStatus>> {
        let session = self.shared.client.session();
        // Resolved before anything is sent
        let ticket_url = session.ticket_url()?;
        let push_url = session.push_url()?;

        let mut state = self.shared.state.lock();
        if let Some(status) = &state.start_status {
            return Ok(status.clone());
        }

        state.transition(PushMachineInput::StartRequested);
        state.connection_id += 1;
        let connection_id = state.connection_id;
        let (status_tx, status_rx) = watch::channel(StartStatus::Pending);
        state.start_status = Some(status_rx.clone());
        drop(state);

        info!(connection_id, push_url = %push_url, "Starting push connection");
        tokio::spawn(run_connection(
            self.shared.clone(),
            connection_id,
            ticket_url,
            push_url,
            status_tx,
        ));

        Ok(status_rx)
    }

    fn send_frame(&self, frame: &OutboundFrame) -> PushResult<()> {
        let text = encode(frame)?;
        let state = self.shared.state.lock();
        if let Some(outbound) = &state.outbound {
            let _ = outbound.send(Message::Text(text.into()));
        }
        Ok(())
    }
}

impl Shared {
    /// Attach a receiver for `entity`, adding it to the subscription set.
    fn subscribe(&self, entity: EntityType) -> broadcast::Receiver<PushEvent> {
        let mut state = self.state.lock();
        let receiver = state.channels.get(entity).subscribe();

        if !state.enabled.contains(&entity) {
            state.enabled.push(entity);
            if let Some(outbound) = &state.outbound {
                match encode(&OutboundFrame::enable(&state.enabled)) {
                    Ok(frame) => {
                        debug!(entity = %entity, types = ?state.enabled, "Enabling push");
                        let _ = outbound.send(Message::Text(frame.into()));
                    }
                    Err(e) => error!(error = %e, "Failed to encode push enable frame"),
                }
            }
        }
        receiver
    }

    /// Fan a text frame out to the entity channels.
    fn dispatch_frame(&self, connection_id: u64, text: &str) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(connection_id, error = %e, "Ignoring unparsable push frame");
                return;
            }
        };

        let frame_type = value.get("@type").and_then(Value::as_str);
        if frame_type != Some(STATE_CHANGE_TYPE) {
            debug!(connection_id, frame_type = ?frame_type, "Ignoring push frame");
            return;
        }

        let change: StateChange = match serde_json::from_value(value) {
            Ok(change) => change,
            Err(e) => {
                warn!(connection_id, error = %e, "Ignoring malformed StateChange");
                return;
            }
        };

        let state = self.state.lock();
        if state.connection_id != connection_id {
            debug!(connection_id, "Dropping frame from a stopped connection");
            return;
        }
        for entity in EntityType::ALL {
            if let Some(states) = change.states_for(entity) {
                debug!(connection_id, entity = %entity, accounts = states.len(), "State change");
                // No receivers is fine
                let _ = state.channels.get(entity).send(Ok(states));
            }
        }
    }

    /// Connection attempt failed before the socket opened.
    ///
    /// Subscriptions survive so the next `start()` announces them.
    fn connect_failed(&self, connection_id: u64) {
        let mut state = self.state.lock();
        if state.connection_id != connection_id {
            return;
        }
        state.start_status = None;
        state.outbound = None;
        state.transition(PushMachineInput::ConnectFailed);
    }

    /// Open connection ended: reset and end every entity stream.
    fn teardown(&self, connection_id: u64, failure: Option<PushError>) {
        let channels = {
            let mut state = self.state.lock();
            if state.connection_id != connection_id {
                return;
            }
            state.reset(if failure.is_some() {
                PushMachineInput::SocketErrored
            } else {
                PushMachineInput::SocketClosed
            })
        };

        if let Some(e) = failure {
            for entity in EntityType::ALL {
                let _ = channels.get(entity).send(Err(e.clone()));
            }
        }
        // Dropping the senders completes the streams
        drop(channels);
    }
}

/// Drive one connection: ticket, handshake, initial frame, read loop.
async fn run_connection(
    shared: Arc<Shared>,
    connection_id: u64,
    ticket_url: String,
    push_url: String,
    status: watch::Sender<StartStatus>,
) {
    let socket = match connect(&shared.client, &ticket_url, &push_url).await {
        Ok(socket) => socket,
        Err(e) => {
            error!(connection_id, error = %e, "Push connection failed");
            shared.connect_failed(connection_id);
            let _ = status.send(StartStatus::Failed(e));
            return;
        }
    };

    let (mut write, mut read) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Snapshot the set and expose the queue atomically so later additions
    // are queued behind the initial frame.
    let initial = {
        let mut state = shared.state.lock();
        state.outbound = Some(outbound_tx.clone());
        state.transition(PushMachineInput::SocketOpened);
        encode(&OutboundFrame::enable(&state.enabled))
    };

    let written = match initial {
        Ok(frame) => write
            .send(Message::Text(frame.into()))
            .await
            .map_err(PushError::from),
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        error!(connection_id, error = %e, "Failed to send initial push frame");
        shared.teardown(connection_id, Some(e.clone()));
        let _ = status.send(StartStatus::Failed(e));
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if write.send(message).await.is_err() {
                break;
            }
        }
    });

    info!(connection_id, "Push connection open");
    let _ = status.send(StartStatus::Ready);

    let mut failure = None;
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => shared.dispatch_frame(connection_id, text.as_str()),
            Ok(Message::Ping(data)) => {
                let _ = outbound_tx.send(Message::Pong(data));
            }
            Ok(Message::Close(frame)) => {
                info!(connection_id, frame = ?frame, "Push connection closing");
            }
            Ok(_) => {}
            Err(e) => {
                error!(connection_id, error = %e, "Push WebSocket error");
                failure = Some(PushError::from(e));
                break;
            }
        }
    }

    writer.abort();
    if failure.is_none() {
        info!(connection_id, "Push connection closed");
    }
    shared.teardown(connection_id, failure);
}

/// Exchange a ticket and open the socket.
async fn connect(client: &JmapClient, ticket_url: &str, push_url: &str) -> PushResult<Socket> {
    let body = client
        .transport()
        .post(ticket_url, None, client.headers())
        .await
        .map_err(|e| PushError::Ticket(Arc::new(e)))?;
    let ticket: Ticket =
        serde_json::from_value(body).map_err(|e| PushError::MalformedTicket(e.to_string()))?;

    let url = socket_url(push_url, &ticket.value)?;
    debug!(host = ?url.host_str(), path = url.path(), "Opening push socket");

    let (socket, _) = connect_async(url.as_str()).await?;
    Ok(socket)
}

/// `push_url?ticket=<ticket>`, with http(s) mapped to ws(s).
fn socket_url(push_url: &str, ticket: &str) -> PushResult<Url> {
    let mut url = Url::parse(push_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(PushError::UnsupportedScheme(other.to_string())),
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|()| PushError::UnsupportedScheme(url.scheme().to_string()))?;
    }
    url.query_pairs_mut().append_pair("ticket", ticket);
    Ok(url)
}

fn encode(frame: &OutboundFrame) -> PushResult<String> {
    serde_json::to_string(frame).map_err(|e| PushError::Encode(e.to_string()))
}

fn entity_stream(entity: EntityType, receiver: broadcast::Receiver<PushEvent>) -> EntityStream {
    stream::unfold(Some(receiver), move |receiver| async move {
        let mut receiver = receiver?;
        loop {
            match receiver.recv().await {
                Ok(Ok(states)) => return Some((Ok(states), Some(receiver))),
                // Terminal: yield the error, then end
                Ok(Err(e)) => return Some((Err(e), None)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(entity = %entity, skipped, "Push subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}
