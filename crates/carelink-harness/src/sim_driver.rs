//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`carelink_app::Runtime`] orchestration code runs in both production and
//! simulation. REST calls and sockets go to a shared [`MockServer`].

use std::collections::{BTreeMap, HashMap, VecDeque};

use carelink_app::{App, AppEvent, ChatId, Driver, KeyInput, SocketEvent};
use carelink_core::env::Environment;
use carelink_proto::{
    DeliveryStatus, Message, MessageId, Outbound, Profile, Role, Room, RoomId, UnreadCounts,
    UserId,
};

use crate::{
    MockServer, SimEnv, SimInstant, SocketId,
    invariants::{AppSnapshot, InvariantRegistry},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Simulation driver for one viewer.
///
/// Input events are injected by the test and handed out one per
/// [`Driver::poll_event`]. Each open chat maps to one [`MockServer`] socket.
pub struct SimDriver {
    server: MockServer,
    env: SimEnv,
    viewer: UserId,
    pending_events: VecDeque<AppEvent<SimInstant>>,
    sockets: BTreeMap<ChatId, SocketId>,
    /// Opens not yet handed to the server, with their tokens.
    opening: VecDeque<(ChatId, String)>,
    /// Hold opens in `opening` instead of completing them.
    stall_opens: bool,
    /// Sockets the server closed that the App has not heard about yet.
    dropped: VecDeque<ChatId>,
    renders: usize,
    invariants: Option<InvariantRegistry>,
    status_history: HashMap<MessageId, Vec<DeliveryStatus>>,
    stopped: bool,
}

impl SimDriver {
    /// Driver for `viewer` talking to `server`.
    pub fn new(server: MockServer, env: SimEnv, viewer: UserId) -> Self {
        Self {
            server,
            env,
            viewer,
            pending_events: VecDeque::new(),
            sockets: BTreeMap::new(),
            opening: VecDeque::new(),
            stall_opens: false,
            dropped: VecDeque::new(),
            renders: 0,
            invariants: None,
            status_history: HashMap::new(),
            stopped: false,
        }
    }

    /// Check `invariants` on every render, panicking on violation.
    #[must_use]
    pub fn with_invariants(mut self, invariants: InvariantRegistry) -> Self {
        self.invariants = Some(invariants);
        self
    }

    /// Queue an input event.
    pub fn inject_event(&mut self, event: AppEvent<SimInstant>) {
        self.pending_events.push_back(event);
    }

    /// Queue a key press stamped with the current virtual time.
    pub fn press(&mut self, key: KeyInput) {
        let now = self.env.now();
        self.inject_event(AppEvent::Key { key, now });
    }

    /// Queue one key press per character of `text`.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.press(KeyInput::Char(ch));
        }
    }

    /// Whether injected events remain unprocessed.
    pub fn has_pending(&self) -> bool {
        !self.pending_events.is_empty()
    }

    /// Server socket backing `chat`.
    pub fn socket(&self, chat: ChatId) -> Option<SocketId> {
        self.sockets.get(&chat).copied()
    }

    /// Leave socket opens pending until called again with `false`.
    pub fn stall_socket_opens(&mut self, stalled: bool) {
        self.stall_opens = stalled;
    }

    /// Number of socket opens still in flight.
    pub fn pending_opens(&self) -> usize {
        self.opening.len()
    }

    /// Simulate the server dropping `chat`'s socket.
    pub fn drop_socket(&mut self, chat: ChatId) {
        if let Some(socket) = self.sockets.remove(&chat) {
            self.server.close_socket(socket);
            self.dropped.push_back(chat);
        }
    }

    /// Number of renders so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Whether [`Driver::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Run the configured invariants against `app`.
    pub fn check_invariants(&mut self, app: &App<SimInstant>) {
        let Some(invariants) = &self.invariants else {
            return;
        };
        let snapshot = AppSnapshot::from_app(app).with_history(&mut self.status_history);
        invariants.assert_all(&snapshot, &format!("after render {}", self.renders));
    }

    fn socket_for(&self, chat: ChatId) -> Result<SocketId, SimDriverError> {
        self.sockets
            .get(&chat)
            .copied()
            .ok_or_else(|| SimDriverError(format!("{chat} has no socket")))
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent<SimInstant>>, Self::Error> {
        Ok(self.pending_events.pop_front())
    }

    async fn fetch_contacts(&mut self, role: Role) -> Result<Vec<Profile>, Self::Error> {
        self.server.contacts(role).map_err(SimDriverError)
    }

    async fn fetch_unread(&mut self) -> Result<UnreadCounts, Self::Error> {
        self.server.unread(&self.viewer).map_err(SimDriverError)
    }

    async fn resolve_room(&mut self, counterparty: &UserId) -> Result<Room, Self::Error> {
        self.server.private_room(&self.viewer, counterparty).map_err(SimDriverError)
    }

    async fn fetch_history(&mut self, room_id: &RoomId) -> Result<Vec<Message>, Self::Error> {
        self.server.history(room_id).map_err(SimDriverError)
    }

    fn open_socket(&mut self, chat: ChatId, token: &str) {
        self.close_socket(chat);
        self.opening.push_back((chat, token.to_string()));
    }

    async fn emit(&mut self, chat: ChatId, event: Outbound) -> Result<(), Self::Error> {
        let socket = self.socket_for(chat)?;
        self.server.receive(socket, event).map_err(SimDriverError)
    }

    async fn recv_socket(&mut self) -> Option<(ChatId, SocketEvent)> {
        if let Some(chat) = self.dropped.pop_front() {
            return Some((chat, SocketEvent::Closed { reason: "connection reset".into() }));
        }
        if !self.stall_opens
            && let Some((chat, token)) = self.opening.pop_front()
        {
            return Some(match self.server.open_socket(&self.viewer, &token) {
                Ok(socket) => {
                    tracing::debug!(%chat, %socket, "socket opened");
                    self.sockets.insert(chat, socket);
                    (chat, SocketEvent::Opened)
                },
                Err(reason) => (chat, SocketEvent::Closed { reason }),
            });
        }
        self.sockets.iter().find_map(|(chat, socket)| {
            self.server.next_inbound(*socket).map(|event| (*chat, SocketEvent::Inbound(event)))
        })
    }

    fn close_socket(&mut self, chat: ChatId) {
        self.opening.retain(|(pending, _)| *pending != chat);
        if let Some(socket) = self.sockets.remove(&chat) {
            tracing::debug!(%chat, %socket, "socket closed");
            self.server.close_socket(socket);
        }
    }

    fn render(&mut self, app: &App<SimInstant>) -> Result<(), Self::Error> {
        self.renders += 1;
        self.check_invariants(app);
        Ok(())
    }

    fn stop(&mut self) {
        for chat in self.sockets.keys().copied().collect::<Vec<_>>() {
            self.close_socket(chat);
        }
        self.stopped = true;
    }
}
