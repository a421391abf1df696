//! In-memory chat backend for simulation.
//!
//! `MockServer` plays both halves of the backend: the REST endpoints (private
//! room, history, contacts, unread) and the realtime socket server (room
//! subscriptions, message fan-out, typing relay). Clones share state so
//! several simulated clients can talk through one server.
//!
//! Behaviour mirrors the production backend where the chat depends on it:
//!
//! - one room per unordered user pair, created on first request
//! - posted messages are echoed to every subscriber, sender included
//! - typing events are relayed to every subscriber, sender included
//! - members not subscribed to the room accumulate unread counts

#![allow(
    clippy::disallowed_types,
    reason = "Simulation shares state between sync Driver callbacks; no await while locked"
)]

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use carelink_core::{env::Environment, room::PairKey};
use carelink_proto::{
    DeliveryStatus, Inbound, Member, Message, MessageId, Outbound, Profile, Role, Room, RoomId,
    UnreadCounts, UserId,
};
use chrono::{DateTime, Utc};

use crate::SimEnv;

/// Server-side socket handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SocketId(u64);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket-{}", self.0)
    }
}

/// Scripted failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    /// Private room requests fail.
    pub fail_rooms: bool,
    /// History requests fail.
    pub fail_history: bool,
    /// Contact list requests fail.
    pub fail_contacts: bool,
    /// Unread count requests fail.
    pub fail_unread: bool,
    /// Socket handshakes are refused.
    pub refuse_sockets: bool,
}

/// Request counters, for asserting fetch schedules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Private room requests.
    pub rooms: usize,
    /// History requests.
    pub history: usize,
    /// Contact list requests.
    pub contacts: usize,
    /// Unread count requests.
    pub unread: usize,
    /// Socket handshakes, refused ones included.
    pub sockets: usize,
}

struct Socket {
    user: UserId,
    joined: Option<RoomId>,
    open: bool,
    outbox: VecDeque<Inbound>,
    received: Vec<Outbound>,
}

#[derive(Default)]
struct ServerState {
    users: BTreeMap<UserId, Profile>,
    rooms: HashMap<PairKey, Room>,
    history: HashMap<RoomId, Vec<Message>>,
    sockets: BTreeMap<SocketId, Socket>,
    unread: HashMap<UserId, UnreadCounts>,
    faults: Faults,
    stats: FetchStats,
    next_socket: u64,
    next_room: u64,
    next_message: u64,
}

impl ServerState {
    fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.values().find(|room| &room.id == room_id)
    }

    fn is_member(&self, room_id: &RoomId, user: &UserId) -> bool {
        self.room(room_id).is_some_and(|room| room.members.iter().any(|m| &m.user_id == user))
    }

    /// Queue `event` on every open socket subscribed to `room_id`.
    fn broadcast(&mut self, room_id: &RoomId, event: &Inbound) {
        for socket in self.sockets.values_mut() {
            if socket.open && socket.joined.as_ref() == Some(room_id) {
                socket.outbox.push_back(event.clone());
            }
        }
    }

    fn is_watching(&self, user: &UserId, room_id: &RoomId) -> bool {
        self.sockets
            .values()
            .any(|s| s.open && &s.user == user && s.joined.as_ref() == Some(room_id))
    }

    fn push(&mut self, socket_id: SocketId, event: Inbound) {
        if let Some(socket) = self.sockets.get_mut(&socket_id)
            && socket.open
        {
            socket.outbox.push_back(event);
        }
    }

    fn post(
        &mut self,
        socket_id: SocketId,
        sender: UserId,
        room_id: RoomId,
        content: String,
        created_at: DateTime<Utc>,
    ) {
        self.next_message += 1;
        let message = Message {
            id: MessageId::from(self.next_message),
            room_id: room_id.clone(),
            sender_id: sender.clone(),
            content,
            message_type: carelink_proto::TEXT_MESSAGE.into(),
            attachments: Vec::new(),
            created_at,
            status: DeliveryStatus::Sent,
        };
        tracing::debug!(%socket_id, %room_id, message_id = %message.id, "message posted");

        let others: Vec<UserId> = self
            .room(&room_id)
            .map(|room| room.members.iter().map(|m| m.user_id.clone()).collect())
            .unwrap_or_default();
        for member in others.into_iter().filter(|m| m != &sender) {
            if !self.is_watching(&member, &room_id) {
                *self.unread.entry(member).or_default().entry(sender.clone()).or_default() += 1;
            }
        }

        self.history.entry(room_id.clone()).or_default().push(message.clone());
        self.broadcast(&room_id, &Inbound::NewMessage(message));
    }
}

/// Shared in-memory chat backend.
#[derive(Clone)]
pub struct MockServer {
    state: Arc<Mutex<ServerState>>,
    env: SimEnv,
}

impl MockServer {
    /// Empty server whose message timestamps follow `env`'s wall clock.
    pub fn new(env: SimEnv) -> Self {
        Self { state: Arc::new(Mutex::new(ServerState::default())), env }
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a user. Contacts and room members are drawn from registered
    /// users.
    pub fn add_user(&self, profile: Profile) {
        self.lock().users.insert(profile.id.clone(), profile);
    }

    /// Replace the scripted failures.
    pub fn set_faults(&self, faults: Faults) {
        self.lock().faults = faults;
    }

    /// Request counters so far.
    pub fn stats(&self) -> FetchStats {
        self.lock().stats
    }

    /// `GET` private room between `viewer` and `counterparty`.
    ///
    /// Creates the room on first request; afterwards returns the same room
    /// regardless of which member asks.
    ///
    /// # Errors
    ///
    /// Fails for unknown users, a self-pair, or when scripted to.
    pub fn private_room(&self, viewer: &UserId, counterparty: &UserId) -> Result<Room, String> {
        let mut state = self.lock();
        state.stats.rooms += 1;
        if state.faults.fail_rooms {
            return Err("500 Internal Server Error".into());
        }
        if viewer == counterparty {
            return Err("400 Bad Request: cannot chat with yourself".into());
        }
        let member = |state: &ServerState, id: &UserId| {
            state
                .users
                .get(id)
                .map(|user| Member { user_id: id.clone(), user: user.clone() })
                .ok_or_else(|| format!("404 Not Found: user {id}"))
        };
        let members = vec![member(&state, viewer)?, member(&state, counterparty)?];

        let key = PairKey::new(viewer.clone(), counterparty.clone());
        if let Some(room) = state.rooms.get(&key) {
            return Ok(room.clone());
        }
        state.next_room += 1;
        let room = Room { id: RoomId::from(format!("room-{}", state.next_room)), members };
        tracing::debug!(room_id = %room.id, %viewer, %counterparty, "room created");
        state.rooms.insert(key, room.clone());
        Ok(room)
    }

    /// Number of rooms created so far.
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Preload `messages` as the stored history of `room_id`, in the given
    /// order.
    pub fn seed_history(&self, room_id: &RoomId, messages: Vec<Message>) {
        self.lock().history.insert(room_id.clone(), messages);
    }

    /// `GET` history of `room_id`, in stored order.
    ///
    /// # Errors
    ///
    /// Fails when scripted to.
    pub fn history(&self, room_id: &RoomId) -> Result<Vec<Message>, String> {
        let mut state = self.lock();
        state.stats.history += 1;
        if state.faults.fail_history {
            return Err("503 Service Unavailable".into());
        }
        Ok(state.history.get(room_id).cloned().unwrap_or_default())
    }

    /// `GET` contacts for a viewer with `role`: every registered user of the
    /// opposite role.
    ///
    /// # Errors
    ///
    /// Fails when scripted to.
    pub fn contacts(&self, role: Role) -> Result<Vec<Profile>, String> {
        let mut state = self.lock();
        state.stats.contacts += 1;
        if state.faults.fail_contacts {
            return Err("500 Internal Server Error".into());
        }
        let wanted = role.counterpart();
        Ok(state.users.values().filter(|user| user.role == Some(wanted)).cloned().collect())
    }

    /// `GET` unread counts for `viewer`.
    ///
    /// # Errors
    ///
    /// Fails when scripted to.
    pub fn unread(&self, viewer: &UserId) -> Result<UnreadCounts, String> {
        let mut state = self.lock();
        state.stats.unread += 1;
        if state.faults.fail_unread {
            return Err("502 Bad Gateway".into());
        }
        Ok(state.unread.get(viewer).cloned().unwrap_or_default())
    }

    /// Accept a socket handshake for `user`.
    ///
    /// # Errors
    ///
    /// Fails for a blank token or when scripted to.
    pub fn open_socket(&self, user: &UserId, token: &str) -> Result<SocketId, String> {
        let mut state = self.lock();
        state.stats.sockets += 1;
        if state.faults.refuse_sockets {
            return Err("connection refused".into());
        }
        if token.trim().is_empty() {
            return Err("401 Unauthorized".into());
        }
        state.next_socket += 1;
        let id = SocketId(state.next_socket);
        state.sockets.insert(id, Socket {
            user: user.clone(),
            joined: None,
            open: true,
            outbox: VecDeque::new(),
            received: Vec::new(),
        });
        Ok(id)
    }

    /// Handle an event sent by the client on `socket_id`.
    ///
    /// # Errors
    ///
    /// Fails if the socket is unknown or closed.
    pub fn receive(&self, socket_id: SocketId, event: Outbound) -> Result<(), String> {
        let mut state = self.lock();
        let user = match state.sockets.get_mut(&socket_id) {
            Some(socket) if socket.open => {
                socket.received.push(event.clone());
                socket.user.clone()
            },
            _ => return Err(format!("{socket_id} is closed")),
        };

        match event {
            Outbound::JoinRoom { room_id } => {
                if !state.is_member(&room_id, &user) {
                    state.push(socket_id, Inbound::Error { message: "Not a room member".into() });
                    return Ok(());
                }
                if let Some(socket) = state.sockets.get_mut(&socket_id) {
                    socket.joined = Some(room_id.clone());
                }
                let peers: Vec<UserId> = state
                    .room(&room_id)
                    .map(|room| room.members.iter().map(|m| m.user_id.clone()).collect())
                    .unwrap_or_default();
                if let Some(counts) = state.unread.get_mut(&user) {
                    for peer in &peers {
                        counts.remove(peer);
                    }
                }
            },
            Outbound::LeaveRoom { room_id } => {
                if let Some(socket) = state.sockets.get_mut(&socket_id)
                    && socket.joined.as_ref() == Some(&room_id)
                {
                    socket.joined = None;
                }
            },
            Outbound::SendMessage { room_id, content, .. } => {
                let joined = state.sockets.get(&socket_id).and_then(|s| s.joined.clone());
                if joined.as_ref() != Some(&room_id) {
                    state.push(socket_id, Inbound::Error { message: "Join the room first".into() });
                    return Ok(());
                }
                let created_at = self.env.wall_clock();
                state.post(socket_id, user, room_id, content, created_at);
            },
            Outbound::Typing { room_id, is_typing } => {
                let event = Inbound::UserTyping {
                    user_id: user,
                    room_id: Some(room_id.clone()),
                    is_typing,
                };
                state.broadcast(&room_id, &event);
            },
        }
        Ok(())
    }

    /// Queue a server event on `socket_id` as if the backend pushed it.
    pub fn push(&self, socket_id: SocketId, event: Inbound) {
        self.lock().push(socket_id, event);
    }

    /// Queue a server event on every open socket subscribed to `room_id`.
    pub fn broadcast(&self, room_id: &RoomId, event: Inbound) {
        self.lock().broadcast(room_id, &event);
    }

    /// Next queued event for `socket_id`.
    pub fn next_inbound(&self, socket_id: SocketId) -> Option<Inbound> {
        self.lock().sockets.get_mut(&socket_id).and_then(|s| s.outbox.pop_front())
    }

    /// Whether `socket_id` is open.
    pub fn is_open(&self, socket_id: SocketId) -> bool {
        self.lock().sockets.get(&socket_id).is_some_and(|s| s.open)
    }

    /// Close `socket_id`, dropping its subscription and queued events.
    pub fn close_socket(&self, socket_id: SocketId) {
        if let Some(socket) = self.lock().sockets.get_mut(&socket_id) {
            socket.open = false;
            socket.joined = None;
            socket.outbox.clear();
        }
    }

    /// Every event `user` has sent, across all of their sockets, in order.
    pub fn received_from(&self, user: &UserId) -> Vec<Outbound> {
        self.lock()
            .sockets
            .values()
            .filter(|s| &s.user == user)
            .flat_map(|s| s.received.iter().cloned())
            .collect()
    }

    /// Sockets `user` currently has open.
    pub fn open_sockets(&self, user: &UserId) -> Vec<SocketId> {
        self.lock()
            .sockets
            .iter()
            .filter(|(_, s)| s.open && &s.user == user)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Room `socket_id` is subscribed to.
    pub fn joined_room(&self, socket_id: SocketId) -> Option<RoomId> {
        self.lock().sockets.get(&socket_id).and_then(|s| s.joined.clone())
    }

    /// Stored messages of `room_id`.
    pub fn stored(&self, room_id: &RoomId) -> Vec<Message> {
        self.lock().history.get(room_id).cloned().unwrap_or_default()
    }
}
