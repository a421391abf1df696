//! Realtime channel state machine.
//!
//! Tracks the lifecycle of one authenticated socket owned by one chat widget,
//! and scopes inbound events to the single room it has joined. Uses the action
//! pattern: methods take time as input and return [`ChannelAction`]s for the
//! driver to execute.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐  open   ┌───────────┐  join   ┌──────────────┐
//! │ Disconnected │────────>│ Connecting │────────>│ Connected │────────>│ Joined(room) │──┐
//! └──────────────┘         └────────────┘         └───────────┘<────────└──────────────┘  │
//!                                │                              leave      ^   │ join(other)
//!                                │ connect_error / timeout                 └───┘
//!                                ↓                   error (any open state)
//!                           ┌────────┐<─────────────────────────────────────────
//!                           │ Failed │
//!                           └────────┘
//!            teardown from any state ──> Closed (terminal)
//! ```
//!
//! # Invariants
//!
//! - At most one room is joined at a time. Switching rooms emits `leave_room`
//!   for the old room before `join_room` for the new one, in the same call.
//! - Inbound `new_message`/`user_typing` are only surfaced while joined, and
//!   only for the joined room.
//! - A `user_typing` event about the viewer is never surfaced (self-echo).
//! - Nothing is surfaced after [`Channel::teardown`].
//! - No automatic reconnect: `Failed` and `Closed` are only left by building a
//!   new channel.

use std::{ops::Sub, time::Duration};

use carelink_proto::{DeliveryStatus, Inbound, Message, MessageId, Outbound, RoomId, UserId};

use crate::error::ChannelError;

/// Default time allowed for the transport to open.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Actions returned by the channel for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    /// Open the authenticated transport.
    Open,
    /// Send this event over the open transport.
    Emit(Outbound),
    /// Close the transport.
    Close,
}

/// Channel lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    /// Nothing attempted yet.
    Disconnected,
    /// Transport open requested, not yet confirmed.
    Connecting,
    /// Transport open, no room joined.
    Connected,
    /// Transport open and scoped to this room.
    Joined(RoomId),
    /// Connection failed or server reported an error. Terminal until teardown.
    Failed,
    /// Torn down. Terminal.
    Closed,
}

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Time allowed for the transport to open.
    pub connect_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { connect_timeout: DEFAULT_CONNECT_TIMEOUT }
    }
}

/// Inbound event accepted for the joined room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// New message in the joined room.
    Message(Message),
    /// Counterparty composing state changed.
    Typing {
        /// Who is (not) typing.
        user_id: UserId,
        /// Composing or not.
        is_typing: bool,
    },
    /// A message's delivery status moved on.
    Status {
        /// Message whose status changed.
        message_id: MessageId,
        /// New status.
        status: DeliveryStatus,
    },
    /// Channel failed; it will not recover.
    Failed(ChannelError),
}

/// Realtime channel state machine.
///
/// Generic over `I` so tests can drive it with virtual time.
#[derive(Debug, Clone)]
pub struct Channel<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    state: ChannelState,
    config: ChannelConfig,
    viewer: UserId,
    connect_started: Option<I>,
}

impl<I> Channel<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a channel for `viewer` in [`ChannelState::Disconnected`].
    pub fn new(viewer: UserId, config: ChannelConfig) -> Self {
        Self { state: ChannelState::Disconnected, config, viewer, connect_started: None }
    }

    /// Current state.
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Room currently joined. `None` unless in [`ChannelState::Joined`].
    pub fn joined_room(&self) -> Option<&RoomId> {
        match &self.state {
            ChannelState::Joined(room_id) => Some(room_id),
            _ => None,
        }
    }

    /// Whether the transport is open (joined or not).
    pub fn is_open(&self) -> bool {
        matches!(self.state, ChannelState::Connected | ChannelState::Joined(_))
    }

    /// Request the transport to open.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidState` unless [`ChannelState::Disconnected`]
    pub fn connect(&mut self, now: I) -> Result<Vec<ChannelAction>, ChannelError> {
        if self.state != ChannelState::Disconnected {
            return Err(self.invalid("connect"));
        }
        self.state = ChannelState::Connecting;
        self.connect_started = Some(now);
        Ok(vec![ChannelAction::Open])
    }

    /// Transport reported open.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidState` unless [`ChannelState::Connecting`]
    pub fn handle_open(&mut self) -> Result<(), ChannelError> {
        if self.state != ChannelState::Connecting {
            return Err(self.invalid("open"));
        }
        self.state = ChannelState::Connected;
        self.connect_started = None;
        Ok(())
    }

    /// Transport failed to open or dropped.
    ///
    /// Returns the error to surface, or `None` if the channel was already torn
    /// down and the failure is irrelevant.
    pub fn handle_transport_failure(&mut self, reason: impl Into<String>) -> Option<ChannelError> {
        self.fail(ChannelError::ConnectFailed(reason.into()))
    }

    /// Scope the channel to `room_id`.
    ///
    /// From `Connected` emits `join_room`. From `Joined(other)` emits
    /// `leave_room(other)` then `join_room(room_id)`. Re-joining the current
    /// room emits nothing.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidState` unless the transport is open
    pub fn join(&mut self, room_id: RoomId) -> Result<Vec<ChannelAction>, ChannelError> {
        let mut actions = Vec::new();
        match &self.state {
            ChannelState::Connected => {},
            ChannelState::Joined(current) if *current == room_id => return Ok(actions),
            ChannelState::Joined(current) => {
                actions.push(ChannelAction::Emit(Outbound::LeaveRoom { room_id: current.clone() }));
            },
            _ => return Err(self.invalid("join")),
        }

        tracing::debug!(%room_id, "joining room");
        actions.push(ChannelAction::Emit(Outbound::JoinRoom { room_id: room_id.clone() }));
        self.state = ChannelState::Joined(room_id);
        Ok(actions)
    }

    /// Leave the joined room, keeping the transport open.
    pub fn leave(&mut self) -> Vec<ChannelAction> {
        match std::mem::replace(&mut self.state, ChannelState::Connected) {
            ChannelState::Joined(room_id) => {
                vec![ChannelAction::Emit(Outbound::LeaveRoom { room_id })]
            },
            previous => {
                self.state = previous;
                Vec::new()
            },
        }
    }

    /// Wrap an outbound event for the joined room.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidState` if not joined to the event's room
    pub fn emit(&self, event: Outbound) -> Result<ChannelAction, ChannelError> {
        match &self.state {
            ChannelState::Joined(room_id) if room_id == event.room_id() => {
                Ok(ChannelAction::Emit(event))
            },
            _ => Err(self.invalid("emit")),
        }
    }

    /// Filter an inbound server event.
    ///
    /// Returns `None` for events that must not reach the transcript: anything
    /// while not joined, messages for other rooms, and the viewer's own typing
    /// echo.
    pub fn handle_inbound(&mut self, event: Inbound) -> Option<ChannelEvent> {
        match event {
            Inbound::ConnectError { message } => {
                self.fail(ChannelError::ConnectFailed(message)).map(ChannelEvent::Failed)
            },
            Inbound::Error { message } => {
                self.fail(ChannelError::Server(message)).map(ChannelEvent::Failed)
            },
            Inbound::NewMessage(message) => {
                let joined = self.joined_room()?;
                if message.room_id != *joined {
                    tracing::debug!(
                        joined = %joined,
                        room_id = %message.room_id,
                        "dropping message for another room"
                    );
                    return None;
                }
                Some(ChannelEvent::Message(message))
            },
            Inbound::UserTyping { user_id, room_id, is_typing } => {
                let joined = self.joined_room()?;
                if room_id.is_some_and(|room_id| room_id != *joined) || user_id == self.viewer {
                    return None;
                }
                Some(ChannelEvent::Typing { user_id, is_typing })
            },
            Inbound::MessageStatus { message_id, status } => {
                self.joined_room()?;
                Some(ChannelEvent::Status { message_id, status })
            },
        }
    }

    /// Check the connect timeout.
    ///
    /// Returns the error to surface if the transport has been connecting for
    /// longer than the configured timeout.
    pub fn tick(&mut self, now: I) -> Option<ChannelError> {
        let started = self.connect_started?;
        let elapsed = now - started;
        if self.state == ChannelState::Connecting && elapsed >= self.config.connect_timeout {
            return self.fail(ChannelError::ConnectTimeout { elapsed });
        }
        None
    }

    /// Tear the channel down: leave the joined room, then close.
    ///
    /// Idempotent. After teardown no inbound event is surfaced.
    pub fn teardown(&mut self) -> Vec<ChannelAction> {
        let mut actions = self.leave();
        match self.state {
            ChannelState::Disconnected | ChannelState::Closed => {},
            _ => actions.push(ChannelAction::Close),
        }
        self.state = ChannelState::Closed;
        self.connect_started = None;
        actions
    }

    fn fail(&mut self, error: ChannelError) -> Option<ChannelError> {
        match self.state {
            ChannelState::Closed | ChannelState::Failed => None,
            _ => {
                tracing::warn!(state = ?self.state, %error, "channel failed");
                self.state = ChannelState::Failed;
                self.connect_started = None;
                Some(error)
            },
        }
    }

    fn invalid(&self, operation: &'static str) -> ChannelError {
        ChannelError::InvalidState { state: self.state.clone(), operation }
    }
}
