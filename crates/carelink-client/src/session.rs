//! Chat widget state machine.
//!
//! A [`ChatSession`] is one open conversation between the viewer and a single
//! counterparty. It composes the core pieces: the realtime [`Channel`], the
//! per-room [`MessageStore`], and the typing indicators. It performs no I/O:
//! every request, socket write and close is returned as a [`SessionAction`].
//!
//! # Flow
//!
//! ```text
//! Mount ──> OpenSocket + ResolveRoom
//!             │             │
//!        SocketOpened   RoomResolved
//!             └──────┬──────┘
//!                    ↓ (both done)
//!         Emit(join_room) + FetchHistory
//!                    ↓
//!  HistoryLoaded / Inbound(new_message) ──> transcript
//! ```
//!
//! # Invariants
//!
//! - `join_room` and `FetchHistory` are issued together, and only once both the
//!   socket is open and the room is known.
//! - At most one error is shown. A new error replaces the previous one.
//! - After `Unmount` every event is ignored.

use std::{ops::Sub, time::Duration};

use carelink_core::{
    channel::{Channel, ChannelAction, ChannelConfig, ChannelEvent, ChannelState},
    room,
    store::MessageStore,
    typing::{RemoteTyping, TypingConfig, TypingIndicator, TypingSignal},
};
use carelink_proto::{Inbound, Message, Outbound, Profile, Room, RoomId, UserId};

use crate::{
    context::SessionContext,
    error::{ChatError, ClientError, Resource},
    event::{SessionAction, SessionEvent},
};

/// Tunables for a chat session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Realtime channel settings.
    pub channel: ChannelConfig,
    /// Local typing debounce.
    pub typing: TypingConfig,
}

/// One open conversation.
#[derive(Debug, Clone)]
pub struct ChatSession<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    ctx: SessionContext,
    counterparty: UserId,
    profile: Option<Profile>,
    channel: Channel<I>,
    room_id: Option<RoomId>,
    store: Option<MessageStore>,
    typing: TypingIndicator<I>,
    remote_typing: RemoteTyping,
    input: String,
    error: Option<ChatError>,
    resolving: bool,
    closed: bool,
}

impl<I> ChatSession<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a session between the context's viewer and `counterparty`.
    ///
    /// # Errors
    ///
    /// - `ClientError::Room` if `counterparty` is the viewer
    pub fn new(
        ctx: SessionContext,
        counterparty: UserId,
        config: SessionConfig,
    ) -> Result<Self, ClientError> {
        room::validate_pair(ctx.viewer(), &counterparty)?;
        let channel = Channel::new(ctx.viewer().clone(), config.channel);
        Ok(Self {
            ctx,
            counterparty,
            profile: None,
            channel,
            room_id: None,
            store: None,
            typing: TypingIndicator::new(config.typing),
            remote_typing: RemoteTyping::new(),
            input: String::new(),
            error: None,
            resolving: false,
            closed: false,
        })
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent<I>) -> Vec<SessionAction> {
        if self.closed {
            tracing::trace!("session closed, ignoring event");
            return Vec::new();
        }

        match event {
            SessionEvent::Mount { now } => self.mount(now),
            SessionEvent::SocketOpened => {
                if let Err(error) = self.channel.handle_open() {
                    tracing::debug!(%error, "unexpected socket open");
                    return Vec::new();
                }
                self.maybe_join()
            },
            SessionEvent::SocketFailed { reason } => {
                if let Some(error) = self.channel.handle_transport_failure(reason) {
                    self.error = Some(error.into());
                }
                Vec::new()
            },
            SessionEvent::RoomResolved(room) => self.room_resolved(room),
            SessionEvent::RoomFailed { reason } => {
                tracing::warn!(counterparty = %self.counterparty, %reason, "room lookup failed");
                self.resolving = false;
                self.error = Some(ChatError::Request(Resource::Room));
                Vec::new()
            },
            SessionEvent::HistoryLoaded { room_id, messages } => {
                if let Some(store) = self.store_for(&room_id) {
                    store.load_history(messages);
                }
                Vec::new()
            },
            SessionEvent::HistoryFailed { room_id, reason } => {
                tracing::warn!(%room_id, %reason, "history load failed");
                if let Some(store) = self.store_for(&room_id) {
                    store.fail_history();
                    self.error = Some(ChatError::Request(Resource::Messages));
                }
                Vec::new()
            },
            SessionEvent::Inbound(inbound) => {
                self.inbound(inbound);
                Vec::new()
            },
            SessionEvent::Input { text, now } => self.input_changed(text, now),
            SessionEvent::Submit => self.submit(),
            SessionEvent::SendFailed { reason } => {
                tracing::warn!(%reason, "send failed");
                self.error = Some(ChatError::Send);
                Vec::new()
            },
            SessionEvent::Retry => self.retry(),
            SessionEvent::Tick { now } => self.tick(now),
            SessionEvent::Unmount => {
                self.closed = true;
                self.remote_typing.clear();
                let token = self.ctx.token().to_string();
                self.channel.teardown().into_iter().map(|a| Self::lift(a, &token)).collect()
            },
        }
    }

    fn mount(&mut self, now: I) -> Vec<SessionAction> {
        let Ok(open) = self.channel.connect(now) else {
            return Vec::new();
        };
        let token = self.ctx.token().to_string();
        let mut actions: Vec<SessionAction> =
            open.into_iter().map(|a| Self::lift(a, &token)).collect();

        self.resolving = true;
        actions.push(SessionAction::ResolveRoom { counterparty: self.counterparty.clone() });
        actions
    }

    fn room_resolved(&mut self, room: Room) -> Vec<SessionAction> {
        self.resolving = false;
        if self.room_id.as_ref() == Some(&room.id) {
            return Vec::new();
        }

        match room::counterparty(&room, self.ctx.viewer()) {
            Ok(profile) => self.profile = Some(profile.clone()),
            Err(error) => tracing::warn!(room_id = %room.id, %error, "room lists no counterparty"),
        }

        tracing::info!(room_id = %room.id, counterparty = %self.counterparty, "room resolved");
        self.store = Some(MessageStore::new(room.id.clone()));
        self.room_id = Some(room.id);
        if self.error == Some(ChatError::Request(Resource::Room)) {
            self.error = None;
        }
        self.maybe_join()
    }

    fn maybe_join(&mut self) -> Vec<SessionAction> {
        let Some(room_id) = self.room_id.clone() else {
            return Vec::new();
        };
        if !self.channel.is_open() || self.channel.joined_room() == Some(&room_id) {
            return Vec::new();
        }

        let token = self.ctx.token().to_string();
        match self.channel.join(room_id.clone()) {
            Ok(join) => {
                let mut actions: Vec<SessionAction> =
                    join.into_iter().map(|a| Self::lift(a, &token)).collect();
                actions.push(SessionAction::FetchHistory { room_id });
                actions
            },
            Err(error) => {
                tracing::debug!(%error, "join refused");
                Vec::new()
            },
        }
    }

    fn inbound(&mut self, inbound: Inbound) {
        match self.channel.handle_inbound(inbound) {
            Some(ChannelEvent::Message(message)) => {
                if let Some(store) = self.store.as_mut() {
                    store.append(message);
                }
            },
            Some(ChannelEvent::Typing { user_id, is_typing }) => {
                self.remote_typing.apply(user_id, is_typing);
            },
            Some(ChannelEvent::Status { message_id, status }) => {
                if let Some(store) = self.store.as_mut() {
                    store.apply_status(&message_id, status);
                }
            },
            Some(ChannelEvent::Failed(error)) => self.error = Some(error.into()),
            None => {},
        }
    }

    fn input_changed(&mut self, text: String, now: I) -> Vec<SessionAction> {
        self.input = text;
        if self.channel.joined_room().is_none() {
            return Vec::new();
        }
        match self.typing.keystroke(now) {
            Some(signal) => self.emit_typing(signal),
            None => Vec::new(),
        }
    }

    fn submit(&mut self) -> Vec<SessionAction> {
        if self.input.trim().is_empty() {
            return Vec::new();
        }
        let Some(room_id) = self.channel.joined_room().cloned() else {
            tracing::debug!("not joined yet, keeping compose input");
            return Vec::new();
        };

        let content = std::mem::take(&mut self.input);
        let mut actions = vec![SessionAction::Emit(Outbound::text(room_id, content))];
        let stop = self.typing.on_send();
        actions.extend(self.emit_typing(stop));
        actions
    }

    fn retry(&mut self) -> Vec<SessionAction> {
        match self.error {
            Some(ChatError::Request(Resource::Room)) if !self.resolving => {
                self.error = None;
                self.resolving = true;
                vec![SessionAction::ResolveRoom { counterparty: self.counterparty.clone() }]
            },
            Some(ChatError::Request(Resource::Messages)) => {
                let Some(store) = self.store.as_mut() else {
                    return Vec::new();
                };
                if !store.retry_history() {
                    return Vec::new();
                }
                let room_id = store.room_id().clone();
                self.error = None;
                vec![SessionAction::FetchHistory { room_id }]
            },
            _ => Vec::new(),
        }
    }

    fn tick(&mut self, now: I) -> Vec<SessionAction> {
        if let Some(error) = self.channel.tick(now) {
            // The open is still in flight; cancel it
            self.error = Some(error.into());
            return vec![SessionAction::CloseSocket];
        }
        match self.typing.tick(now) {
            Some(signal) => self.emit_typing(signal),
            None => Vec::new(),
        }
    }

    fn emit_typing(&self, signal: TypingSignal) -> Vec<SessionAction> {
        let Some(room_id) = self.channel.joined_room() else {
            return Vec::new();
        };
        let event = Outbound::Typing { room_id: room_id.clone(), is_typing: signal.is_typing() };
        vec![SessionAction::Emit(event)]
    }

    fn store_for(&mut self, room_id: &RoomId) -> Option<&mut MessageStore> {
        self.store.as_mut().filter(|store| store.room_id() == room_id)
    }

    fn lift(action: ChannelAction, token: &str) -> SessionAction {
        match action {
            ChannelAction::Open => SessionAction::OpenSocket { token: token.to_string() },
            ChannelAction::Emit(event) => SessionAction::Emit(event),
            ChannelAction::Close => SessionAction::CloseSocket,
        }
    }

    /// Counterparty this session chats with.
    pub fn counterparty(&self) -> &UserId {
        &self.counterparty
    }

    /// Counterparty profile from the resolved room. `None` until resolved.
    pub fn counterparty_profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Resolved room. `None` until resolved.
    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    /// Transcript in display order.
    pub fn messages(&self) -> &[Message] {
        match &self.store {
            Some(store) => store.messages(),
            None => &[],
        }
    }

    /// Whether history is still loading.
    pub fn is_loading(&self) -> bool {
        self.error.is_none() && !self.store.as_ref().is_some_and(MessageStore::is_ready)
    }

    /// Error to show in place of the transcript.
    pub fn error(&self) -> Option<&ChatError> {
        self.error.as_ref()
    }

    /// Compose buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Whether the counterparty last reported composing.
    pub fn is_counterparty_typing(&self) -> bool {
        self.remote_typing.is_typing(&self.counterparty)
    }

    /// Whether the viewer is composing.
    pub fn is_composing(&self) -> bool {
        self.typing.is_composing()
    }

    /// Realtime channel state.
    pub fn channel_state(&self) -> &ChannelState {
        self.channel.state()
    }

    /// Whether the session has been unmounted.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Session context.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }
}
