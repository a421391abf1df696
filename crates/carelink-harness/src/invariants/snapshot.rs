//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture what the App exposes at a point in time. Invariants
//! operate on snapshots rather than live state so each check sees one
//! consistent view.

use std::collections::HashMap;

use carelink_app::App;
use carelink_core::channel::ChannelState;
use carelink_proto::{DeliveryStatus, MessageId, RoomId, UserId};

/// Snapshot of one App.
#[derive(Debug, Clone, Default)]
pub struct AppSnapshot {
    /// Contact selected in the roster.
    pub selected: Option<UserId>,
    /// Open chat, if any.
    pub chat: Option<ChatSnapshot>,
    /// Every status observed per message, oldest first.
    pub status_history: HashMap<MessageId, Vec<DeliveryStatus>>,
}

/// Snapshot of the open chat.
#[derive(Debug, Clone)]
pub struct ChatSnapshot {
    /// Counterparty the chat was opened for.
    pub counterparty: UserId,
    /// Resolved room.
    pub room_id: Option<RoomId>,
    /// Room the socket is joined to.
    pub joined_room: Option<RoomId>,
    /// `(id, room, status)` of each transcript message, in display order.
    pub messages: Vec<(MessageId, RoomId, DeliveryStatus)>,
}

impl AppSnapshot {
    /// Snapshot with no selection and no chat.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture `app`'s observable state.
    pub fn from_app<I>(app: &App<I>) -> Self
    where
        I: Copy + Ord + Send + Sync + std::ops::Sub<Output = std::time::Duration>,
    {
        let chat = app.chat().map(|session| ChatSnapshot {
            counterparty: session.counterparty().clone(),
            room_id: session.room_id().cloned(),
            joined_room: match session.channel_state() {
                ChannelState::Joined(room_id) => Some(room_id.clone()),
                _ => None,
            },
            messages: session
                .messages()
                .iter()
                .map(|m| (m.id.clone(), m.room_id.clone(), m.status))
                .collect(),
        });

        Self { selected: app.roster().selected().cloned(), chat, status_history: HashMap::new() }
    }

    /// Append the statuses in this snapshot to `history` and attach the
    /// result, so monotonicity can be checked across snapshots.
    pub fn with_history(mut self, history: &mut HashMap<MessageId, Vec<DeliveryStatus>>) -> Self {
        if let Some(chat) = &self.chat {
            for (id, _, status) in &chat.messages {
                let seen = history.entry(id.clone()).or_default();
                if seen.last() != Some(status) {
                    seen.push(*status);
                }
            }
        }
        self.status_history = history.clone();
        self
    }
}
