//! Realtime events.
//!
//! Each socket text frame is one event, adjacently tagged:
//!
//! ```json
//! {"event": "join_room", "data": {"room_id": "r1"}}
//! ```
//!
//! [`Outbound`] events are emitted by the client, [`Inbound`] events are pushed
//! by the server. Unknown event names fail to decode; the caller logs and drops
//! them.

use serde::{Deserialize, Serialize};

use crate::{DeliveryStatus, Message, MessageId, Result, RoomId, TEXT_MESSAGE, UserId};

/// Events the client emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Outbound {
    /// Subscribe to a room's events.
    JoinRoom {
        /// Room to join.
        room_id: RoomId,
    },

    /// Unsubscribe from a room's events.
    LeaveRoom {
        /// Room to leave.
        room_id: RoomId,
    },

    /// Post a message. The server echoes it back as [`Inbound::NewMessage`].
    SendMessage {
        /// Target room.
        room_id: RoomId,
        /// Message body.
        content: String,
        /// Message type tag.
        message_type: String,
    },

    /// Local composing state changed.
    Typing {
        /// Room the viewer is typing in.
        room_id: RoomId,
        /// `true` on start, `false` on stop.
        is_typing: bool,
    },
}

impl Outbound {
    /// Plain text message for `room_id`.
    pub fn text(room_id: RoomId, content: impl Into<String>) -> Self {
        Self::SendMessage {
            room_id,
            content: content.into(),
            message_type: TEXT_MESSAGE.to_string(),
        }
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join_room",
            Self::LeaveRoom { .. } => "leave_room",
            Self::SendMessage { .. } => "send_message",
            Self::Typing { .. } => "typing",
        }
    }

    /// Room the event targets.
    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::JoinRoom { room_id }
            | Self::LeaveRoom { room_id }
            | Self::SendMessage { room_id, .. }
            | Self::Typing { room_id, .. } => room_id,
        }
    }

    /// Encode as a socket text frame.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a socket text frame.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Events the server pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Inbound {
    /// A message was posted to a joined room (including the viewer's own).
    NewMessage(Message),

    /// A room member's composing state changed.
    UserTyping {
        /// Whose state changed. May be the viewer (self-echo).
        user_id: UserId,
        /// Room, when the server includes it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        /// Composing or not.
        is_typing: bool,
    },

    /// Delivery status of a message moved on.
    MessageStatus {
        /// Message whose status changed.
        message_id: MessageId,
        /// New status.
        status: DeliveryStatus,
    },

    /// Connection could not be established or authenticated.
    ConnectError {
        /// Transport or auth failure description.
        #[serde(default)]
        message: String,
    },

    /// Application error on an open connection.
    Error {
        /// Server-provided description.
        #[serde(default)]
        message: String,
    },
}

impl Inbound {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "new_message",
            Self::UserTyping { .. } => "user_typing",
            Self::MessageStatus { .. } => "message_status",
            Self::ConnectError { .. } => "connect_error",
            Self::Error { .. } => "error",
        }
    }

    /// Encode as a socket text frame.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a socket text frame.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
