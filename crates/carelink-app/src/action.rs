//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use carelink_proto::{Outbound, Role, RoomId, UserId};

use crate::ChatId;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Fetch the contact list.
    FetchContacts {
        /// Viewer role; decides the endpoint.
        role: Role,
    },

    /// Fetch unread counts.
    FetchUnread,

    /// Open the realtime socket for a chat.
    OpenSocket {
        /// Chat that owns the socket.
        chat: ChatId,
        /// Bearer token.
        token: String,
    },

    /// Resolve the private room for a chat.
    ResolveRoom {
        /// Chat that asked.
        chat: ChatId,
        /// The other participant.
        counterparty: UserId,
    },

    /// Fetch a room's history for a chat.
    FetchHistory {
        /// Chat that asked.
        chat: ChatId,
        /// Room to load.
        room_id: RoomId,
    },

    /// Send an event over a chat's socket.
    Emit {
        /// Chat that owns the socket.
        chat: ChatId,
        /// Event to send.
        event: Outbound,
    },

    /// Close a chat's socket.
    CloseSocket {
        /// Chat that owns the socket.
        chat: ChatId,
    },
}
