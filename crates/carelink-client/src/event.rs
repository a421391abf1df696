//! Session and roster events and actions.

use carelink_proto::{Inbound, Message, Outbound, Profile, Role, Room, RoomId, UnreadCounts, UserId};

/// Events the caller feeds into a [`crate::ChatSession`].
///
/// The caller is responsible for:
/// - Completing the I/O requested by [`SessionAction`]s and reporting back
/// - Forwarding decoded socket events
/// - Driving time forward via ticks
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and simulation (virtual) clocks.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = std::time::Instant> {
    /// Widget opened.
    Mount {
        /// Current time from the environment.
        now: I,
    },

    /// Socket opened.
    SocketOpened,

    /// Socket could not be opened, or dropped.
    SocketFailed {
        /// Transport-level reason, for logs.
        reason: String,
    },

    /// Private room lookup succeeded.
    RoomResolved(Room),

    /// Private room lookup failed.
    RoomFailed {
        /// Failure reason, for logs.
        reason: String,
    },

    /// History fetch succeeded.
    HistoryLoaded {
        /// Room the history belongs to.
        room_id: RoomId,
        /// Messages in server order.
        messages: Vec<Message>,
    },

    /// History fetch failed.
    HistoryFailed {
        /// Room whose history failed to load.
        room_id: RoomId,
        /// Failure reason, for logs.
        reason: String,
    },

    /// Decoded server event.
    Inbound(Inbound),

    /// Compose input changed.
    Input {
        /// Full compose buffer.
        text: String,
        /// Current time from the environment.
        now: I,
    },

    /// User pressed send.
    Submit,

    /// Emitting `send_message` failed.
    SendFailed {
        /// Transport-level reason, for logs.
        reason: String,
    },

    /// User asked to retry a failed load.
    Retry,

    /// Time tick for debounce and connect timeout.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// Widget closed.
    Unmount,
}

/// Actions a [`crate::ChatSession`] produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the realtime socket with the bearer token.
    OpenSocket {
        /// Bearer token.
        token: String,
    },

    /// `GET /api/chat/rooms/private/{counterparty}`.
    ResolveRoom {
        /// The other participant.
        counterparty: UserId,
    },

    /// `GET /api/chat/rooms/{room_id}/messages`.
    FetchHistory {
        /// Room to load.
        room_id: RoomId,
    },

    /// Send this event over the socket.
    Emit(Outbound),

    /// Close the socket.
    CloseSocket,
}

/// Events the caller feeds into a [`crate::ContactRoster`].
#[derive(Debug, Clone)]
pub enum RosterEvent<I = std::time::Instant> {
    /// Roster shown.
    Mount {
        /// Current time from the environment.
        now: I,
    },

    /// Contact list fetched.
    ContactsLoaded(Vec<Profile>),

    /// Contact list fetch failed.
    ContactsFailed {
        /// Failure reason.
        reason: String,
    },

    /// Unread counts fetched.
    UnreadLoaded(UnreadCounts),

    /// Unread counts fetch failed. Logged only.
    UnreadFailed {
        /// Failure reason.
        reason: String,
    },

    /// Time tick for the unread poll.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// User picked a contact.
    Select(UserId),

    /// User closed the open chat.
    CloseChat,

    /// Search box changed.
    Search(String),

    /// A message in the conversation with `counterparty` was shown.
    MessageSeen {
        /// Contact the conversation is with.
        counterparty: UserId,
        /// The message.
        message: Message,
    },

    /// Roster hidden.
    Unmount,
}

/// Actions a [`crate::ContactRoster`] produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterAction {
    /// `GET /api/chat/patients` or `/api/chat/doctors`.
    FetchContacts {
        /// Viewer role; decides the endpoint.
        role: Role,
    },

    /// `GET /api/chat/unread`.
    FetchUnread,

    /// Open a chat widget with `counterparty`.
    OpenChat {
        /// Contact to chat with.
        counterparty: UserId,
    },

    /// Close the open chat widget.
    CloseChat,
}
