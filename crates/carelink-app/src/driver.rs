//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use carelink_proto::{Inbound, Message, Outbound, Profile, Role, Room, RoomId, UnreadCounts, UserId};

use crate::{App, AppEvent, ChatId};

/// Something that happened on a chat's socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// A socket started by [`Driver::open_socket`] is connected.
    Opened,
    /// Decoded server event.
    Inbound(Inbound),
    /// Socket closed, or failed before it opened.
    Closed {
        /// Transport-level reason.
        reason: String,
    },
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the production TUI and in simulation.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, reqwest and tokio-tungstenite for
///   the network
/// - **Simulation**: in-memory mock backend with a virtual clock
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Poll for the next input event.
    ///
    /// Returns `None` if no event is ready.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<AppEvent<Self::Instant>>, Self::Error>> + Send;

    /// Fetch the contact list for a viewer with `role`.
    fn fetch_contacts(
        &mut self,
        role: Role,
    ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send;

    /// Fetch unread counts.
    fn fetch_unread(&mut self) -> impl Future<Output = Result<UnreadCounts, Self::Error>> + Send;

    /// Resolve the private room with `counterparty`.
    fn resolve_room(
        &mut self,
        counterparty: &UserId,
    ) -> impl Future<Output = Result<Room, Self::Error>> + Send;

    /// Fetch the history of `room_id`.
    fn fetch_history(
        &mut self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send;

    /// Start opening the realtime socket for `chat`.
    ///
    /// Must not wait for the connection. The outcome arrives later through
    /// [`Driver::recv_socket`] as [`SocketEvent::Opened`] or
    /// [`SocketEvent::Closed`]. Closing `chat` before then cancels the open.
    fn open_socket(&mut self, chat: ChatId, token: &str);

    /// Send an event over `chat`'s socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket is closed or the send fails.
    fn emit(
        &mut self,
        chat: ChatId,
        event: Outbound,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive the next socket event, if one is ready.
    fn recv_socket(&mut self) -> impl Future<Output = Option<(ChatId, SocketEvent)>> + Send;

    /// Close `chat`'s socket. Closing an unknown socket is a no-op.
    fn close_socket(&mut self, chat: ChatId);

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App<Self::Instant>) -> Result<(), Self::Error>;

    /// Stop all connections and clean up resources.
    fn stop(&mut self);
}
