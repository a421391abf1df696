//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - User interactions (keyboard, resize) and system ticks.
//! - Completions of I/O the App asked for, tagged with the chat that asked.

use carelink_client::SessionEvent;
use carelink_proto::{Profile, UnreadCounts};

use crate::{ChatId, KeyInput};

/// Events processed by the App state machine.
///
/// Generic over `I` (Instant type) so simulation can use virtual time.
#[derive(Debug, Clone)]
pub enum AppEvent<I = std::time::Instant> {
    /// Application started: mount the roster.
    Start {
        /// Current time from the environment.
        now: I,
    },

    /// Keyboard input.
    Key {
        /// Key pressed.
        key: KeyInput,
        /// Current time from the environment.
        now: I,
    },

    /// Periodic tick.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Contact list fetched.
    ContactsLoaded(Vec<Profile>),

    /// Contact list fetch failed.
    ContactsFailed {
        /// Failure reason.
        reason: String,
    },

    /// Unread counts fetched.
    UnreadLoaded(UnreadCounts),

    /// Unread counts fetch failed.
    UnreadFailed {
        /// Failure reason.
        reason: String,
    },

    /// Completion or socket event for a chat widget.
    Chat {
        /// Chat the event belongs to.
        chat: ChatId,
        /// Session event.
        event: SessionEvent<I>,
    },
}
