//! Error types for the chat core.
//!
//! [`ChannelError`] covers the realtime connection lifecycle; [`RoomError`]
//! covers room resolution inputs and results. Neither is retried
//! automatically: recovery is an explicit reopen by the user.

use std::time::Duration;

use carelink_proto::UserId;
use thiserror::Error;

use crate::channel::ChannelState;

/// Errors from the realtime channel state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Operation not valid in the current state.
    #[error("invalid channel transition: cannot {operation} while {state:?}")]
    InvalidState {
        /// State when the operation was attempted.
        state: ChannelState,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Transport did not open within the connect timeout.
    #[error("connect timeout after {elapsed:?}")]
    ConnectTimeout {
        /// How long we waited.
        elapsed: Duration,
    },

    /// Transport failed to open or authenticate (`connect_error`).
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// Server pushed an `error` event on the open channel.
    #[error("server error: {0}")]
    Server(String),
}

impl ChannelError {
    /// Message shown to the user in the chat widget.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConnectTimeout { .. } | Self::ConnectFailed(_) => {
                "Failed to connect to chat server".to_string()
            },
            Self::Server(message) if !message.is_empty() => message.clone(),
            Self::Server(_) | Self::InvalidState { .. } => "An error occurred".to_string(),
        }
    }
}

/// Errors from room resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// A private room needs two distinct users.
    #[error("cannot open a private room with oneself ({0})")]
    SameUser(UserId),

    /// Resolved room does not list anyone but the viewer.
    #[error("room has no member other than {0}")]
    NoCounterparty(UserId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_failures_share_one_message() {
        let timeout = ChannelError::ConnectTimeout { elapsed: Duration::from_secs(20) };
        let refused = ChannelError::ConnectFailed("401".into());
        assert_eq!(timeout.user_message(), refused.user_message());
    }

    #[test]
    fn server_error_message_is_passed_through() {
        assert_eq!(ChannelError::Server("room closed".into()).user_message(), "room closed");
        assert_eq!(ChannelError::Server(String::new()).user_message(), "An error occurred");
    }
}
