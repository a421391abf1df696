//! Client errors.

use std::fmt;

use carelink_core::error::{ChannelError, RoomError};
use thiserror::Error;

/// Errors building or driving the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No bearer token: no chat surface may be created.
    #[error("missing bearer token")]
    MissingToken,

    /// Invalid room request.
    #[error(transparent)]
    Room(#[from] RoomError),
}

/// Resource a failed request was loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Private room lookup.
    Room,
    /// Room history.
    Messages,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room => f.write_str("chat room"),
            Self::Messages => f.write_str("messages"),
        }
    }
}

/// The single user-visible error of a chat widget.
///
/// Rendered in place of the transcript. Nothing is retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Realtime connection could not be established.
    #[error("Failed to connect to chat server")]
    Connect,

    /// A REST request failed or returned `success: false`.
    #[error("Failed to load {0}")]
    Request(Resource),

    /// Server pushed an error on the open channel.
    #[error("{0}")]
    Server(String),

    /// Emitting a message failed.
    #[error("Failed to send message")]
    Send,
}

impl From<ChannelError> for ChatError {
    fn from(error: ChannelError) -> Self {
        match error {
            ChannelError::ConnectTimeout { .. } | ChannelError::ConnectFailed(_) => Self::Connect,
            other => Self::Server(other.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_text() {
        assert_eq!(ChatError::Request(Resource::Room).to_string(), "Failed to load chat room");
        assert_eq!(ChatError::Request(Resource::Messages).to_string(), "Failed to load messages");
        assert_eq!(
            ChatError::from(ChannelError::Server(String::new())).to_string(),
            "An error occurred"
        );
        assert_eq!(
            ChatError::from(ChannelError::ConnectFailed("401".into())),
            ChatError::Connect
        );
    }
}
