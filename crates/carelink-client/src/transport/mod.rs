//! Network transport for the chat client.
//!
//! Thin I/O layers that carry the Sans-IO session's requests: [`ApiClient`] for
//! the REST endpoints and [`connect`] for the realtime socket. Protocol logic
//! stays in [`crate::ChatSession`] and [`crate::ContactRoster`].

mod api;
mod socket;
mod system_env;

use thiserror::Error;

pub use api::ApiClient;
pub use socket::{ConnectedSocket, connect, connect_within};
pub use system_env::SystemEnv;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(String),

    /// Server answered with `success: false` or an unexpected body.
    #[error("protocol error: {0}")]
    Protocol(#[from] carelink_proto::ProtocolError),

    /// Connection or request did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Socket closed or the send channel is gone.
    #[error("socket closed")]
    Closed,
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error.to_string())
    }
}
