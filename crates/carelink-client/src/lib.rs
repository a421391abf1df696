//! Client
//!
//! Action-based chat session and contact roster for the Carelink portal.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and action-based patterns as
//! [`carelink_core`]. It receives events ([`SessionEvent`], [`RosterEvent`]),
//! processes them through pure state machine logic, and returns actions
//! ([`SessionAction`], [`RosterAction`]) for the caller to execute.
//!
//! # Components
//!
//! - [`ChatSession`]: one open conversation (room, channel, transcript, typing)
//! - [`ContactRoster`]: contacts, unread polling, chat selection
//! - [`SessionContext`]: authenticated viewer passed to every surface
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ApiClient`]: REST client for rooms, history, contacts, unread
//! - [`transport::connect`]: open the realtime socket
//! - [`transport::SystemEnv`]: production time source

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod context;
mod error;
mod event;
mod roster;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use carelink_core::env::Environment;
pub use context::SessionContext;
pub use error::{ChatError, ClientError, Resource};
pub use event::{RosterAction, RosterEvent, SessionAction, SessionEvent};
pub use roster::{ContactRoster, RosterConfig};
pub use session::{ChatSession, SessionConfig};
