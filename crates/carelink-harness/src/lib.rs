//! Deterministic simulation harness for Carelink chat testing.
//!
//! In-memory implementations of the [`carelink_core::env::Environment`] and
//! [`carelink_app::Driver`] traits, backed by a mock chat server, so the
//! production [`carelink_app::Runtime`] runs unchanged under a virtual clock.
//!
//! # Components
//!
//! - [`SimEnv`]: manually advanced monotonic and wall clock
//! - [`MockServer`]: REST + realtime chat backend with fault injection
//! - [`SimDriver`]: [`carelink_app::Driver`] over the mock server
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! App invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod mock_server;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    AppSnapshot, ChatSnapshot, Invariant, InvariantRegistry, InvariantResult,
    JoinedRoomIsResolved, SelectionMatchesChat, StatusMonotonicity, TranscriptInRoom, Violation,
};
pub use mock_server::{Faults, FetchStats, MockServer, SocketId};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
