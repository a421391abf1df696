//! Carelink chat core
//!
//! Pure, I/O-free building blocks of the chat subsystem. Each component is a
//! small state machine that takes time as an explicit input and returns
//! actions for the caller to execute, so the same code runs under a real
//! clock and under simulation.
//!
//! # Components
//!
//! - [`channel::Channel`]: realtime connection lifecycle and room scoping
//! - [`store::MessageStore`]: per-room transcript seeded by history
//! - [`typing::TypingIndicator`]: local composing state with debounce
//! - [`typing::RemoteTyping`]: counterparty composing state
//! - [`poll::PollTimer`]: fixed-interval schedule for unread polling
//! - [`room`]: room pair validation and counterparty extraction
//! - [`transcript`]: calendar-day grouping for display
//! - [`env::Environment`]: time source abstraction

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod channel;
pub mod env;
pub mod error;
pub mod poll;
pub mod room;
pub mod store;
pub mod transcript;
pub mod typing;

pub use carelink_proto as proto;
