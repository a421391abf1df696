//! Terminal UI for Carelink chat
//!
//! A thin shell over [`carelink_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`carelink_app::Runtime`].
//!
//! This crate only handles terminal rendering and wiring the REST and socket
//! transports to the driver interface.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod terminal;
pub mod ui;

pub use carelink_app::{App, AppAction, AppEvent, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
pub use ui::Clock;
