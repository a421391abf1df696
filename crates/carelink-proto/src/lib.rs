//! Carelink chat protocol types.
//!
//! Everything that crosses a process boundary lives here: the realtime event
//! envelopes exchanged over the socket, the REST response envelopes for rooms,
//! history, contacts and unread counts, and the domain values they carry.
//!
//! # Wire format
//!
//! Realtime events are JSON text frames of the form
//! `{"event": "<name>", "data": { ... }}`. REST responses are JSON envelopes
//! carrying a `success` flag; a `false` flag is a failed request regardless of
//! the HTTP status.
//!
//! Identifiers are opaque. The server may hand out integers or strings and the
//! client treats both the same way (see [`UserId`], [`RoomId`],
//! [`MessageId`]).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod errors;
pub mod events;
mod ids;
mod model;

pub use api::UnreadCounts;
pub use errors::{ProtocolError, Result};
pub use events::{Inbound, Outbound};
pub use ids::{MessageId, RoomId, UserId};
pub use model::{
    Attachment, AttachmentKind, DeliveryStatus, Member, Message, Profile, Role, Room,
    TEXT_MESSAGE,
};
