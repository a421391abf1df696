//! Private room helpers.
//!
//! Room ids are always assigned by the server; these helpers only validate the
//! request and interpret the response.

use carelink_proto::{Profile, Room, UserId};

use crate::error::RoomError;

/// Check that a private room can be requested between `viewer` and
/// `counterparty`.
pub fn validate_pair(viewer: &UserId, counterparty: &UserId) -> Result<(), RoomError> {
    if viewer == counterparty {
        return Err(RoomError::SameUser(viewer.clone()));
    }
    Ok(())
}

/// Profile of the member of `room` who is not `viewer`.
pub fn counterparty<'a>(room: &'a Room, viewer: &UserId) -> Result<&'a Profile, RoomError> {
    room.members
        .iter()
        .find(|member| &member.user_id != viewer)
        .map(|member| &member.user)
        .ok_or_else(|| RoomError::NoCounterparty(viewer.clone()))
}

/// Unordered user pair, normalised so `(a, b)` and `(b, a)` are equal.
///
/// Used by the backend side of the simulation to keep one room per pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(UserId, UserId);

impl PairKey {
    /// Normalised key for the pair.
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    /// Whether `user` is one of the pair.
    pub fn contains(&self, user: &UserId) -> bool {
        &self.0 == user || &self.1 == user
    }
}
