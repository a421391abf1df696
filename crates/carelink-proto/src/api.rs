//! REST endpoints and response envelopes.
//!
//! Every response carries a `success` flag. The `into_*` helpers on each
//! envelope turn it into its payload or a [`ProtocolError::Rejected`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Message, Profile, ProtocolError, Result, Role, Room, RoomId, UserId};

/// Unread message counts keyed by counterparty id.
pub type UnreadCounts = HashMap<UserId, u32>;

/// Path of the private-room lookup for `counterparty`.
pub fn private_room_path(counterparty: &UserId) -> String {
    format!("/api/chat/rooms/private/{counterparty}")
}

/// Path of the message history of `room_id`.
pub fn history_path(room_id: &RoomId) -> String {
    format!("/api/chat/rooms/{room_id}/messages")
}

/// Contacts endpoint for a viewer with `role`.
pub fn contacts_path(role: Role) -> &'static str {
    match role {
        Role::Doctor => "/api/chat/patients",
        Role::Patient => "/api/chat/doctors",
    }
}

/// Unread counts endpoint.
pub const UNREAD_PATH: &str = "/api/chat/unread";

fn rejected(message: Option<String>) -> ProtocolError {
    ProtocolError::Rejected { reason: message.unwrap_or_else(|| "unknown error".to_string()) }
}

/// `GET /api/chat/rooms/private/{id}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomResponse {
    /// Server success flag.
    pub success: bool,
    /// Resolved room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RoomResponse {
    /// Successful response for `room`.
    pub fn ok(room: Room) -> Self {
        Self { success: true, room: Some(room), message: None }
    }

    /// Extract the room.
    pub fn into_room(self) -> Result<Room> {
        if !self.success {
            return Err(rejected(self.message));
        }
        self.room.ok_or(ProtocolError::MissingField("room"))
    }
}

/// `GET /api/chat/rooms/{id}/messages` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Server success flag.
    pub success: bool,
    /// Messages in chronological order.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HistoryResponse {
    /// Successful response carrying `messages`.
    pub fn ok(messages: Vec<Message>) -> Self {
        Self { success: true, messages, message: None }
    }

    /// Extract the messages, in the order the server returned them.
    pub fn into_messages(self) -> Result<Vec<Message>> {
        if !self.success {
            return Err(rejected(self.message));
        }
        Ok(self.messages)
    }
}

/// `GET /api/chat/patients` or `/api/chat/doctors` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactsResponse {
    /// Server success flag.
    pub success: bool,
    /// Present when a doctor asked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patients: Option<Vec<Profile>>,
    /// Present when a patient asked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctors: Option<Vec<Profile>>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ContactsResponse {
    /// Successful response for a viewer with `viewer_role`.
    pub fn ok(viewer_role: Role, contacts: Vec<Profile>) -> Self {
        let (patients, doctors) = match viewer_role {
            Role::Doctor => (Some(contacts), None),
            Role::Patient => (None, Some(contacts)),
        };
        Self { success: true, patients, doctors, message: None }
    }

    /// Extract the contact list matching `viewer_role`.
    pub fn into_contacts(self, viewer_role: Role) -> Result<Vec<Profile>> {
        if !self.success {
            return Err(rejected(self.message));
        }
        match viewer_role {
            Role::Doctor => self.patients.ok_or(ProtocolError::MissingField("patients")),
            Role::Patient => self.doctors.ok_or(ProtocolError::MissingField("doctors")),
        }
    }
}

/// `GET /api/chat/unread` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadResponse {
    /// Server success flag.
    pub success: bool,
    /// Unread count per counterparty.
    #[serde(default)]
    pub unread_counts: UnreadCounts,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UnreadResponse {
    /// Successful response carrying `counts`.
    pub fn ok(counts: UnreadCounts) -> Self {
        Self { success: true, unread_counts: counts, message: None }
    }

    /// Extract the counts.
    pub fn into_counts(self) -> Result<UnreadCounts> {
        if !self.success {
            return Err(rejected(self.message));
        }
        Ok(self.unread_counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_response_parses_members() {
        let json = r#"{
            "success": true,
            "room": {
                "id": "r1",
                "members": [
                    {"user_id": 1, "user": {"id": 1, "fullName": "Dr. Grey", "type": "doctor"}},
                    {"user_id": 7, "user": {"id": 7, "fullName": "Sam Patient", "type": "patient"}}
                ]
            }
        }"#;
        let room = serde_json::from_str::<RoomResponse>(json).unwrap().into_room().unwrap();
        assert_eq!(room.id, RoomId::from("r1"));
        assert_eq!(room.members.len(), 2);
        assert_eq!(room.members[1].user.full_name, "Sam Patient");
    }

    #[test]
    fn unsuccessful_envelope_is_rejected() {
        let json = r#"{"success": false, "message": "forbidden"}"#;
        let err = serde_json::from_str::<HistoryResponse>(json).unwrap().into_messages();
        assert_eq!(err, Err(ProtocolError::Rejected { reason: "forbidden".into() }));
    }

    #[test]
    fn contacts_key_follows_viewer_role() {
        let json = r#"{"success": true, "patients": [{"id": 7, "fullName": "Sam"}]}"#;
        let response: ContactsResponse = serde_json::from_str(json).unwrap();
        assert!(response.clone().into_contacts(Role::Patient).is_err());
        assert_eq!(response.into_contacts(Role::Doctor).unwrap().len(), 1);
    }

    #[test]
    fn unread_counts_accept_string_keys() {
        let json = r#"{"success": true, "unread_counts": {"7": 2}}"#;
        let counts = serde_json::from_str::<UnreadResponse>(json).unwrap().into_counts().unwrap();
        assert_eq!(counts.get(&UserId::from(7)), Some(&2));
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(private_room_path(&UserId::from(7)), "/api/chat/rooms/private/7");
        assert_eq!(history_path(&RoomId::from("r1")), "/api/chat/rooms/r1/messages");
        assert_eq!(contacts_path(Role::Doctor), "/api/chat/patients");
        assert_eq!(contacts_path(Role::Patient), "/api/chat/doctors");
    }
}
