//! Domain values carried by events and responses.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MessageId, RoomId, UserId};

/// `message_type` used for plain text messages.
pub const TEXT_MESSAGE: &str = "text";

/// Portal role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Doctor; chats with patients.
    Doctor,
    /// Patient; chats with doctors.
    Patient,
}

impl Role {
    /// Role of the people this role can chat with.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Doctor => Self::Patient,
            Self::Patient => Self::Doctor,
        }
    }
}

/// Display profile of a user, as listed in contacts and room members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User id.
    pub id: UserId,
    /// Display name.
    #[serde(rename = "fullName", alias = "full_name")]
    pub full_name: String,
    /// Role tag. Older payloads omit it.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Doctor specialization. `None` for patients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}

impl Profile {
    /// Secondary line shown under the name in the roster.
    pub fn subtitle(&self) -> &str {
        match (self.role, self.specialization.as_deref()) {
            (Some(Role::Doctor), Some(spec)) => spec,
            (Some(Role::Doctor), None) => "Doctor",
            _ => "Patient",
        }
    }
}

/// Room membership entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member's user id.
    pub user_id: UserId,
    /// Member's profile.
    pub user: Profile,
}

/// Private chat room between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Opaque room id.
    pub id: RoomId,
    /// Room members. Exactly two for private rooms.
    #[serde(default)]
    pub members: Vec<Member>,
}

/// Delivery status of a message.
///
/// Ordered `Sent < Delivered < Read`; transitions only move forward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Accepted by the server.
    #[default]
    Sent,
    /// Delivered to the recipient's device.
    Delivered,
    /// Read by the recipient.
    Read,
}

impl DeliveryStatus {
    /// Status after observing `next`. `None` if `next` would regress or
    /// repeat the current status.
    pub fn advance(self, next: Self) -> Option<Self> {
        (next > self).then_some(next)
    }
}

/// Attachment kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Image file.
    Image,
    /// Document (PDF etc.).
    Document,
    /// Anything else.
    #[serde(other)]
    File,
}

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment kind.
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    /// File name.
    pub name: String,
    /// Human-readable size, e.g. "1.2 MB".
    pub size: String,
    /// Reference to the stored file.
    pub url: String,
}

/// Chat message.
///
/// Immutable after creation except for [`DeliveryStatus`] transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned id.
    pub id: MessageId,
    /// Owning room.
    pub room_id: RoomId,
    /// Author.
    pub sender_id: UserId,
    /// Text body.
    #[serde(default)]
    pub content: String,
    /// Message type tag; `"text"` unless the server says otherwise.
    #[serde(default = "text_message_type")]
    pub message_type: String,
    /// Attached files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Delivery status.
    #[serde(default)]
    pub status: DeliveryStatus,
}

fn text_message_type() -> String {
    TEXT_MESSAGE.to_string()
}

impl Message {
    /// Display order: creation time, ties broken by id.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.created_at.cmp(&other.created_at).then_with(|| self.id.cmp(&other.id))
    }

    /// Whether `viewer` wrote this message.
    pub fn is_from(&self, viewer: &UserId) -> bool {
        &self.sender_id == viewer
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn message(id: u64, secs: i64) -> Message {
        Message {
            id: MessageId::from(id),
            room_id: RoomId::from("r1"),
            sender_id: UserId::from(1),
            content: String::new(),
            message_type: TEXT_MESSAGE.to_string(),
            attachments: Vec::new(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            status: DeliveryStatus::Sent,
        }
    }

    #[test]
    fn status_never_regresses() {
        assert_eq!(DeliveryStatus::Sent.advance(DeliveryStatus::Read), Some(DeliveryStatus::Read));
        assert_eq!(DeliveryStatus::Read.advance(DeliveryStatus::Delivered), None);
        assert_eq!(DeliveryStatus::Delivered.advance(DeliveryStatus::Delivered), None);
    }

    #[test]
    fn display_order_breaks_ties_by_id() {
        let a = message(2, 100);
        let b = message(10, 100);
        let c = message(1, 200);
        assert_eq!(a.display_cmp(&b), Ordering::Less);
        assert_eq!(c.display_cmp(&b), Ordering::Greater);
    }

    #[test]
    fn message_defaults_fill_optional_fields() {
        let json = r#"{
            "id": 5,
            "room_id": "r1",
            "sender_id": 3,
            "content": "hi",
            "created_at": "2024-03-01T10:00:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.message_type, TEXT_MESSAGE);
        assert_eq!(msg.status, DeliveryStatus::Sent);
        assert!(msg.attachments.is_empty());
    }

    #[test]
    fn profile_subtitle_follows_role() {
        let doctor = Profile {
            id: UserId::from(1),
            full_name: "Dr. Grey".into(),
            role: Some(Role::Doctor),
            specialization: Some("Cardiology".into()),
        };
        let patient = Profile { role: Some(Role::Patient), specialization: None, ..doctor.clone() };
        assert_eq!(doctor.subtitle(), "Cardiology");
        assert_eq!(patient.subtitle(), "Patient");
    }

    #[test]
    fn unknown_attachment_kind_is_file() {
        let json = r#"{"type": "audio", "name": "a.mp3", "size": "2 MB", "url": "/f/1"}"#;
        let attachment: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(attachment.kind, AttachmentKind::File);
    }
}
