//! Standard invariant checks.

use super::{AppSnapshot, Invariant, InvariantResult, Violation};

/// Roster selection and the open chat agree.
///
/// A selected contact always has its chat open, and an open chat always
/// belongs to the selected contact. At most one chat exists at a time.
pub struct SelectionMatchesChat;

impl Invariant for SelectionMatchesChat {
    fn name(&self) -> &'static str {
        "selection_matches_chat"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        let open = state.chat.as_ref().map(|chat| &chat.counterparty);
        if state.selected.as_ref() != open {
            return Err(Violation {
                invariant: self.name(),
                message: format!("selected {:?} but open chat is {open:?}", state.selected),
            });
        }
        Ok(())
    }
}

/// The transcript only holds messages of the resolved room.
///
/// Before the room resolves the transcript is empty.
pub struct TranscriptInRoom;

impl Invariant for TranscriptInRoom {
    fn name(&self) -> &'static str {
        "transcript_in_room"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        let Some(chat) = &state.chat else {
            return Ok(());
        };
        for (id, room_id, _) in &chat.messages {
            if chat.room_id.as_ref() != Some(room_id) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "message {id} from room {room_id} shown in chat for room {:?}",
                        chat.room_id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The socket is joined to the resolved room or to nothing.
pub struct JoinedRoomIsResolved;

impl Invariant for JoinedRoomIsResolved {
    fn name(&self) -> &'static str {
        "joined_room_is_resolved"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        let Some(chat) = &state.chat else {
            return Ok(());
        };
        if let Some(joined) = &chat.joined_room
            && chat.room_id.as_ref() != Some(joined)
        {
            return Err(Violation {
                invariant: self.name(),
                message: format!("joined {joined} but resolved room is {:?}", chat.room_id),
            });
        }
        Ok(())
    }
}

/// Delivery status never moves backwards.
pub struct StatusMonotonicity;

impl Invariant for StatusMonotonicity {
    fn name(&self) -> &'static str {
        "status_monotonicity"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        for (id, history) in &state.status_history {
            for window in history.windows(2) {
                if window[1] < window[0] {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "message {id}: status went from {:?} to {:?}",
                            window[0], window[1]
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use carelink_proto::{DeliveryStatus, MessageId, RoomId, UserId};

    use super::*;
    use crate::invariants::ChatSnapshot;

    fn chat(room: Option<&str>, joined: Option<&str>, messages: &[(u64, &str)]) -> ChatSnapshot {
        ChatSnapshot {
            counterparty: UserId::from(7),
            room_id: room.map(RoomId::from),
            joined_room: joined.map(RoomId::from),
            messages: messages
                .iter()
                .map(|(id, room)| (MessageId::from(*id), RoomId::from(*room), DeliveryStatus::Sent))
                .collect(),
        }
    }

    fn with_chat(chat: ChatSnapshot) -> AppSnapshot {
        AppSnapshot {
            selected: Some(chat.counterparty.clone()),
            chat: Some(chat),
            ..Default::default()
        }
    }

    #[test]
    fn selection_without_chat_is_violation() {
        let state = AppSnapshot { selected: Some(UserId::from(7)), ..Default::default() };
        assert!(SelectionMatchesChat.check(&state).is_err());
        assert!(SelectionMatchesChat.check(&with_chat(chat(None, None, &[]))).is_ok());
    }

    #[test]
    fn foreign_message_is_violation() {
        let ok = with_chat(chat(Some("r1"), Some("r1"), &[(1, "r1")]));
        assert!(TranscriptInRoom.check(&ok).is_ok());

        let foreign = with_chat(chat(Some("r1"), Some("r1"), &[(1, "r1"), (2, "r5")]));
        let err = TranscriptInRoom.check(&foreign).unwrap_err();
        assert_eq!(err.invariant, "transcript_in_room");

        let unresolved = with_chat(chat(None, None, &[(1, "r1")]));
        assert!(TranscriptInRoom.check(&unresolved).is_err());
    }

    #[test]
    fn joined_other_room_is_violation() {
        assert!(JoinedRoomIsResolved.check(&with_chat(chat(Some("r1"), None, &[]))).is_ok());
        assert!(JoinedRoomIsResolved.check(&with_chat(chat(Some("r1"), Some("r2"), &[]))).is_err());
    }

    #[test]
    fn status_regression_is_violation() {
        let mut state = AppSnapshot::empty();
        state.status_history = HashMap::from([(
            MessageId::from(1),
            vec![DeliveryStatus::Sent, DeliveryStatus::Read, DeliveryStatus::Delivered],
        )]);
        assert!(StatusMonotonicity.check(&state).is_err());

        state.status_history =
            HashMap::from([(MessageId::from(1), vec![DeliveryStatus::Sent, DeliveryStatus::Read])]);
        assert!(StatusMonotonicity.check(&state).is_ok());
    }
}
