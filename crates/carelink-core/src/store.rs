//! Per-room message store.
//!
//! Holds the transcript of the single room a chat widget has joined. Seeded
//! once by the history fetch, then extended by live `new_message` events.
//!
//! # Invariants
//!
//! - Only messages for the store's room are ever added.
//! - A successful history load keeps the server's order verbatim.
//! - Live messages received before history completes are never lost: they are
//!   kept after the history entries, minus any id the history already holds.
//! - After history is settled, live messages append to the tail unconditionally.
//! - Delivery status only moves forward.

use carelink_proto::{DeliveryStatus, Message, MessageId, RoomId};

/// Progress of the initial history load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// Fetch issued, not yet completed.
    Pending,
    /// History loaded.
    Ready,
    /// History fetch failed. Live messages still append.
    Failed,
}

/// Ordered transcript for one room.
#[derive(Debug, Clone)]
pub struct MessageStore {
    room_id: RoomId,
    messages: Vec<Message>,
    history: HistoryState,
}

impl MessageStore {
    /// Empty store for `room_id`, waiting on history.
    pub fn new(room_id: RoomId) -> Self {
        Self { room_id, messages: Vec::new(), history: HistoryState::Pending }
    }

    /// Room this store belongs to.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// History load progress.
    pub fn history(&self) -> HistoryState {
        self.history
    }

    /// Whether history has loaded.
    pub fn is_ready(&self) -> bool {
        self.history == HistoryState::Ready
    }

    /// Seed the store with the room's history.
    ///
    /// Messages for other rooms are dropped. Ignored unless history is still
    /// pending, so a late duplicate completion cannot wipe live messages.
    pub fn load_history(&mut self, history: Vec<Message>) {
        if self.history != HistoryState::Pending {
            tracing::debug!(room_id = %self.room_id, "ignoring late history load");
            return;
        }

        let mut merged: Vec<Message> =
            history.into_iter().filter(|msg| msg.room_id == self.room_id).collect();
        let early = std::mem::take(&mut self.messages);
        for msg in early {
            if !merged.iter().any(|known| known.id == msg.id) {
                merged.push(msg);
            }
        }

        self.messages = merged;
        self.history = HistoryState::Ready;
    }

    /// History fetch failed; keep whatever is already shown.
    pub fn fail_history(&mut self) {
        if self.history == HistoryState::Pending {
            self.history = HistoryState::Failed;
        }
    }

    /// Re-arm a failed history load. Returns `true` if a new fetch is needed.
    pub fn retry_history(&mut self) -> bool {
        if self.history == HistoryState::Failed {
            self.history = HistoryState::Pending;
            return true;
        }
        false
    }

    /// Append a live message to the tail.
    ///
    /// Returns `false` if the message belongs to another room.
    pub fn append(&mut self, message: Message) -> bool {
        if message.room_id != self.room_id {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Advance the delivery status of every stored copy of `message_id`.
    ///
    /// Returns `true` if anything changed.
    pub fn apply_status(&mut self, message_id: &MessageId, status: DeliveryStatus) -> bool {
        let mut changed = false;
        for msg in self.messages.iter_mut().filter(|msg| &msg.id == message_id) {
            if let Some(next) = msg.status.advance(status) {
                msg.status = next;
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use carelink_proto::{TEXT_MESSAGE, UserId};
    use chrono::{TimeZone, Utc};

    use super::*;

    fn message(id: u64, room: &str, secs: i64) -> Message {
        Message {
            id: MessageId::from(id),
            room_id: RoomId::from(room),
            sender_id: UserId::from(2),
            content: format!("m{id}"),
            message_type: TEXT_MESSAGE.into(),
            attachments: Vec::new(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            status: DeliveryStatus::Sent,
        }
    }

    fn ids(store: &MessageStore) -> Vec<String> {
        store.messages().iter().map(|m| m.id.to_string()).collect()
    }

    #[test]
    fn history_keeps_server_order() {
        let mut store = MessageStore::new(RoomId::from("r1"));
        // Deliberately out of timestamp order
        store.load_history(vec![message(2, "r1", 200), message(1, "r1", 100)]);

        assert!(store.is_ready());
        assert_eq!(ids(&store), vec!["2", "1"]);
    }

    #[test]
    fn early_live_messages_survive_history() {
        let mut store = MessageStore::new(RoomId::from("r1"));
        store.append(message(3, "r1", 300));
        store.append(message(2, "r1", 200));

        store.load_history(vec![message(1, "r1", 100), message(2, "r1", 200)]);

        assert_eq!(ids(&store), vec!["1", "2", "3"]);
    }

    #[test]
    fn live_append_after_ready_does_not_dedup() {
        let mut store = MessageStore::new(RoomId::from("r1"));
        store.load_history(vec![message(1, "r1", 100)]);
        store.append(message(1, "r1", 100));

        assert_eq!(ids(&store), vec!["1", "1"]);
    }

    #[test]
    fn late_history_is_ignored() {
        let mut store = MessageStore::new(RoomId::from("r1"));
        store.load_history(vec![message(1, "r1", 100)]);
        store.append(message(2, "r1", 200));
        store.load_history(Vec::new());

        assert_eq!(ids(&store), vec!["1", "2"]);
    }

    #[test]
    fn failed_history_keeps_live_messages_flowing() {
        let mut store = MessageStore::new(RoomId::from("r1"));
        store.append(message(5, "r1", 500));
        store.fail_history();
        store.append(message(6, "r1", 600));

        assert_eq!(store.history(), HistoryState::Failed);
        assert_eq!(ids(&store), vec!["5", "6"]);
    }

    #[test]
    fn foreign_room_messages_are_rejected() {
        let mut store = MessageStore::new(RoomId::from("r1"));
        assert!(!store.append(message(1, "r5", 100)));
        store.load_history(vec![message(2, "r5", 100)]);
        assert!(store.messages().is_empty());
    }

    #[test]
    fn status_only_moves_forward() {
        let mut store = MessageStore::new(RoomId::from("r1"));
        store.load_history(vec![message(1, "r1", 100)]);

        assert!(store.apply_status(&MessageId::from(1), DeliveryStatus::Read));
        assert!(!store.apply_status(&MessageId::from(1), DeliveryStatus::Delivered));
        assert_eq!(store.messages()[0].status, DeliveryStatus::Read);
        assert!(!store.apply_status(&MessageId::from(9), DeliveryStatus::Read));
    }
}
