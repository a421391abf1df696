//! Property-based tests for the core state machines.
//!
//! The channel, store and typing indicator are fed arbitrary event sequences;
//! the checks here are the invariants the chat widget relies on regardless of
//! arrival order.

use std::{ops::Sub, time::Duration};

use carelink_core::{
    channel::{Channel, ChannelAction, ChannelConfig, ChannelEvent},
    proto::{DeliveryStatus, Inbound, Message, MessageId, Outbound, RoomId, TEXT_MESSAGE, UserId},
    store::MessageStore,
    typing::{TypingConfig, TypingIndicator, TypingSignal},
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

/// Virtual instant in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Millis(u64);

impl Sub for Millis {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

const VIEWER: u64 = 1;

fn message(id: u64, room: u8, sender: u64) -> Message {
    Message {
        id: MessageId::from(id),
        room_id: RoomId::from(format!("r{room}")),
        sender_id: UserId::from(sender),
        content: format!("m{id}"),
        message_type: TEXT_MESSAGE.into(),
        attachments: Vec::new(),
        created_at: Utc.timestamp_opt(id as i64, 0).unwrap(),
        status: DeliveryStatus::Sent,
    }
}

fn inbound_strategy() -> impl Strategy<Value = Inbound> {
    prop_oneof![
        4 => (1u64..100, 1u8..4, 1u64..4).prop_map(|(id, room, sender)| {
            Inbound::NewMessage(message(id, room, sender))
        }),
        2 => (1u64..4, any::<bool>()).prop_map(|(user, is_typing)| Inbound::UserTyping {
            user_id: UserId::from(user),
            room_id: None,
            is_typing,
        }),
        1 => Just(Inbound::Error { message: "boom".into() }),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Inbound(Inbound),
    Join(u8),
    Teardown,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        8 => inbound_strategy().prop_map(Step::Inbound),
        2 => (1u8..4).prop_map(Step::Join),
        1 => Just(Step::Teardown),
    ]
}

proptest! {
    #[test]
    fn prop_channel_only_surfaces_joined_room(steps in prop::collection::vec(step_strategy(), 0..40)) {
        let mut channel: Channel<Millis> = Channel::new(UserId::from(VIEWER), ChannelConfig::default());
        channel.connect(Millis(0)).unwrap();
        channel.handle_open().unwrap();

        let mut torn_down = false;
        let mut leaves = 0usize;
        for step in steps {
            match step {
                Step::Join(room) => {
                    if let Ok(actions) = channel.join(RoomId::from(format!("r{room}"))) {
                        // Leave always precedes join
                        if let [ChannelAction::Emit(first), ..] = actions.as_slice() {
                            if actions.len() == 2 {
                                prop_assert_eq!(first.name(), "leave_room");
                            }
                        }
                    }
                },
                Step::Teardown => {
                    for action in channel.teardown() {
                        if let ChannelAction::Emit(Outbound::LeaveRoom { .. }) = action {
                            leaves += 1;
                        }
                    }
                    torn_down = true;
                },
                Step::Inbound(event) => {
                    let joined = channel.joined_room().cloned();
                    let surfaced = channel.handle_inbound(event);
                    if torn_down {
                        prop_assert!(surfaced.is_none());
                    }
                    match surfaced {
                        Some(ChannelEvent::Message(msg)) => {
                            prop_assert_eq!(Some(msg.room_id), joined);
                        },
                        Some(ChannelEvent::Typing { user_id, .. }) => {
                            prop_assert_ne!(user_id, UserId::from(VIEWER));
                        },
                        _ => {},
                    }
                },
            }
        }
        prop_assert!(leaves <= 1);
    }

    #[test]
    fn prop_store_never_loses_live_messages(
        early in prop::collection::vec(1u64..50, 0..10),
        history in prop::collection::vec(1u64..50, 0..10),
        late in prop::collection::vec(1u64..50, 0..10),
    ) {
        let mut store = MessageStore::new(RoomId::from("r1"));
        for id in &early {
            store.append(message(*id, 1, 2));
        }
        store.load_history(history.iter().map(|id| message(*id, 1, 2)).collect());
        for id in &late {
            store.append(message(*id, 1, 2));
        }

        let stored: Vec<MessageId> = store.messages().iter().map(|m| m.id.clone()).collect();

        // History comes first, verbatim
        let expected: Vec<MessageId> = history.iter().map(|id| MessageId::from(*id)).collect();
        prop_assert_eq!(&stored[..history.len()], expected.as_slice());

        // Every live id is present
        for id in early.iter().chain(late.iter()) {
            prop_assert!(stored.contains(&MessageId::from(*id)));
        }

        // Late messages are a verbatim tail
        let tail: Vec<MessageId> = late.iter().map(|id| MessageId::from(*id)).collect();
        prop_assert_eq!(&stored[stored.len() - late.len()..], tail.as_slice());
    }

    #[test]
    fn prop_typing_signals_alternate(
        gaps in prop::collection::vec(0u64..5000, 1..30),
        sends in prop::collection::vec(any::<bool>(), 1..30),
    ) {
        let mut typing: TypingIndicator<Millis> = TypingIndicator::new(TypingConfig::default());
        let mut now = 0u64;
        let mut last_signal = TypingSignal::Stop;

        for (gap, send) in gaps.iter().zip(sends.iter().cycle()) {
            now += gap;
            if let Some(signal) = typing.tick(Millis(now)) {
                prop_assert_eq!(signal, TypingSignal::Stop);
                prop_assert_eq!(last_signal, TypingSignal::Start);
                last_signal = signal;
            }
            if *send {
                last_signal = typing.on_send();
            } else if let Some(signal) = typing.keystroke(Millis(now)) {
                prop_assert_eq!(signal, TypingSignal::Start);
                prop_assert_eq!(last_signal, TypingSignal::Stop);
                last_signal = signal;
            }
        }
    }

    #[test]
    fn prop_status_updates_never_regress(
        updates in prop::collection::vec(0u8..3, 0..20),
    ) {
        let mut store = MessageStore::new(RoomId::from("r1"));
        store.load_history(vec![message(1, 1, 2)]);

        let mut highest = DeliveryStatus::Sent;
        for update in updates {
            let status = match update {
                0 => DeliveryStatus::Sent,
                1 => DeliveryStatus::Delivered,
                _ => DeliveryStatus::Read,
            };
            store.apply_status(&MessageId::from(1), status);
            highest = highest.max(status);
            prop_assert_eq!(store.messages()[0].status, highest);
        }
    }
}

#[test]
fn debounce_emits_one_start_and_one_stop() {
    let mut typing: TypingIndicator<Millis> = TypingIndicator::new(TypingConfig::default());
    let mut signals = Vec::new();

    for t in [0, 200, 400, 600] {
        signals.extend(typing.keystroke(Millis(t)));
        signals.extend(typing.tick(Millis(t)));
    }
    for t in (700..=3000).step_by(100) {
        signals.extend(typing.tick(Millis(t)));
    }

    assert_eq!(signals, vec![TypingSignal::Start, TypingSignal::Stop]);
}
