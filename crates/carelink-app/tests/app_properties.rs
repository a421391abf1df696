//! Property-based tests for App state machine.
//!
//! Tests verify that invariants hold under arbitrary event sequences, including
//! completions arriving for chats that have already been replaced.

use std::{ops::Sub, time::Duration};

use carelink_app::{App, AppAction, AppEvent, ChatId, KeyInput};
use carelink_client::{RosterConfig, SessionConfig, SessionContext, SessionEvent};
use carelink_proto::{Inbound, Member, Outbound, Profile, Role, Room, RoomId, UserId};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Millis(u64);

impl Sub for Millis {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

fn profile(id: u64) -> Profile {
    Profile {
        id: UserId::from(id),
        full_name: format!("user {id}"),
        role: None,
        specialization: None,
    }
}

fn room_with(peer: u64) -> Room {
    Room {
        id: RoomId::from(format!("r{peer}")),
        members: vec![
            Member { user_id: UserId::from(1), user: profile(1) },
            Member { user_id: UserId::from(peer), user: profile(peer) },
        ],
    }
}

fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        3 => prop::char::range('a', 'e').prop_map(KeyInput::Char),
        1 => Just(KeyInput::Enter),
        1 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Tab),
        1 => Just(KeyInput::Up),
        1 => Just(KeyInput::Down),
        1 => Just(KeyInput::Ctrl('r')),
    ]
}

fn chat_event_strategy() -> impl Strategy<Value = SessionEvent<Millis>> {
    prop_oneof![
        Just(SessionEvent::SocketOpened),
        (2u64..5).prop_map(|peer| SessionEvent::RoomResolved(room_with(peer))),
        Just(SessionEvent::RoomFailed { reason: "500".into() }),
        Just(SessionEvent::Inbound(Inbound::Error { message: "boom".into() })),
    ]
}

fn event_strategy() -> impl Strategy<Value = AppEvent<Millis>> {
    prop_oneof![
        4 => (key_strategy(), 0u64..100_000).prop_map(|(key, t)| AppEvent::Key { key, now: Millis(t) }),
        2 => (0u64..100_000).prop_map(|t| AppEvent::Tick { now: Millis(t) }),
        1 => (1u16..200, 1u16..100).prop_map(|(c, r)| AppEvent::Resize(c, r)),
        3 => (1u64..5, chat_event_strategy())
            .prop_map(|(chat, event)| AppEvent::Chat { chat: ChatId(chat), event }),
    ]
}

fn started_app() -> App<Millis> {
    let ctx = SessionContext::new(UserId::from(1), Role::Doctor, "tok").unwrap();
    let mut app = App::new(ctx, RosterConfig::default(), SessionConfig::default());
    app.handle(AppEvent::Start { now: Millis(0) });
    app.handle(AppEvent::ContactsLoaded((2..5).map(profile).collect()));
    app
}

proptest! {
    #[test]
    fn prop_chat_actions_target_open_chat(events in prop::collection::vec(event_strategy(), 0..80)) {
        let mut app = started_app();

        for event in events {
            let before = app.chat_id();
            let actions = app.handle(event);
            let after = app.chat_id();

            for action in &actions {
                match action {
                    // Only the old chat may be torn down, and only the open one spoken to
                    AppAction::CloseSocket { chat } => {
                        prop_assert!(Some(*chat) != after || before == after);
                    },
                    AppAction::OpenSocket { chat, .. }
                    | AppAction::ResolveRoom { chat, .. }
                    | AppAction::FetchHistory { chat, .. } => {
                        prop_assert_eq!(Some(*chat), after);
                    },
                    AppAction::Emit { chat, event } => {
                        let leaving = matches!(event, Outbound::LeaveRoom { .. });
                        prop_assert!(Some(*chat) == after || (leaving && Some(*chat) == before));
                    },
                    _ => {},
                }
            }

            // Roster selection and the open chat agree
            let selected = app.roster().selected().cloned();
            let open = app.chat().map(|chat| chat.counterparty().clone());
            prop_assert_eq!(selected, open);
        }
    }

    #[test]
    fn prop_cursor_stays_in_range(keys in prop::collection::vec(key_strategy(), 0..60)) {
        let mut app = started_app();
        for key in keys {
            app.handle(AppEvent::Key { key, now: Millis(0) });
            let visible = app.visible_contacts().len();
            prop_assert!(visible == 0 || app.cursor() < visible);
        }
    }
}
