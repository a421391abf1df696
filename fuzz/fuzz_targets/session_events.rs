//! Fuzz target for the chat session state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of socket, REST, input and timer events,
//!   including messages for foreign rooms and events after unmount
//!
//! # Invariants
//!
//! - Never panics
//! - The transcript only holds messages of the resolved room
//! - No actions after unmount

#![no_main]

use std::{ops::Sub, time::Duration};

use arbitrary::Arbitrary;
use carelink_client::{ChatSession, SessionConfig, SessionContext, SessionEvent};
use carelink_proto::{
    DeliveryStatus, Inbound, Member, Message, MessageId, Profile, Role, Room, RoomId, UserId,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Millis(u64);

impl Sub for Millis {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    SocketOpened,
    SocketFailed,
    RoomResolved { room: u8 },
    RoomFailed,
    HistoryLoaded { room: u8, ids: Vec<u8> },
    HistoryFailed { room: u8 },
    NewMessage { room: u8, id: u8, sender: u8 },
    Typing { room: Option<u8>, user: u8, is_typing: bool },
    Status { id: u8, status: u8 },
    ServerError,
    Input { text: String },
    Submit,
    SendFailed,
    Retry,
    Advance { millis: u16 },
    Unmount,
}

const VIEWER: u64 = 1;
const PEER: u64 = 2;

fn room_id(n: u8) -> RoomId {
    RoomId::from(format!("r{}", n % 3))
}

fn room(n: u8) -> Room {
    let member = |id: u64| Member {
        user_id: UserId::from(id),
        user: Profile {
            id: UserId::from(id),
            full_name: format!("user {id}"),
            role: None,
            specialization: None,
        },
    };
    Room { id: room_id(n), members: vec![member(VIEWER), member(PEER)] }
}

fn message(room: u8, id: u8, sender: u8) -> Message {
    Message {
        id: MessageId::from(u64::from(id)),
        room_id: room_id(room),
        sender_id: UserId::from(u64::from(sender % 3)),
        content: format!("m{id}"),
        message_type: "text".into(),
        attachments: Vec::new(),
        created_at: Default::default(),
        status: DeliveryStatus::Sent,
    }
}

fn status(n: u8) -> DeliveryStatus {
    match n % 3 {
        0 => DeliveryStatus::Sent,
        1 => DeliveryStatus::Delivered,
        _ => DeliveryStatus::Read,
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let Ok(ctx) = SessionContext::new(UserId::from(VIEWER), Role::Patient, "token") else {
        return;
    };
    let Ok(mut session) = ChatSession::new(ctx, UserId::from(PEER), SessionConfig::default())
    else {
        return;
    };

    let mut now = Millis(0);
    session.handle(SessionEvent::Mount { now });
    let mut unmounted = false;

    for op in ops.into_iter().take(256) {
        let event = match op {
            Op::SocketOpened => SessionEvent::SocketOpened,
            Op::SocketFailed => SessionEvent::SocketFailed { reason: "reset".into() },
            Op::RoomResolved { room: n } => SessionEvent::RoomResolved(room(n)),
            Op::RoomFailed => SessionEvent::RoomFailed { reason: "500".into() },
            Op::HistoryLoaded { room: n, ids } => SessionEvent::HistoryLoaded {
                room_id: room_id(n),
                messages: ids.into_iter().take(32).map(|id| message(n, id, 2)).collect(),
            },
            Op::HistoryFailed { room: n } => {
                SessionEvent::HistoryFailed { room_id: room_id(n), reason: "503".into() }
            }
            Op::NewMessage { room: n, id, sender } => {
                SessionEvent::Inbound(Inbound::NewMessage(message(n, id, sender)))
            }
            Op::Typing { room: n, user, is_typing } => SessionEvent::Inbound(Inbound::UserTyping {
                user_id: UserId::from(u64::from(user % 3)),
                room_id: n.map(room_id),
                is_typing,
            }),
            Op::Status { id, status: s } => SessionEvent::Inbound(Inbound::MessageStatus {
                message_id: MessageId::from(u64::from(id)),
                status: status(s),
            }),
            Op::ServerError => SessionEvent::Inbound(Inbound::Error { message: "boom".into() }),
            Op::Input { text } => SessionEvent::Input { text, now },
            Op::Submit => SessionEvent::Submit,
            Op::SendFailed => SessionEvent::SendFailed { reason: "closed".into() },
            Op::Retry => SessionEvent::Retry,
            Op::Advance { millis } => {
                now = Millis(now.0 + u64::from(millis));
                SessionEvent::Tick { now }
            }
            Op::Unmount => SessionEvent::Unmount,
        };

        let is_unmount = matches!(event, SessionEvent::Unmount);
        let actions = session.handle(event);
        assert!(!unmounted || actions.is_empty(), "actions after unmount");
        unmounted |= is_unmount;

        let room = session.room_id().cloned();
        for message in session.messages() {
            assert_eq!(Some(&message.room_id), room.as_ref(), "foreign message in transcript");
        }
    }
});
