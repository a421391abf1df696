//! Fuzz target for realtime event decoding
//!
//! # Strategy
//!
//! - Random text: arbitrary UTF-8 fed straight to the decoder
//! - Envelope shape: a known event name with arbitrary `data`
//! - Id confusion: numeric, string and missing identifiers
//!
//! # Invariants
//!
//! - Decoding never panics
//! - Anything that decodes re-encodes, and the re-encoding decodes to the same
//!   event

#![no_main]

use arbitrary::Arbitrary;
use carelink_proto::{Inbound, Outbound};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    RandomText(String),
    Envelope { event: EventName, data: String },
    NewMessage { id: IdShape, room: IdShape, sender: IdShape, content: String },
}

#[derive(Debug, Clone, Arbitrary)]
enum EventName {
    NewMessage,
    UserTyping,
    MessageStatus,
    ConnectError,
    Error,
    Unknown(String),
}

#[derive(Debug, Clone, Arbitrary)]
enum IdShape {
    Number(u64),
    Negative(i64),
    Text(String),
    Float(f64),
    Null,
}

impl EventName {
    fn as_str(&self) -> &str {
        match self {
            Self::NewMessage => "new_message",
            Self::UserTyping => "user_typing",
            Self::MessageStatus => "message_status",
            Self::ConnectError => "connect_error",
            Self::Error => "error",
            Self::Unknown(name) => name,
        }
    }
}

impl IdShape {
    fn json(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Negative(n) => n.to_string(),
            Self::Text(s) => format!("{s:?}"),
            Self::Float(f) => format!("{f}"),
            Self::Null => "null".to_string(),
        }
    }
}

fn check(text: &str) {
    if let Ok(event) = Inbound::decode(text) {
        let encoded = event.encode().expect("decoded event re-encodes");
        let again = Inbound::decode(&encoded).expect("re-encoded event decodes");
        assert_eq!(event, again);
    }
    let _ = Outbound::decode(text);
}

fuzz_target!(|input: Input| {
    match input {
        Input::RandomText(text) => check(&text),
        Input::Envelope { event, data } => {
            check(&format!(r#"{{"event":{:?},"data":{data}}}"#, event.as_str()));
        }
        Input::NewMessage { id, room, sender, content } => {
            let text = format!(
                r#"{{"event":"new_message","data":{{"id":{},"room_id":{},"sender_id":{},"content":{content:?},"created_at":"2024-03-15T09:00:00Z"}}}}"#,
                id.json(),
                room.json(),
                sender.json(),
            );
            check(&text);
        }
    }
});
