//! Property-based tests for realtime events and identifiers.
//!
//! Decoding runs on untrusted server input, so it must reject garbage with an
//! error instead of panicking. Identifier ordering is used for display
//! tie-breaks and map keys, so it has to agree with equality.

use carelink_proto::{DeliveryStatus, Inbound, MessageId, Outbound, RoomId, UserId};
use proptest::prelude::*;

/// Ids as the server may send them: integers or short strings.
fn arbitrary_id_text() -> impl Strategy<Value = String> {
    prop_oneof![any::<u32>().prop_map(|n| n.to_string()), "[a-z0-9-]{1,8}",]
}

fn arbitrary_status() -> impl Strategy<Value = DeliveryStatus> {
    prop_oneof![
        Just(DeliveryStatus::Sent),
        Just(DeliveryStatus::Delivered),
        Just(DeliveryStatus::Read),
    ]
}

fn arbitrary_outbound() -> impl Strategy<Value = Outbound> {
    (arbitrary_id_text(), ".{0,64}", any::<bool>(), 0u8..4).prop_map(
        |(room, content, flag, kind)| {
            let room_id = RoomId::from(room);
            match kind {
                0 => Outbound::JoinRoom { room_id },
                1 => Outbound::LeaveRoom { room_id },
                2 => Outbound::text(room_id, content),
                _ => Outbound::Typing { room_id, is_typing: flag },
            }
        },
    )
}

proptest! {
    #[test]
    fn prop_inbound_decode_never_panics(text in ".{0,256}") {
        let _ = Inbound::decode(&text);
    }

    #[test]
    fn prop_inbound_decode_never_panics_on_tagged_json(
        event in "(new_message|user_typing|message_status|error|connect_error|other)",
        data in ".{0,64}",
    ) {
        let text = format!(r#"{{"event": "{event}", "data": {data}}}"#);
        let _ = Inbound::decode(&text);
    }

    #[test]
    fn prop_outbound_survives_the_wire(event in arbitrary_outbound()) {
        let text = event.encode().expect("outbound events always encode");
        prop_assert_eq!(Outbound::decode(&text).expect("own encoding decodes"), event);
    }

    #[test]
    fn prop_id_order_agrees_with_equality(a in arbitrary_id_text(), b in arbitrary_id_text()) {
        let (x, y) = (MessageId::from(a.clone()), MessageId::from(b.clone()));
        prop_assert_eq!(x.cmp(&y) == std::cmp::Ordering::Equal, x == y);
        prop_assert_eq!(x.cmp(&y), y.cmp(&x).reverse());
    }

    #[test]
    fn prop_status_is_monotonic(updates in prop::collection::vec(arbitrary_status(), 0..16)) {
        let mut status = DeliveryStatus::Sent;
        for next in updates {
            let before = status;
            if let Some(advanced) = status.advance(next) {
                status = advanced;
            }
            prop_assert!(status >= before);
        }
    }
}

#[test]
fn user_id_from_text_and_number_agree() {
    assert_eq!(UserId::from("42"), UserId::from(42));
}
