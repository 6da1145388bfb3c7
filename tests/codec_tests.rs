use chrono::{TimeZone, Utc};
use dispatch_core::events::{CodecError, EventCodec, JsonEventCodec};
use dispatch_core::models::{Envelope, OrderCancelled, OrderEvent, OrderEventKind, OrderPlaced};
use dispatch_core::DomainEvent;
use proptest::prelude::*;

fn arb_timestamp() -> impl Strategy<Value = chrono::DateTime<Utc>> {
    (0i64..4_102_444_800, 0u32..1_000_000).prop_map(|(secs, micros)| {
        Utc.timestamp_opt(secs, micros * 1_000)
            .single()
            .unwrap_or_else(Utc::now)
    })
}

fn arb_order_event() -> impl Strategy<Value = OrderEvent> {
    let placed = (
        "[a-f0-9-]{1,36}",
        arb_timestamp(),
        "ORD-[0-9]{1,6}",
        "CUST-[0-9]{1,6}",
        prop::collection::vec("[A-Za-z ]{1,16}", 0..5),
        any::<u64>(),
    )
        .prop_map(|(id, at, order_id, customer_id, items, total_amount_cents)| {
            OrderEvent::Placed(Envelope::from_parts(
                id,
                at,
                OrderPlaced {
                    order_id,
                    customer_id,
                    items,
                    total_amount_cents,
                },
            ))
        });

    let cancelled = ("[a-f0-9-]{1,36}", arb_timestamp(), "ORD-[0-9]{1,6}", ".{0,40}").prop_map(
        |(id, at, order_id, reason)| {
            OrderEvent::Cancelled(Envelope::from_parts(
                id,
                at,
                OrderCancelled { order_id, reason },
            ))
        },
    );

    prop_oneof![placed, cancelled]
}

proptest! {
    #[test]
    fn prop_json_codec_preserves_every_field(event in arb_order_event()) {
        let codec = JsonEventCodec::<OrderEvent>::new();
        let bytes = codec.serialize(&event).unwrap();
        let decoded = codec.deserialize(&bytes, event.kind()).unwrap();
        prop_assert_eq!(decoded, event);
    }
}

#[test]
fn test_payload_carries_event_type_tag() {
    let codec = JsonEventCodec::<OrderEvent>::new();
    let bytes = codec
        .serialize(&OrderEvent::cancelled("ORD-1", "late"))
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["event_type"], "OrderCancelled");
    assert_eq!(json["payload"]["order_id"], "ORD-1");
    assert!(json["id"].is_string());
    assert!(json["created_at"].is_string());
}

#[test]
fn test_decode_rejects_record_on_wrong_topic() {
    let codec = JsonEventCodec::<OrderEvent>::new();
    let bytes = codec
        .serialize(&OrderEvent::placed("ORD-1", "C", vec!["A".into()], 5))
        .unwrap();

    let result = codec.deserialize(&bytes, OrderEventKind::Cancelled);

    assert!(matches!(
        result,
        Err(CodecError::KindMismatch {
            expected: "OrderCancelled",
            actual: "OrderPlaced"
        })
    ));
}

#[test]
fn test_decode_rejects_garbage() {
    let codec = JsonEventCodec::<OrderEvent>::new();
    assert!(matches!(
        codec.deserialize(b"\x00\x01not-json", OrderEventKind::Placed),
        Err(CodecError::Deserialization { .. })
    ));
}
