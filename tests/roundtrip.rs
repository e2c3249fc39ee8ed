//! End-to-end properties of the codec and the schema layer.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveTime};
use num_bigint::BigInt;
use rand::prelude::*;

use duffel::{decode, encode, AtomType, Decimal, MapKey, MessageSchema, Schema, Value};

fn roundtrip(value: &Value) {
    let encoded = encode(value).expect("encoding should succeed");
    let decoded = decode(&encoded).expect("decoding should succeed");
    assert_eq!(&decoded, value);
}

// Re-encoding a decoded payload reproduces it byte for byte.
fn idempotent(value: &Value) {
    let encoded = encode(value).unwrap();
    let again = encode(&decode(&encoded).unwrap()).unwrap();
    assert_eq!(encoded, again);
}

// The boundary targets the original test-suite pins, plus this format's
// calendar and decimal types.
fn targets() -> Vec<(&'static str, Value)> {
    vec![
        ("None", Value::Null),
        ("True", Value::from(true)),
        ("False", Value::from(false)),
        (
            "LotsOfBools",
            Value::List(
                [Value::from(true), Value::from(false)]
                    .iter()
                    .cycle()
                    .take(10_000)
                    .cloned()
                    .collect(),
            ),
        ),
        ("NegativeOneChar", Value::from(-1)),
        ("ZeroChar", Value::from(0)),
        ("PositiveOneChar", Value::from(1)),
        ("MinChar", Value::from(-1i64 << 7)),
        ("MaxChar", Value::from((1i64 << 7) - 1)),
        ("MaxNegativeShort", Value::from((-1i64 << 7) - 1)),
        ("MinPositiveShort", Value::from(1i64 << 7)),
        ("MinShort", Value::from(-1i64 << 15)),
        ("MaxShort", Value::from((1i64 << 15) - 1)),
        ("MaxNegativeInt", Value::from((-1i64 << 15) - 1)),
        ("MinPositiveInt", Value::from(1i64 << 15)),
        ("MinInt", Value::from(-1i64 << 31)),
        ("MaxInt", Value::from((1i64 << 31) - 1)),
        ("MaxNegativeLong", Value::from((-1i64 << 31) - 1)),
        ("MinPositiveLong", Value::from(1i64 << 31)),
        ("MinLong", Value::from(i64::MIN)),
        ("MaxLong", Value::from(i64::MAX)),
        (
            "MaxNegativeHuge",
            Value::from(BigInt::from(i64::MIN) - 1),
        ),
        ("MinPositiveHuge", Value::from(BigInt::from(i64::MAX) + 1)),
        (
            "BigPositiveHuge",
            Value::from(BigInt::parse_bytes(b"10deb23ab8184340de1e6337", 16).unwrap()),
        ),
        (
            "BigNegativeHuge",
            Value::from(-BigInt::parse_bytes(b"10deb23ab8184340de1e6337", 16).unwrap()),
        ),
        ("OverflowingHuge", Value::from((BigInt::from(1) << 33000) - 1)),
        ("OverflowingHuge2", Value::from(BigInt::from(1) << 33000)),
        ("ZeroFloat", Value::from(0.0)),
        ("PositiveFloat", Value::from(632.345)),
        ("NegativeFloat", Value::from(-928.346)),
        ("BigPositiveFloat", Value::from(9.4182e100)),
        ("ShortString", Value::from(&b"hello"[..])),
        (
            "LongString",
            Value::Binary(b"this is a test,".repeat(20)),
        ),
        ("ShortUnicode", Value::from("hiya")),
        (
            "LongUnicode",
            Value::from("this is still a test".repeat(20)),
        ),
        (
            "OverflowingLongString",
            Value::Binary(b"oh".repeat(4096)),
        ),
        (
            "OverflowingLongUnicode",
            Value::from("oh".repeat(4096)),
        ),
        (
            "CharList",
            Value::List((-128i64..128).map(Value::from).collect()),
        ),
        (
            "CharTuple",
            Value::Tuple((-128i64..128).map(Value::from).collect()),
        ),
        (
            "Date",
            Value::from(NaiveDate::from_ymd_opt(1984, 1, 6).unwrap()),
        ),
        (
            "Time",
            Value::from(NaiveTime::from_hms_micro_opt(4, 15, 0, 250_000).unwrap()),
        ),
        (
            "DateTime",
            Value::from(
                NaiveDate::from_ymd_opt(1984, 1, 6)
                    .unwrap()
                    .and_hms_micro_opt(4, 15, 0, 250_000)
                    .unwrap(),
            ),
        ),
        (
            "Timedelta",
            Value::from(Duration::days(3) + Duration::seconds(7245) + Duration::microseconds(10)),
        ),
        (
            "Decimal",
            Value::from(Decimal::finite(true, vec![1, 2, 3, 4, 5], -3).unwrap()),
        ),
        ("SpecialNums", {
            Value::tuple([
                Value::from(Decimal::Infinity { negative: false }),
                Value::from(Decimal::Infinity { negative: true }),
                Value::from(Decimal::Nan { signaling: false }),
                Value::from(Decimal::Nan { signaling: true }),
            ])
        }),
    ]
}

#[test]
fn all_targets_roundtrip() {
    for (name, value) in targets() {
        let encoded = encode(&value).unwrap_or_else(|e| panic!("{} failed to encode: {}", name, e));
        let decoded =
            decode(&encoded).unwrap_or_else(|e| panic!("{} failed to decode: {}", name, e));
        assert_eq!(decoded, value, "{} did not roundtrip", name);
    }
}

#[test]
fn all_targets_reencode_identically() {
    for (name, value) in targets() {
        let encoded = encode(&value).unwrap();
        let again = encode(&decode(&encoded).unwrap()).unwrap();
        assert_eq!(encoded, again, "{} is not idempotent", name);
    }
}

#[test]
fn deep_but_legal_nesting() {
    let value = (0..255).fold(Value::from("bottom"), |v, _| Value::List(vec![v]));
    roundtrip(&value);
    idempotent(&value);
}

#[test]
fn mixed_composite() {
    let mut rng = thread_rng();
    let mut blob = vec![0u8; 300];
    rng.fill_bytes(&mut blob);
    let value = Value::map([
        (Value::from("blob"), Value::Binary(blob)),
        (
            Value::from("rows"),
            Value::List(
                (0..50)
                    .map(|i| {
                        Value::tuple([
                            Value::from(i),
                            Value::from(i as f64 / 7.0),
                            Value::set([Value::from(i % 5), Value::from(i % 3)]),
                        ])
                    })
                    .collect(),
            ),
        ),
        (Value::Null, Value::from(true)),
        (Value::from(3.5), Value::from(BigInt::from(1) << 200)),
    ]);
    roundtrip(&value);
    idempotent(&value);
}

#[test]
fn sets_compare_regardless_of_insertion_order() {
    let a = Value::set([Value::from(1), Value::from(2), Value::from(3)]);
    let b = Value::set([Value::from(3), Value::from(1), Value::from(2)]);
    assert_eq!(a, b);
    assert_eq!(encode(&a).unwrap(), encode(&b).unwrap());
}

#[test]
fn float_nan_roundtrips_as_nan() {
    let encoded = encode(&Value::from(f64::NAN)).unwrap();
    assert!(decode(&encoded).unwrap().as_f64().unwrap().is_nan());
}

#[cfg(feature = "compress")]
#[test]
fn compression_is_transparent_and_bounded() {
    assert!(duffel::has_compression());
    // Highly repetitive payload: must shrink and still decode to the
    // same value.
    let value = Value::List(vec![Value::from("the same string again"); 500]);
    let encoded = encode(&value).unwrap();
    assert!(encoded[0] & 0x80 != 0, "payload should carry the envelope");
    assert!(encoded.len() < 500 * 23);
    assert_eq!(decode(&encoded).unwrap(), value);

    // Tiny payloads never get the envelope.
    let encoded = encode(&Value::from(true)).unwrap();
    assert_eq!(encoded, [0x01, 0x01]);
}

mod schema_layer {
    use super::*;

    // The address-book shape: nested maps, optional keys, a list, and a
    // free-form field.
    fn address_book() -> MessageSchema {
        MessageSchema::new(Schema::list(Schema::map([
            (MapKey::from("first_name"), Schema::Type(AtomType::Text)),
            (MapKey::from("last_name"), Schema::Type(AtomType::Text)),
            (MapKey::from("is_male"), Schema::Type(AtomType::Bool)),
            (MapKey::from("birthday"), Schema::Type(AtomType::Date)),
            (
                MapKey::from("address"),
                Schema::map([
                    (MapKey::from("street_name"), Schema::Type(AtomType::Text)),
                    (MapKey::from("street_number"), Schema::Type(AtomType::Int)),
                    (
                        MapKey::Optional(Value::from("sub_number")),
                        Schema::Type(AtomType::Text),
                    ),
                    (MapKey::from("zip_code"), Schema::Type(AtomType::Int)),
                    (MapKey::from("city"), Schema::Type(AtomType::Text)),
                    (
                        MapKey::Optional(Value::from("state")),
                        Schema::Type(AtomType::Text),
                    ),
                    (MapKey::from("country"), Schema::Type(AtomType::Text)),
                ]),
            ),
            (
                MapKey::from("hobbies"),
                Schema::list(Schema::optional(Schema::Type(AtomType::Text))),
            ),
            (MapKey::from("properties"), Schema::Any),
        ])))
        .unwrap()
    }

    fn entry() -> Value {
        let address = Value::map([
            (Value::from("street_name"), Value::from("None")),
            (Value::from("street_number"), Value::from(11)),
            (Value::from("zip_code"), Value::from(12345)),
            (Value::from("city"), Value::from("Of")),
            (Value::from("state"), Value::from("Your")),
            (Value::from("country"), Value::from("Business")),
        ]);
        Value::List(vec![Value::map([
            (Value::from("first_name"), Value::from("Travis")),
            (Value::from("last_name"), Value::from("Parker")),
            (Value::from("is_male"), Value::from(true)),
            (
                Value::from("birthday"),
                Value::from(NaiveDate::from_ymd_opt(1984, 1, 6).unwrap()),
            ),
            (Value::from("address"), address),
            (Value::from("hobbies"), Value::List(vec![])),
            (Value::from("properties"), Value::Null),
        ])])
    }

    #[test]
    fn validate_transform_untransform() {
        let schema = address_book();
        let message = entry();
        schema.validate(&message).unwrap();
        let transformed = schema.transform(&message).unwrap();
        assert_eq!(schema.untransform(&transformed).unwrap(), message);
    }

    #[test]
    fn wire_roundtrip_through_shared_schema() {
        let schema = address_book();
        let message = entry();
        let bytes = schema.message(message.clone()).encode().unwrap();
        assert_eq!(schema.decode(&bytes).unwrap().value(), &message);
    }

    #[test]
    fn schema_messages_are_shorter() {
        let schema = address_book();
        let message = entry();
        let short = schema.message(message.clone()).encode().unwrap();
        let plain = encode(&message).unwrap();
        assert!(
            short.len() < plain.len(),
            "schema encoding ({} bytes) should beat plain encoding ({} bytes)",
            short.len(),
            plain.len()
        );
    }

    #[test]
    fn absent_optionals_restore_as_absent() {
        let schema = address_book();
        let message = entry();
        let restored = schema
            .untransform(&schema.transform(&message).unwrap())
            .unwrap();
        let book = restored.as_list().unwrap();
        let address = book[0]
            .as_map()
            .unwrap()
            .get(&Value::from("address"))
            .unwrap()
            .as_map()
            .unwrap();
        assert!(!address.contains_key(&Value::from("sub_number")));
        assert!(address.contains_key(&Value::from("state")));
    }

    #[test]
    fn wildcard_maps_roundtrip_on_the_wire() {
        let schema = MessageSchema::new(Schema::map([
            (MapKey::from("kind"), Schema::instance("event")),
            (MapKey::Type(AtomType::Text), Schema::Type(AtomType::Int)),
        ]))
        .unwrap();
        let mut counts = BTreeMap::new();
        counts.insert(Value::from("kind"), Value::from("event"));
        for (name, n) in [("clicks", 4), ("views", 91), ("zaps", 0)] {
            counts.insert(Value::from(name), Value::from(n));
        }
        let message = Value::Map(counts);
        let bytes = schema.message(message.clone()).encode().unwrap();
        assert_eq!(schema.decode(&bytes).unwrap().value(), &message);
    }

    #[test]
    fn decode_of_mismatched_payload_fails() {
        let schema = address_book();
        // A valid payload for a different shape: untransform must reject
        // it rather than fabricate a message.
        let bytes = encode(&Value::from(5)).unwrap();
        assert!(schema.decode(&bytes).is_err());
    }
}
