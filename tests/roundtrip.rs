//! Integration tests for the schema-driven codec
//!
//! Covers encode/decode round trips, exact wire layouts, packed and unpacked
//! repeated fields, maps, oneofs, required-field enforcement, verification,
//! and the JSON conversions.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::Bytes;
use proto_codec::{
    BytesRepr, CodecError, ConversionOptions, EnumRepr, LongRepr, MapKey, Reader, Root, Value,
    Writer,
};
use serde_json::json;
use std::collections::BTreeMap;

fn schema() -> Root {
    Root::from_json_str(
        r#"{
            "nested": {
                "test": {
                    "nested": {
                        "Color": { "values": { "RED": 0, "GREEN": 1, "BLUE": 2 } },
                        "Inner": {
                            "fields": { "value": { "type": "int32", "id": 1 } }
                        },
                        "Outer": {
                            "fields": { "inner": { "type": "Inner", "id": 1 } }
                        },
                        "Scalars": {
                            "fields": {
                                "i":     { "type": "int32",  "id": 1 },
                                "u":     { "type": "uint32", "id": 2 },
                                "s":     { "type": "sint64", "id": 3 },
                                "f":     { "type": "double", "id": 4 },
                                "name":  { "type": "string", "id": 5 },
                                "data":  { "type": "bytes",  "id": 6 },
                                "ok":    { "type": "bool",   "id": 7 },
                                "color": { "type": "Color",  "id": 8 }
                            }
                        },
                        "Packed": {
                            "fields": {
                                "values": { "rule": "repeated", "type": "uint32", "id": 1 }
                            }
                        },
                        "Unpacked": {
                            "fields": {
                                "values": {
                                    "rule": "repeated", "type": "uint32", "id": 1,
                                    "options": { "packed": false }
                                }
                            }
                        },
                        "MapHolder": {
                            "fields": {
                                "attrs": { "keyType": "string", "type": "int32", "id": 1 }
                            }
                        },
                        "WithRequired": {
                            "fields": {
                                "must":  { "rule": "required", "type": "int32", "id": 1 },
                                "extra": { "type": "string", "id": 2 }
                            }
                        },
                        "Choice": {
                            "oneofs": { "kind": { "oneof": ["num", "text"] } },
                            "fields": {
                                "num":  { "type": "int32",  "id": 1 },
                                "text": { "type": "string", "id": 2 }
                            }
                        },
                        "Recur": {
                            "fields": { "next": { "type": "Recur", "id": 1 } }
                        }
                    }
                }
            }
        }"#,
    )
    .expect("test schema should load")
}

#[test]
fn test_scalar_round_trip() {
    let root = schema();
    let scalars = root.lookup_type("test.Scalars").unwrap();

    let mut msg = scalars.create();
    scalars.set(&mut msg, "i", Value::I32(-42)).unwrap();
    scalars.set(&mut msg, "u", Value::U32(7)).unwrap();
    scalars.set(&mut msg, "s", Value::I64(-1)).unwrap();
    scalars.set(&mut msg, "f", Value::F64(2.25)).unwrap();
    scalars.set(&mut msg, "name", Value::String("hi".into())).unwrap();
    scalars
        .set(&mut msg, "data", Value::Bytes(Bytes::from_static(&[1, 2])))
        .unwrap();
    scalars.set(&mut msg, "ok", Value::Bool(true)).unwrap();
    scalars.set(&mut msg, "color", Value::Enum(2)).unwrap();

    let bytes = scalars.encode(&msg).unwrap();
    let back = scalars.decode(bytes).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn test_negative_int32_takes_ten_value_bytes() {
    let root = schema();
    let scalars = root.lookup_type("test.Scalars").unwrap();

    let mut msg = scalars.create();
    scalars.set(&mut msg, "i", Value::I32(-1)).unwrap();
    let bytes = scalars.encode(&msg).unwrap();
    // one tag byte plus the 10-byte sign-extended varint
    assert_eq!(bytes.len(), 11);

    let back = scalars.decode(bytes).unwrap();
    assert_eq!(scalars.get(&back, "i"), Some(&Value::I32(-1)));
}

#[test]
fn test_nested_message_exact_framing() {
    let root = schema();
    let outer = root.lookup_type("test.Outer").unwrap();
    let inner = root.lookup_type("test.Inner").unwrap();

    let mut inner_msg = inner.create();
    inner.set(&mut inner_msg, "value", Value::I32(5)).unwrap();
    let mut msg = outer.create();
    outer.set(&mut msg, "inner", Value::Message(inner_msg)).unwrap();

    let bytes = outer.encode(&msg).unwrap();
    assert_eq!(&bytes[..], &[0x0a, 0x02, 0x08, 0x05]);
}

#[test]
fn test_packed_encoding_is_one_run() {
    let root = schema();
    let packed = root.lookup_type("test.Packed").unwrap();

    let mut msg = packed.create();
    packed
        .set(
            &mut msg,
            "values",
            Value::List(vec![Value::U32(1), Value::U32(2), Value::U32(300)]),
        )
        .unwrap();

    let bytes = packed.encode(&msg).unwrap();
    assert_eq!(&bytes[..], &[0x0a, 0x04, 0x01, 0x02, 0xac, 0x02]);

    let back = packed.decode(bytes).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn test_unpacked_option_emits_per_element_tags() {
    let root = schema();
    let unpacked = root.lookup_type("test.Unpacked").unwrap();

    let mut msg = unpacked.create();
    unpacked
        .set(&mut msg, "values", Value::List(vec![Value::U32(1), Value::U32(2)]))
        .unwrap();

    let bytes = unpacked.encode(&msg).unwrap();
    assert_eq!(&bytes[..], &[0x08, 0x01, 0x08, 0x02]);
}

#[test]
fn test_decoder_accepts_both_packings() {
    let root = schema();
    let packed = root.lookup_type("test.Packed").unwrap();

    // hand-built unpacked form of the same list
    let mut writer = Writer::new();
    writer.uint32(0x08).uint32(1);
    writer.uint32(0x08).uint32(300);
    let unpacked_bytes = writer.finish();

    let from_unpacked = packed.decode(unpacked_bytes).unwrap();
    assert_eq!(
        packed.get(&from_unpacked, "values"),
        Some(&Value::List(vec![Value::U32(1), Value::U32(300)]))
    );
}

#[test]
fn test_empty_list_produces_no_bytes() {
    let root = schema();
    let packed = root.lookup_type("test.Packed").unwrap();

    let mut msg = packed.create();
    packed.set(&mut msg, "values", Value::List(vec![])).unwrap();
    assert!(packed.encode(&msg).unwrap().is_empty());
}

#[test]
fn test_map_entry_framing_and_round_trip() {
    let root = schema();
    let holder = root.lookup_type("test.MapHolder").unwrap();

    let mut entries = BTreeMap::new();
    entries.insert(MapKey::String("a".into()), Value::I32(1));
    let mut msg = holder.create();
    holder.set(&mut msg, "attrs", Value::Map(entries)).unwrap();

    let bytes = holder.encode(&msg).unwrap();
    // entry: key "a" as field 1, value 1 as field 2
    assert_eq!(&bytes[..], &[0x0a, 0x05, 0x0a, 0x01, b'a', 0x10, 0x01]);

    let mut entries = BTreeMap::new();
    entries.insert(MapKey::String("x".into()), Value::I32(10));
    entries.insert(MapKey::String("y".into()), Value::I32(-1));
    let mut msg = holder.create();
    holder.set(&mut msg, "attrs", Value::Map(entries)).unwrap();

    let back = holder.decode(holder.encode(&msg).unwrap()).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn test_unknown_fields_are_skipped() {
    let root = schema();
    let inner = root.lookup_type("test.Inner").unwrap();

    let mut writer = Writer::new();
    writer.uint32((99 << 3) | 0).uint64(u64::MAX); // unknown varint field
    writer.uint32((98 << 3) | 2).string("junk"); // unknown length-delimited
    writer.uint32(0x08).uint32(5); // the known field
    let bytes = writer.finish();

    let msg = inner.decode(bytes).unwrap();
    assert_eq!(msg.field_count(), 1);
    assert_eq!(inner.get(&msg, "value"), Some(&Value::I32(5)));
}

#[test]
fn test_missing_required_field_carries_partial() {
    let root = schema();
    let with_required = root.lookup_type("test.WithRequired").unwrap();

    let mut writer = Writer::new();
    writer.uint32((2 << 3) | 2).string("present");
    let err = with_required.decode(writer.finish()).unwrap_err();

    match err {
        CodecError::MissingRequiredField { field, partial, .. } => {
            assert_eq!(field, "must");
            assert_eq!(
                with_required.get(&partial, "extra"),
                Some(&Value::String("present".into()))
            );
        }
        other => panic!("expected MissingRequiredField, got {other:?}"),
    }
}

#[test]
fn test_oneof_assignment_clears_siblings() {
    let root = schema();
    let choice = root.lookup_type("test.Choice").unwrap();

    let mut msg = choice.create();
    choice.set(&mut msg, "num", Value::I32(1)).unwrap();
    choice.set(&mut msg, "text", Value::String("hi".into())).unwrap();

    assert!(choice.get(&msg, "num").is_none());
    assert_eq!(choice.get(&msg, "text"), Some(&Value::String("hi".into())));
}

#[test]
fn test_oneof_decode_keeps_last_member() {
    let root = schema();
    let choice = root.lookup_type("test.Choice").unwrap();

    let mut writer = Writer::new();
    writer.uint32(0x08).uint32(9); // num = 9
    writer.uint32((2 << 3) | 2).string("wins"); // text
    let msg = choice.decode(writer.finish()).unwrap();

    assert!(choice.get(&msg, "num").is_none());
    assert_eq!(choice.get(&msg, "text"), Some(&Value::String("wins".into())));
}

#[test]
fn test_delimited_round_trip() {
    let root = schema();
    let inner = root.lookup_type("test.Inner").unwrap();

    let mut msg = inner.create();
    inner.set(&mut msg, "value", Value::I32(300)).unwrap();

    let framed = inner.encode_delimited(&msg).unwrap();
    let mut reader = Reader::new(framed);
    let back = inner.decode_delimited(&mut reader).unwrap();
    assert_eq!(back, msg);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn test_set_rejects_wrong_shape() {
    let root = schema();
    let scalars = root.lookup_type("test.Scalars").unwrap();

    let mut msg = scalars.create();
    let err = scalars.set(&mut msg, "i", Value::String("no".into())).unwrap_err();
    assert!(matches!(err, CodecError::TypeMismatch { .. }));
    assert!(scalars.set(&mut msg, "ghost", Value::I32(1)).is_err());
}

#[test]
fn test_verify_reports_first_violation() {
    let root = schema();
    let with_required = root.lookup_type("test.WithRequired").unwrap();
    let problem = with_required.verify(&with_required.create()).unwrap();
    assert!(problem.contains("must"));

    let scalars = root.lookup_type("test.Scalars").unwrap();
    let mut msg = scalars.create();
    scalars.set(&mut msg, "color", Value::Enum(42)).unwrap();
    let problem = scalars.verify(&msg).unwrap();
    assert!(problem.contains("color"));

    scalars.set(&mut msg, "color", Value::Enum(1)).unwrap();
    assert!(scalars.verify(&msg).is_none());
}

#[test]
fn test_from_value_is_lenient() {
    let root = schema();
    let scalars = root.lookup_type("test.Scalars").unwrap();

    let msg = scalars
        .from_value(&json!({
            "i": "-5",
            "u": 7,
            "s": "-9007199254740993",
            "color": "BLUE",
            "data": "AQI=",
            "unknown_key": "ignored",
            "name": null
        }))
        .unwrap();

    assert_eq!(scalars.get(&msg, "i"), Some(&Value::I32(-5)));
    assert_eq!(scalars.get(&msg, "u"), Some(&Value::U32(7)));
    assert_eq!(scalars.get(&msg, "s"), Some(&Value::I64(-9_007_199_254_740_993)));
    assert_eq!(scalars.get(&msg, "color"), Some(&Value::Enum(2)));
    assert_eq!(
        scalars.get(&msg, "data"),
        Some(&Value::Bytes(Bytes::from_static(&[1, 2])))
    );
    assert!(scalars.get(&msg, "name").is_none());
}

#[test]
fn test_to_value_representation_options() {
    let root = schema();
    let scalars = root.lookup_type("test.Scalars").unwrap();

    let mut msg = scalars.create();
    scalars.set(&mut msg, "s", Value::I64(-3)).unwrap();
    scalars.set(&mut msg, "color", Value::Enum(2)).unwrap();
    scalars
        .set(&mut msg, "data", Value::Bytes(Bytes::from_static(&[1, 2])))
        .unwrap();

    let rendered = scalars.to_value(&msg, &ConversionOptions::default());
    assert_eq!(rendered["s"], json!(-3));
    assert_eq!(rendered["color"], json!("BLUE"));
    assert_eq!(rendered["data"], json!("AQI="));

    let rendered = scalars.to_value(
        &msg,
        &ConversionOptions {
            longs: LongRepr::String,
            enums: EnumRepr::Number,
            bytes: BytesRepr::Array,
            ..Default::default()
        },
    );
    assert_eq!(rendered["s"], json!("-3"));
    assert_eq!(rendered["color"], json!(2));
    assert_eq!(rendered["data"], json!([1, 2]));
}

#[test]
fn test_to_value_defaults_and_oneof_key() {
    let root = schema();
    let scalars = root.lookup_type("test.Scalars").unwrap();

    let rendered = scalars.to_value(
        &scalars.create(),
        &ConversionOptions {
            defaults: true,
            ..Default::default()
        },
    );
    assert_eq!(rendered["i"], json!(0));
    assert_eq!(rendered["name"], json!(""));
    assert_eq!(rendered["color"], json!("RED"));

    let choice = root.lookup_type("test.Choice").unwrap();
    let mut msg = choice.create();
    choice.set(&mut msg, "text", Value::String("hi".into())).unwrap();
    let rendered = choice.to_value(
        &msg,
        &ConversionOptions {
            oneofs: true,
            ..Default::default()
        },
    );
    assert_eq!(rendered["text"], json!("hi"));
    assert_eq!(rendered["kind"], json!("text"));
}

#[test]
fn test_conversion_survives_wire_round_trip() {
    let root = schema();
    let scalars = root.lookup_type("test.Scalars").unwrap();

    let msg = scalars
        .from_value(&json!({ "i": -7, "name": "x", "ok": true }))
        .unwrap();
    let back = scalars.decode(scalars.encode(&msg).unwrap()).unwrap();
    assert_eq!(
        scalars.to_value(&back, &ConversionOptions::default()),
        json!({ "i": -7, "name": "x", "ok": true })
    );
}

#[test]
fn test_recursion_limit_stops_runaway_nesting() {
    let root = schema();
    let recur = root.lookup_type("test.Recur").unwrap();

    let mut msg = recur.create();
    for _ in 0..150 {
        let mut outer = recur.create();
        recur.set(&mut outer, "next", Value::Message(msg)).unwrap();
        msg = outer;
    }

    let err = recur.encode(&msg).unwrap_err();
    assert!(matches!(err, CodecError::RecursionLimit(_)));
}

#[test]
fn test_encode_pooled_matches_plain_encode() {
    let root = schema();
    let scalars = root.lookup_type("test.Scalars").unwrap();
    let pool = proto_codec::BufferPool::default();

    let mut msg = scalars.create();
    scalars.set(&mut msg, "name", Value::String("pooled".into())).unwrap();

    let plain = scalars.encode(&msg).unwrap();
    let pooled = scalars.encode_pooled(&msg, &pool).unwrap();
    assert_eq!(&plain[..], &pooled[..]);
}
