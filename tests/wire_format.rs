//! Integration tests for the wire-format primitives
//!
//! Exercises the Reader/Writer pair directly: varint widths, zigzag,
//! fixed-width layout, length-delimited framing, and skip behavior.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proto_codec::{CodecError, Reader, WireType, Writer};

#[test]
fn test_varint_boundary_widths() {
    for (value, width) in [
        (0u64, 1usize),
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        (u64::from(u32::MAX), 5),
        (u64::MAX, 10),
    ] {
        let mut writer = Writer::new();
        writer.uint64(value);
        let bytes = writer.finish();
        assert_eq!(bytes.len(), width, "value {value}");

        let mut reader = Reader::new(bytes);
        assert_eq!(reader.uint64().unwrap(), value);
    }
}

#[test]
fn test_negative_int32_sign_extends_to_ten_bytes() {
    let mut writer = Writer::new();
    writer.int32(-1);
    let bytes = writer.finish();
    assert_eq!(
        &bytes[..],
        &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
    );

    let mut reader = Reader::new(bytes);
    assert_eq!(reader.int32().unwrap(), -1);
}

#[test]
fn test_zigzag_small_negatives_stay_small() {
    let mut writer = Writer::new();
    writer.sint32(-1).sint64(-2);
    let bytes = writer.finish();
    // -1 zigzags to 1, -2 to 3: one byte each
    assert_eq!(&bytes[..], &[0x01, 0x03]);

    let mut reader = Reader::new(bytes);
    assert_eq!(reader.sint32().unwrap(), -1);
    assert_eq!(reader.sint64().unwrap(), -2);
}

#[test]
fn test_fixed_width_little_endian() {
    let mut writer = Writer::new();
    writer.fixed32(1).sfixed64(-1).double(1.5);
    let bytes = writer.finish();
    assert_eq!(bytes.len(), 4 + 8 + 8);
    assert_eq!(&bytes[..4], &[0x01, 0x00, 0x00, 0x00]);

    let mut reader = Reader::new(bytes);
    assert_eq!(reader.fixed32().unwrap(), 1);
    assert_eq!(reader.sfixed64().unwrap(), -1);
    assert_eq!(reader.double().unwrap(), 1.5);
}

#[test]
fn test_float_nan_is_canonicalized_on_encode() {
    let mut writer = Writer::new();
    writer.float(-f32::NAN);
    let bytes = writer.finish();
    assert_eq!(&bytes[..], &0x7fc0_0000u32.to_le_bytes());

    let mut reader = Reader::new(bytes);
    assert!(reader.float().unwrap().is_nan());
}

#[test]
fn test_length_delimited_framing() {
    let mut writer = Writer::new();
    writer.tag(1, WireType::Len).fork();
    writer.tag(1, WireType::Varint).uint32(5);
    writer.ldelim();
    assert_eq!(&writer.finish()[..], &[0x0a, 0x02, 0x08, 0x05]);
}

#[test]
fn test_string_round_trip_and_utf8_rejection() {
    let mut writer = Writer::new();
    writer.string("héllo");
    let bytes = writer.finish();

    let mut reader = Reader::new(bytes);
    assert_eq!(reader.string().unwrap(), "héllo");

    let mut bad = Reader::new(vec![0x02, 0xff, 0xfe]);
    assert!(matches!(bad.string(), Err(CodecError::InvalidUtf8)));
}

#[test]
fn test_truncated_input_reports_out_of_range() {
    let mut reader = Reader::new(vec![0x0a, 0x05, b'a']);
    reader.uint32().unwrap(); // tag
    assert!(matches!(
        reader.bytes(),
        Err(CodecError::IndexOutOfRange { needed: 5, .. })
    ));
}

#[test]
fn test_skip_by_wire_type() {
    let mut writer = Writer::new();
    writer.uint64(u64::MAX); // varint
    writer.fixed64(7);
    writer.string("skipped");
    writer.fixed32(9);
    writer.uint32(42); // the survivor
    let bytes = writer.finish();

    let mut reader = Reader::new(bytes);
    reader.skip_type(WireType::Varint).unwrap();
    reader.skip_type(WireType::Fixed64).unwrap();
    reader.skip_type(WireType::Len).unwrap();
    reader.skip_type(WireType::Fixed32).unwrap();
    assert_eq!(reader.uint32().unwrap(), 42);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn test_skip_group_consumes_matching_end_tag() {
    // field 1 start-group, field 2 varint 5 inside, field 1 end-group
    let bytes = vec![0x0b, 0x10, 0x05, 0x0c, 0x08, 0x01];
    let mut reader = Reader::new(bytes);
    let tag = reader.uint32().unwrap();
    let wire = WireType::from_tag(tag).unwrap();
    assert_eq!(wire, WireType::StartGroup);
    reader.skip_type(wire).unwrap();
    // the field after the group is intact
    assert_eq!(reader.uint32().unwrap(), 0x08);
    assert_eq!(reader.uint32().unwrap(), 1);
}

#[test]
fn test_writer_reset_discards_fork_segment() {
    let mut writer = Writer::new();
    writer.uint32(1);
    writer.fork();
    writer.string("abandoned");
    writer.reset();
    writer.uint32(2);
    assert_eq!(&writer.finish()[..], &[0x01, 0x02]);
}
