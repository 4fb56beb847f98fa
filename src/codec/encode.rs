//! Instance-to-wire encoding.
//!
//! Fields are emitted in ascending field-number order, using the per-type
//! order fixed by `resolve_all`. Absent fields produce no bytes; packed
//! repeated fields emit one length-delimited run.

use crate::error::{CodecError, Result};
use crate::reflect::root::Root;
use crate::reflect::{FieldData, NodeId, ResolvedType, ScalarType};
use crate::value::{DynamicMessage, MapKey, Value};
use crate::wire::{WireType, Writer};

/// Encode one message instance into `writer`.
pub(crate) fn encode_message(
    root: &Root,
    id: NodeId,
    message: &DynamicMessage,
    writer: &mut Writer,
) -> Result<()> {
    encode_inner(root, id, message, writer, 0)
}

fn encode_inner(
    root: &Root,
    id: NodeId,
    message: &DynamicMessage,
    writer: &mut Writer,
    depth: u32,
) -> Result<()> {
    let limit = root.config().max_recursion_depth;
    if depth >= limit {
        return Err(CodecError::RecursionLimit(limit));
    }

    let data = root.message_data(id);
    for &index in &data.encode_order {
        let field = &data.fields[index];
        let Some(value) = message.get(field.id) else {
            continue;
        };

        if field.is_map() {
            encode_map(root, field, value, writer, depth)?;
        } else if field.packed {
            encode_packed(field, value, writer)?;
        } else if let Value::List(elements) = value {
            for element in elements {
                encode_field(root, field, element, writer, depth)?;
            }
        } else {
            encode_field(root, field, value, writer, depth)?;
        }
    }
    Ok(())
}

/// One tagged singular value.
fn encode_field(
    root: &Root,
    field: &FieldData,
    value: &Value,
    writer: &mut Writer,
    depth: u32,
) -> Result<()> {
    match (field.scalar, field.resolved) {
        (Some(scalar), _) => {
            writer.tag(field.id, scalar.wire_type());
            encode_scalar(field, scalar, value, writer)
        }
        (None, Some(ResolvedType::Enum(_))) => {
            let Value::Enum(number) = value else {
                return Err(mismatch(field));
            };
            writer.tag(field.id, WireType::Varint).int32(*number);
            Ok(())
        }
        (None, Some(ResolvedType::Message(target))) => {
            let Value::Message(nested) = value else {
                return Err(mismatch(field));
            };
            writer.tag(field.id, WireType::Len).fork();
            encode_inner(root, target, nested, writer, depth + 1)?;
            writer.ldelim();
            Ok(())
        }
        (None, None) => Err(mismatch(field)),
    }
}

/// One untagged scalar value.
fn encode_scalar(
    field: &FieldData,
    scalar: ScalarType,
    value: &Value,
    writer: &mut Writer,
) -> Result<()> {
    match (scalar, value) {
        (ScalarType::Double, Value::F64(v)) => writer.double(*v),
        (ScalarType::Float, Value::F32(v)) => writer.float(*v),
        (ScalarType::Int32, Value::I32(v)) => writer.int32(*v),
        (ScalarType::Sint32, Value::I32(v)) => writer.sint32(*v),
        (ScalarType::Sfixed32, Value::I32(v)) => writer.sfixed32(*v),
        (ScalarType::Uint32, Value::U32(v)) => writer.uint32(*v),
        (ScalarType::Fixed32, Value::U32(v)) => writer.fixed32(*v),
        (ScalarType::Int64, Value::I64(v)) => writer.int64(*v),
        (ScalarType::Sint64, Value::I64(v)) => writer.sint64(*v),
        (ScalarType::Sfixed64, Value::I64(v)) => writer.sfixed64(*v),
        (ScalarType::Uint64, Value::U64(v)) => writer.uint64(*v),
        (ScalarType::Fixed64, Value::U64(v)) => writer.fixed64(*v),
        (ScalarType::Bool, Value::Bool(v)) => writer.bool(*v),
        (ScalarType::String, Value::String(v)) => writer.string(v),
        (ScalarType::Bytes, Value::Bytes(v)) => writer.bytes(v),
        _ => return Err(mismatch(field)),
    };
    Ok(())
}

/// A packed repeated run: one tag, one length, then back-to-back values.
/// Empty lists produce no bytes at all.
fn encode_packed(field: &FieldData, value: &Value, writer: &mut Writer) -> Result<()> {
    let Value::List(elements) = value else {
        return Err(mismatch(field));
    };
    if elements.is_empty() {
        return Ok(());
    }

    writer.tag(field.id, WireType::Len).fork();
    for element in elements {
        match field.scalar {
            Some(scalar) => encode_scalar(field, scalar, element, writer)?,
            None => {
                let Value::Enum(number) = element else {
                    writer.reset();
                    return Err(mismatch(field));
                };
                writer.int32(*number);
            }
        }
    }
    writer.ldelim();
    Ok(())
}

/// Map entries, each framed as a two-field message: key = 1, value = 2.
fn encode_map(
    root: &Root,
    field: &FieldData,
    value: &Value,
    writer: &mut Writer,
    depth: u32,
) -> Result<()> {
    let (Value::Map(entries), Some(key_type)) = (value, field.key_type) else {
        return Err(mismatch(field));
    };

    for (key, element) in entries {
        writer.tag(field.id, WireType::Len).fork();
        writer.tag(1, key_type.wire_type());
        encode_map_key(field, key_type, key, writer)?;
        match (field.scalar, field.resolved) {
            (Some(scalar), _) => {
                writer.tag(2, scalar.wire_type());
                encode_scalar(field, scalar, element, writer)?;
            }
            (None, Some(ResolvedType::Enum(_))) => {
                let Value::Enum(number) = element else {
                    writer.reset();
                    return Err(mismatch(field));
                };
                writer.tag(2, WireType::Varint).int32(*number);
            }
            (None, Some(ResolvedType::Message(target))) => {
                let Value::Message(nested) = element else {
                    writer.reset();
                    return Err(mismatch(field));
                };
                writer.tag(2, WireType::Len).fork();
                encode_inner(root, target, nested, writer, depth + 1)?;
                writer.ldelim();
            }
            (None, None) => {
                writer.reset();
                return Err(mismatch(field));
            }
        }
        writer.ldelim();
    }
    Ok(())
}

fn encode_map_key(
    field: &FieldData,
    key_type: ScalarType,
    key: &MapKey,
    writer: &mut Writer,
) -> Result<()> {
    match (key_type, key) {
        (ScalarType::Bool, MapKey::Bool(v)) => writer.bool(*v),
        (ScalarType::Int32, MapKey::I32(v)) => writer.int32(*v),
        (ScalarType::Sint32, MapKey::I32(v)) => writer.sint32(*v),
        (ScalarType::Sfixed32, MapKey::I32(v)) => writer.sfixed32(*v),
        (ScalarType::Uint32, MapKey::U32(v)) => writer.uint32(*v),
        (ScalarType::Fixed32, MapKey::U32(v)) => writer.fixed32(*v),
        (ScalarType::Int64, MapKey::I64(v)) => writer.int64(*v),
        (ScalarType::Sint64, MapKey::I64(v)) => writer.sint64(*v),
        (ScalarType::Sfixed64, MapKey::I64(v)) => writer.sfixed64(*v),
        (ScalarType::Uint64, MapKey::U64(v)) => writer.uint64(*v),
        (ScalarType::Fixed64, MapKey::U64(v)) => writer.fixed64(*v),
        (ScalarType::String, MapKey::String(v)) => writer.string(v),
        _ => return Err(mismatch(field)),
    };
    Ok(())
}

fn mismatch(field: &FieldData) -> CodecError {
    CodecError::TypeMismatch {
        field: field.name.clone(),
        expected: super::expected_shape(field),
    }
}
