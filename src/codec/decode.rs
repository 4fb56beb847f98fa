//! Wire-to-instance decoding.
//!
//! The decoder walks tags up to an end offset, dispatching on the schema's
//! field table. Unknown fields are skipped by wire type and dropped. Repeated
//! fields accept both packed runs and per-element tags regardless of the
//! schema's declared packing, so either encoding of a peer round-trips.

use crate::error::{CodecError, Result};
use crate::reflect::root::Root;
use crate::reflect::{FieldData, NodeId, ResolvedType, Rule, ScalarType};
use crate::value::{DynamicMessage, MapKey, Value};
use crate::wire::{Reader, WireType};

/// Decode one message instance from `reader`, consuming bytes up to `end`.
pub(crate) fn decode_message(
    root: &Root,
    id: NodeId,
    reader: &mut Reader,
    end: usize,
    depth: u32,
) -> Result<DynamicMessage> {
    let limit = root.config().max_recursion_depth;
    if depth >= limit {
        return Err(CodecError::RecursionLimit(limit));
    }

    let data = root.message_data(id);
    let mut message = DynamicMessage::new(id);

    while reader.pos() < end {
        let tag = reader.uint32()?;
        let field_number = tag >> 3;
        let wire = WireType::from_u32(tag & 7)?;

        let Some(field) = data.field_by_id(field_number) else {
            reader.skip_type(wire)?;
            continue;
        };

        if field.is_map() {
            decode_map_entry(root, field, reader, &mut message, depth)?;
        } else if field.rule == Rule::Repeated {
            decode_repeated(root, field, reader, wire, &mut message, depth)?;
        } else {
            let value = decode_single(root, field, reader, depth)?;
            super::store_field(data, field, &mut message, value)?;
        }
    }

    for field in &data.fields {
        if field.rule == Rule::Required && !message.has(field.id) {
            return Err(CodecError::MissingRequiredField {
                field: field.name.clone(),
                message: root.full_name(id),
                partial: Box::new(message),
            });
        }
    }
    Ok(message)
}

/// One singular value, read per the field's declared type.
fn decode_single(
    root: &Root,
    field: &FieldData,
    reader: &mut Reader,
    depth: u32,
) -> Result<Value> {
    match (field.scalar, field.resolved) {
        (Some(scalar), _) => read_scalar(reader, scalar),
        (None, Some(ResolvedType::Enum(_))) => Ok(Value::Enum(reader.int32()?)),
        (None, Some(ResolvedType::Message(target))) => {
            let len = reader.uint32()? as usize;
            let end = reader.pos() + len;
            if end > reader.len() {
                return Err(CodecError::IndexOutOfRange {
                    needed: len,
                    remaining: reader.len() - reader.pos(),
                });
            }
            Ok(Value::Message(decode_message(
                root,
                target,
                reader,
                end,
                depth + 1,
            )?))
        }
        (None, None) => Err(CodecError::TypeNotFound {
            path: field.type_name.clone(),
        }),
    }
}

fn decode_repeated(
    root: &Root,
    field: &FieldData,
    reader: &mut Reader,
    wire: WireType,
    message: &mut DynamicMessage,
    depth: u32,
) -> Result<()> {
    let element_wire = field.value_wire_type();

    // A length-delimited run on a field whose elements are not themselves
    // length-delimited is a packed run.
    if wire == WireType::Len && element_wire != WireType::Len {
        let len = reader.uint32()? as usize;
        let end = reader.pos() + len;
        if end > reader.len() {
            return Err(CodecError::IndexOutOfRange {
                needed: len,
                remaining: reader.len() - reader.pos(),
            });
        }
        while reader.pos() < end {
            let value = decode_single(root, field, reader, depth)?;
            push_element(field, message, value);
        }
        return Ok(());
    }

    let value = decode_single(root, field, reader, depth)?;
    push_element(field, message, value);
    Ok(())
}

fn push_element(field: &FieldData, message: &mut DynamicMessage, value: Value) {
    match message.get_mut(field.id) {
        Some(Value::List(elements)) => elements.push(value),
        _ => message.set_raw(field.id, Value::List(vec![value])),
    }
}

/// One map entry, framed as a two-field message: key = 1, value = 2.
/// Absent halves fall back to the key/value type's default.
fn decode_map_entry(
    root: &Root,
    field: &FieldData,
    reader: &mut Reader,
    message: &mut DynamicMessage,
    depth: u32,
) -> Result<()> {
    let key_type = field.key_type.ok_or_else(|| CodecError::InvalidMapKeyType {
        key_type: field.type_name.clone(),
        field: field.name.clone(),
    })?;

    let len = reader.uint32()? as usize;
    let end = reader.pos() + len;
    if end > reader.len() {
        return Err(CodecError::IndexOutOfRange {
            needed: len,
            remaining: reader.len() - reader.pos(),
        });
    }

    let mut key = None;
    let mut value = None;
    while reader.pos() < end {
        let tag = reader.uint32()?;
        let wire = WireType::from_u32(tag & 7)?;
        match tag >> 3 {
            1 => key = Some(read_map_key(reader, key_type)?),
            2 => value = Some(decode_single(root, field, reader, depth)?),
            _ => reader.skip_type(wire)?,
        }
    }

    let key = key.unwrap_or_else(|| default_map_key(key_type));
    let value = match value {
        Some(value) => value,
        None => default_map_value(field),
    };

    match message.get_mut(field.id) {
        Some(Value::Map(entries)) => {
            entries.insert(key, value);
        }
        _ => {
            let mut entries = std::collections::BTreeMap::new();
            entries.insert(key, value);
            message.set_raw(field.id, Value::Map(entries));
        }
    }
    Ok(())
}

fn default_map_key(key_type: ScalarType) -> MapKey {
    match key_type {
        ScalarType::Bool => MapKey::Bool(false),
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => MapKey::I32(0),
        ScalarType::Uint32 | ScalarType::Fixed32 => MapKey::U32(0),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => MapKey::I64(0),
        ScalarType::Uint64 | ScalarType::Fixed64 => MapKey::U64(0),
        _ => MapKey::String(String::new()),
    }
}

fn default_map_value(field: &FieldData) -> Value {
    match (field.scalar, field.resolved) {
        (Some(scalar), _) => scalar.zero(),
        (None, Some(ResolvedType::Enum(_))) => field
            .type_default
            .clone()
            .unwrap_or(Value::Enum(0)),
        (None, Some(ResolvedType::Message(target))) => Value::Message(DynamicMessage::new(target)),
        (None, None) => Value::Enum(0),
    }
}

fn read_map_key(reader: &mut Reader, key_type: ScalarType) -> Result<MapKey> {
    Ok(match key_type {
        ScalarType::Bool => MapKey::Bool(reader.bool()?),
        ScalarType::Int32 => MapKey::I32(reader.int32()?),
        ScalarType::Sint32 => MapKey::I32(reader.sint32()?),
        ScalarType::Sfixed32 => MapKey::I32(reader.sfixed32()?),
        ScalarType::Uint32 => MapKey::U32(reader.uint32()?),
        ScalarType::Fixed32 => MapKey::U32(reader.fixed32()?),
        ScalarType::Int64 => MapKey::I64(reader.int64()?),
        ScalarType::Sint64 => MapKey::I64(reader.sint64()?),
        ScalarType::Sfixed64 => MapKey::I64(reader.sfixed64()?),
        ScalarType::Uint64 => MapKey::U64(reader.uint64()?),
        ScalarType::Fixed64 => MapKey::U64(reader.fixed64()?),
        _ => MapKey::String(reader.string()?),
    })
}

fn read_scalar(reader: &mut Reader, scalar: ScalarType) -> Result<Value> {
    Ok(match scalar {
        ScalarType::Double => Value::F64(reader.double()?),
        ScalarType::Float => Value::F32(reader.float()?),
        ScalarType::Int32 => Value::I32(reader.int32()?),
        ScalarType::Sint32 => Value::I32(reader.sint32()?),
        ScalarType::Sfixed32 => Value::I32(reader.sfixed32()?),
        ScalarType::Uint32 => Value::U32(reader.uint32()?),
        ScalarType::Fixed32 => Value::U32(reader.fixed32()?),
        ScalarType::Int64 => Value::I64(reader.int64()?),
        ScalarType::Sint64 => Value::I64(reader.sint64()?),
        ScalarType::Sfixed64 => Value::I64(reader.sfixed64()?),
        ScalarType::Uint64 => Value::U64(reader.uint64()?),
        ScalarType::Fixed64 => Value::U64(reader.fixed64()?),
        ScalarType::Bool => Value::Bool(reader.bool()?),
        ScalarType::String => Value::String(reader.string()?),
        ScalarType::Bytes => Value::Bytes(reader.bytes()?),
    })
}
