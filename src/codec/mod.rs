//! # Schema-Driven Codec
//!
//! A generic interpreter walking the reflection graph to encode, decode,
//! verify and convert [`DynamicMessage`] instances. One code path serves
//! every message type; there is no per-type code generation.
//!
//! ## Components
//! - **encode**: instance to wire bytes, fields in ascending id order
//! - **decode**: wire bytes to instance, unknown fields skipped
//! - **verify**: schema conformance check producing a path-qualified
//!   description of the first violation
//! - **convert**: JSON-shaped values to and from instances, with
//!   representation choices in [`ConversionOptions`]

pub mod convert;
pub mod decode;
pub mod encode;
pub mod verify;

pub use convert::{BytesRepr, ConversionOptions, EnumRepr, LongRepr};

use crate::error::{CodecError, Result};
use crate::reflect::{FieldData, MessageData, ResolvedType, Rule, ScalarType};
use crate::value::{MapKey, Value};

/// Whether a value has the shape a singular field of this schema expects.
pub(crate) fn singular_matches(field: &FieldData, value: &Value) -> bool {
    match field.scalar {
        Some(scalar) => scalar_matches(scalar, value),
        None => match field.resolved {
            Some(ResolvedType::Enum(_)) => matches!(value, Value::Enum(_)),
            Some(ResolvedType::Message(target)) => {
                matches!(value, Value::Message(m) if m.type_id() == target)
            }
            None => false,
        },
    }
}

pub(crate) fn scalar_matches(scalar: ScalarType, value: &Value) -> bool {
    match scalar {
        ScalarType::Double => matches!(value, Value::F64(_)),
        ScalarType::Float => matches!(value, Value::F32(_)),
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
            matches!(value, Value::I32(_))
        }
        ScalarType::Uint32 | ScalarType::Fixed32 => matches!(value, Value::U32(_)),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => {
            matches!(value, Value::I64(_))
        }
        ScalarType::Uint64 | ScalarType::Fixed64 => matches!(value, Value::U64(_)),
        ScalarType::Bool => matches!(value, Value::Bool(_)),
        ScalarType::String => matches!(value, Value::String(_)),
        ScalarType::Bytes => matches!(value, Value::Bytes(_)),
    }
}

pub(crate) fn map_key_matches(key_type: ScalarType, key: &MapKey) -> bool {
    match key_type {
        ScalarType::Bool => matches!(key, MapKey::Bool(_)),
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
            matches!(key, MapKey::I32(_))
        }
        ScalarType::Uint32 | ScalarType::Fixed32 => matches!(key, MapKey::U32(_)),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => {
            matches!(key, MapKey::I64(_))
        }
        ScalarType::Uint64 | ScalarType::Fixed64 => matches!(key, MapKey::U64(_)),
        ScalarType::String => matches!(key, MapKey::String(_)),
        _ => false,
    }
}

/// Human-readable shape a field expects, for mismatch diagnostics.
pub(crate) fn expected_shape(field: &FieldData) -> String {
    if field.is_map() {
        return format!("map<{}, {}>", field.key_type.map(ScalarType::name).unwrap_or("?"), field.type_name);
    }
    if field.rule == Rule::Repeated {
        return format!("repeated {}", field.type_name);
    }
    field.type_name.clone()
}

/// Store a value into a message, checking its shape against the schema and
/// clearing the other present members of the field's oneof, if any.
pub(crate) fn store_field(
    data: &MessageData,
    field: &FieldData,
    message: &mut crate::value::DynamicMessage,
    value: Value,
) -> Result<()> {
    let ok = if field.is_map() {
        match (&value, field.key_type) {
            (Value::Map(entries), Some(key_type)) => entries.iter().all(|(key, element)| {
                map_key_matches(key_type, key) && singular_matches(field, element)
            }),
            _ => false,
        }
    } else if field.rule == Rule::Repeated {
        match &value {
            Value::List(elements) => elements
                .iter()
                .all(|element| singular_matches(field, element)),
            _ => false,
        }
    } else {
        singular_matches(field, &value)
    };
    if !ok {
        return Err(CodecError::TypeMismatch {
            field: field.name.clone(),
            expected: expected_shape(field),
        });
    }

    if let Some(index) = field.part_of {
        for member in &data.oneofs[index].fields {
            if member != &field.name {
                if let Some(sibling) = data.field_by_name(member) {
                    message.clear(sibling.id);
                }
            }
        }
    }
    message.set_raw(field.id, value);
    Ok(())
}
