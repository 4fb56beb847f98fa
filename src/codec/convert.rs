//! JSON-shaped conversion to and from message instances.
//!
//! `from_value` is lenient: numbers arrive as JSON numbers or decimal
//! strings, enums by symbolic name or number, bytes as base64 text or a byte
//! array, and unknown keys are ignored. `to_value` is shaped by
//! [`ConversionOptions`]: 64-bit integer, enum and bytes representations are
//! chosen per call, and absent fields may be materialized with their
//! defaults.

use crate::error::{CodecError, Result};
use crate::reflect::root::Root;
use crate::reflect::{FieldData, NodeId, ResolvedType, Rule, ScalarType};
use crate::value::{DynamicMessage, MapKey, Value};
use crate::wire::base64;
use bytes::Bytes;
use serde_json::json;
use std::collections::BTreeMap;

/// How 64-bit integer fields are rendered by `to_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LongRepr {
    /// JSON numbers. Values above 2^53 lose precision in JavaScript-
    /// compatible consumers.
    #[default]
    Number,
    /// Decimal strings.
    String,
}

/// How enum fields are rendered by `to_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRepr {
    /// Symbolic names, falling back to the number for undeclared values.
    #[default]
    Name,
    /// Numbers.
    Number,
}

/// How bytes fields are rendered by `to_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BytesRepr {
    /// Base64 text.
    #[default]
    Base64,
    /// An array of byte values.
    Array,
}

/// Rendering choices for [`MessageType::to_value`](crate::reflect::MessageType::to_value).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionOptions {
    pub longs: LongRepr,
    pub enums: EnumRepr,
    pub bytes: BytesRepr,
    /// Materialize absent singular fields with their type defaults
    /// (message fields as null). Oneof members stay absent.
    pub defaults: bool,
    /// Materialize absent repeated fields as empty arrays.
    pub arrays: bool,
    /// Materialize absent map fields as empty objects.
    pub objects: bool,
    /// Add a virtual key per oneof naming its present member.
    pub oneofs: bool,
}

/// Build an instance from a JSON-shaped value.
pub(crate) fn message_from_value(
    root: &Root,
    id: NodeId,
    value: &serde_json::Value,
    depth: u32,
) -> Result<DynamicMessage> {
    let limit = root.config().max_recursion_depth;
    if depth >= limit {
        return Err(CodecError::RecursionLimit(limit));
    }

    let Some(object) = value.as_object() else {
        return Err(CodecError::TypeMismatch {
            field: root.full_name(id),
            expected: "object".to_string(),
        });
    };

    let data = root.message_data(id);
    let mut message = DynamicMessage::new(id);
    for (key, raw) in object {
        if raw.is_null() {
            continue;
        }
        let Some(field) = data.field_by_name(key) else {
            continue;
        };

        let value = if field.is_map() {
            map_from_value(root, field, raw, depth)?
        } else if field.rule == Rule::Repeated {
            let Some(elements) = raw.as_array() else {
                return Err(CodecError::TypeMismatch {
                    field: field.name.clone(),
                    expected: "array".to_string(),
                });
            };
            Value::List(
                elements
                    .iter()
                    .map(|element| coerce_field(root, field, element, depth))
                    .collect::<Result<Vec<_>>>()?,
            )
        } else {
            coerce_field(root, field, raw, depth)?
        };
        super::store_field(data, field, &mut message, value)?;
    }
    Ok(message)
}

fn map_from_value(
    root: &Root,
    field: &FieldData,
    raw: &serde_json::Value,
    depth: u32,
) -> Result<Value> {
    let key_type = field.key_type.ok_or_else(|| CodecError::InvalidMapKeyType {
        key_type: field.type_name.clone(),
        field: field.name.clone(),
    })?;
    let Some(object) = raw.as_object() else {
        return Err(CodecError::TypeMismatch {
            field: field.name.clone(),
            expected: "object".to_string(),
        });
    };

    let mut entries = BTreeMap::new();
    for (key, element) in object {
        let key = parse_map_key(field, key_type, key)?;
        entries.insert(key, coerce_field(root, field, element, depth)?);
    }
    Ok(Value::Map(entries))
}

/// One singular value from its JSON shape.
fn coerce_field(
    root: &Root,
    field: &FieldData,
    raw: &serde_json::Value,
    depth: u32,
) -> Result<Value> {
    match (field.scalar, field.resolved) {
        (Some(scalar), _) => coerce_scalar(&field.name, scalar, raw),
        (None, Some(ResolvedType::Enum(target))) => {
            let number = match raw {
                serde_json::Value::String(name) => root
                    .enum_data(target)
                    .value_by_name(name)
                    .or_else(|| name.parse().ok()),
                other => other.as_i64().map(|n| n as i32),
            };
            match number {
                Some(number) => Ok(Value::Enum(number)),
                None => Err(CodecError::TypeMismatch {
                    field: field.name.clone(),
                    expected: "enum value".to_string(),
                }),
            }
        }
        (None, Some(ResolvedType::Message(target))) => Ok(Value::Message(message_from_value(
            root,
            target,
            raw,
            depth + 1,
        )?)),
        (None, None) => Err(CodecError::TypeNotFound {
            path: field.type_name.clone(),
        }),
    }
}

/// Coerce a JSON value to a scalar. Also applied to descriptor `default`
/// options during resolution.
pub(crate) fn coerce_scalar(
    field_name: &str,
    scalar: ScalarType,
    raw: &serde_json::Value,
) -> Result<Value> {
    let fail = || CodecError::TypeMismatch {
        field: field_name.to_string(),
        expected: scalar.name().to_string(),
    };

    Ok(match scalar {
        ScalarType::Double => Value::F64(coerce_f64(raw).ok_or_else(fail)?),
        ScalarType::Float => Value::F32(coerce_f64(raw).ok_or_else(fail)? as f32),
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
            Value::I32(coerce_i64(raw).ok_or_else(fail)? as i32)
        }
        ScalarType::Uint32 | ScalarType::Fixed32 => {
            Value::U32(coerce_i64(raw).ok_or_else(fail)? as u32)
        }
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => {
            Value::I64(coerce_i64(raw).ok_or_else(fail)?)
        }
        ScalarType::Uint64 | ScalarType::Fixed64 => {
            Value::U64(coerce_u64(raw).ok_or_else(fail)?)
        }
        ScalarType::Bool => Value::Bool(match raw {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).ok_or_else(fail)?,
            serde_json::Value::String(s) if s == "true" => true,
            serde_json::Value::String(s) if s == "false" => false,
            _ => return Err(fail()),
        }),
        ScalarType::String => Value::String(match raw {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return Err(fail()),
        }),
        ScalarType::Bytes => Value::Bytes(match raw {
            serde_json::Value::String(text) => Bytes::from(base64::decode(text)?),
            serde_json::Value::Array(elements) => {
                let mut out = Vec::with_capacity(elements.len());
                for element in elements {
                    out.push(element.as_u64().map(|b| b as u8).ok_or_else(fail)?);
                }
                Bytes::from(out)
            }
            _ => return Err(fail()),
        }),
    })
}

fn coerce_i64(raw: &serde_json::Value) -> Option<i64> {
    match raw {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u as i64))
            .or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn coerce_u64(raw: &serde_json::Value) -> Option<u64> {
    match raw {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|i| i as u64))
            .or_else(|| n.as_f64().map(|f| f as u64)),
        serde_json::Value::String(s) => s
            .parse()
            .ok()
            .or_else(|| s.parse::<i64>().ok().map(|i| i as u64)),
        _ => None,
    }
}

fn coerce_f64(raw: &serde_json::Value) -> Option<f64> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    }
}

fn parse_map_key(field: &FieldData, key_type: ScalarType, key: &str) -> Result<MapKey> {
    let fail = || CodecError::TypeMismatch {
        field: field.name.clone(),
        expected: format!("{} key", key_type.name()),
    };
    Ok(match key_type {
        ScalarType::Bool => match key {
            "true" => MapKey::Bool(true),
            "false" => MapKey::Bool(false),
            _ => return Err(fail()),
        },
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
            MapKey::I32(key.parse().map_err(|_| fail())?)
        }
        ScalarType::Uint32 | ScalarType::Fixed32 => MapKey::U32(key.parse().map_err(|_| fail())?),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => {
            MapKey::I64(key.parse().map_err(|_| fail())?)
        }
        ScalarType::Uint64 | ScalarType::Fixed64 => MapKey::U64(key.parse().map_err(|_| fail())?),
        _ => MapKey::String(key.to_string()),
    })
}

/// Render an instance as a JSON-shaped value.
pub(crate) fn message_to_value(
    root: &Root,
    id: NodeId,
    message: &DynamicMessage,
    options: &ConversionOptions,
) -> serde_json::Value {
    let data = root.message_data(id);
    let mut object = serde_json::Map::new();

    for field in &data.fields {
        match message.get(field.id) {
            Some(value) => {
                object.insert(field.name.clone(), render(root, field, value, options));
            }
            None if field.is_map() => {
                if options.objects || options.defaults {
                    object.insert(field.name.clone(), json!({}));
                }
            }
            None if field.rule == Rule::Repeated => {
                if options.arrays || options.defaults {
                    object.insert(field.name.clone(), json!([]));
                }
            }
            None => {
                if options.defaults && field.part_of.is_none() {
                    object.insert(field.name.clone(), default_value(root, field, options));
                }
            }
        }
    }

    if options.oneofs {
        for oneof in &data.oneofs {
            let present = oneof
                .fields
                .iter()
                .find(|name| {
                    data.field_by_name(name)
                        .is_some_and(|field| message.has(field.id))
                });
            if let Some(name) = present {
                object.insert(oneof.name.clone(), json!(name));
            }
        }
    }
    serde_json::Value::Object(object)
}

fn default_value(root: &Root, field: &FieldData, options: &ConversionOptions) -> serde_json::Value {
    match &field.type_default {
        Some(value) => render(root, field, value, options),
        // Message-typed fields default to null.
        None => serde_json::Value::Null,
    }
}

fn render(
    root: &Root,
    field: &FieldData,
    value: &Value,
    options: &ConversionOptions,
) -> serde_json::Value {
    match value {
        Value::Bool(v) => json!(v),
        Value::I32(v) => json!(v),
        Value::U32(v) => json!(v),
        Value::I64(v) => match options.longs {
            LongRepr::Number => json!(v),
            LongRepr::String => json!(v.to_string()),
        },
        Value::U64(v) => match options.longs {
            LongRepr::Number => json!(v),
            LongRepr::String => json!(v.to_string()),
        },
        Value::F32(v) => render_float(f64::from(*v)),
        Value::F64(v) => render_float(*v),
        Value::String(v) => json!(v),
        Value::Bytes(v) => match options.bytes {
            BytesRepr::Base64 => json!(base64::encode(v)),
            BytesRepr::Array => json!(v.iter().copied().collect::<Vec<u8>>()),
        },
        Value::Enum(number) => match (options.enums, field.resolved) {
            (EnumRepr::Name, Some(ResolvedType::Enum(target))) => {
                match root.enum_data(target).name_by_number(*number) {
                    Some(name) => json!(name),
                    None => json!(number),
                }
            }
            _ => json!(number),
        },
        Value::Message(nested) => message_to_value(root, nested.type_id(), nested, options),
        Value::List(elements) => serde_json::Value::Array(
            elements
                .iter()
                .map(|element| render(root, field, element, options))
                .collect(),
        ),
        Value::Map(entries) => {
            let mut object = serde_json::Map::new();
            for (key, element) in entries {
                object.insert(map_key_to_string(key), render(root, field, element, options));
            }
            serde_json::Value::Object(object)
        }
    }
}

/// Non-finite floats have no JSON number form and render as strings.
fn render_float(value: f64) -> serde_json::Value {
    if value.is_nan() {
        json!("NaN")
    } else if value == f64::INFINITY {
        json!("Infinity")
    } else if value == f64::NEG_INFINITY {
        json!("-Infinity")
    } else {
        json!(value)
    }
}

fn map_key_to_string(key: &MapKey) -> String {
    match key {
        MapKey::Bool(v) => v.to_string(),
        MapKey::I32(v) => v.to_string(),
        MapKey::U32(v) => v.to_string(),
        MapKey::I64(v) => v.to_string(),
        MapKey::U64(v) => v.to_string(),
        MapKey::String(v) => v.clone(),
    }
}
