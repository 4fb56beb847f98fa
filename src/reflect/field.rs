//! Field records: scalar type table, rules, and per-field resolved state.

use crate::reflect::{NodeId, OptionMap};
use crate::value::Value;
use crate::wire::WireType;
use bytes::Bytes;

/// The scalar wire types a field (or map key) may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Uint32,
    Sint32,
    Fixed32,
    Sfixed32,
    Int64,
    Uint64,
    Sint64,
    Fixed64,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// Parse a declared type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "double" => ScalarType::Double,
            "float" => ScalarType::Float,
            "int32" => ScalarType::Int32,
            "uint32" => ScalarType::Uint32,
            "sint32" => ScalarType::Sint32,
            "fixed32" => ScalarType::Fixed32,
            "sfixed32" => ScalarType::Sfixed32,
            "int64" => ScalarType::Int64,
            "uint64" => ScalarType::Uint64,
            "sint64" => ScalarType::Sint64,
            "fixed64" => ScalarType::Fixed64,
            "sfixed64" => ScalarType::Sfixed64,
            "bool" => ScalarType::Bool,
            "string" => ScalarType::String,
            "bytes" => ScalarType::Bytes,
            _ => return None,
        })
    }

    /// The declared type name.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Int32 => "int32",
            ScalarType::Uint32 => "uint32",
            ScalarType::Sint32 => "sint32",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    /// Physical layout of one value of this type.
    pub fn wire_type(self) -> WireType {
        match self {
            ScalarType::Double | ScalarType::Fixed64 | ScalarType::Sfixed64 => WireType::Fixed64,
            ScalarType::Float | ScalarType::Fixed32 | ScalarType::Sfixed32 => WireType::Fixed32,
            ScalarType::String | ScalarType::Bytes => WireType::Len,
            _ => WireType::Varint,
        }
    }

    /// Whether repeated values of this type may be packed into one
    /// length-delimited run.
    pub fn is_packable(self) -> bool {
        !matches!(self, ScalarType::String | ScalarType::Bytes)
    }

    /// Whether this type may key a map field. The allow-list excludes
    /// floating-point types and bytes.
    pub fn valid_map_key(self) -> bool {
        !matches!(self, ScalarType::Double | ScalarType::Float | ScalarType::Bytes)
    }

    /// The zero value appropriate to this type.
    pub fn zero(self) -> Value {
        match self {
            ScalarType::Double => Value::F64(0.0),
            ScalarType::Float => Value::F32(0.0),
            ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => Value::I32(0),
            ScalarType::Uint32 | ScalarType::Fixed32 => Value::U32(0),
            ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => Value::I64(0),
            ScalarType::Uint64 | ScalarType::Fixed64 => Value::U64(0),
            ScalarType::Bool => Value::Bool(false),
            ScalarType::String => Value::String(String::new()),
            ScalarType::Bytes => Value::Bytes(Bytes::new()),
        }
    }
}

/// Field cardinality. Map fields carry `key_type` instead of a rule of their
/// own and must stay `Optional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rule {
    #[default]
    Optional,
    Required,
    Repeated,
}

impl Rule {
    /// Parse a declared rule name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "optional" | "singular" | "proto3_optional" => Rule::Optional,
            "required" => Rule::Required,
            "repeated" => Rule::Repeated,
            _ => return None,
        })
    }

    /// The canonical rule name, or `None` for the default.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Rule::Optional => None,
            Rule::Required => Some("required"),
            Rule::Repeated => Some("repeated"),
        }
    }
}

/// What a message- or enum-typed field's reference resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedType {
    Message(NodeId),
    Enum(NodeId),
}

/// One field of a message type.
///
/// `resolved`, `type_default` and `packed` are fixed by the one-time
/// [`Root::resolve_all`](crate::reflect::Root::resolve_all) pass and must
/// not be read before it ran.
#[derive(Debug, Clone)]
pub struct FieldData {
    pub name: String,
    /// Wire field number, positive and unique within the owning type.
    pub id: u32,
    pub rule: Rule,
    /// Declared type: a scalar name or a dotted type reference.
    pub type_name: String,
    /// `Some` when `type_name` names a scalar.
    pub scalar: Option<ScalarType>,
    /// `Some` makes this a map field keyed by the given scalar.
    pub key_type: Option<ScalarType>,
    /// Extension target path: this field extends another type's layout.
    pub extend: Option<String>,
    pub options: OptionMap,
    /// Index of the owning oneof, if any.
    pub part_of: Option<usize>,
    /// True for the sister field materialized on an extension's target type.
    pub is_extension: bool,
    /// Non-null only for message/enum-typed fields, set by `resolve_all`.
    pub resolved: Option<ResolvedType>,
    /// The field's default, set by `resolve_all`. `None` for message fields.
    pub type_default: Option<Value>,
    /// Whether repeated values are encoded as one length-delimited run.
    pub packed: bool,
}

impl FieldData {
    /// Create an unresolved field record.
    pub fn new(name: impl Into<String>, id: u32, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            id,
            rule: Rule::Optional,
            scalar: ScalarType::from_name(&type_name),
            type_name,
            key_type: None,
            extend: None,
            options: OptionMap::new(),
            part_of: None,
            is_extension: false,
            resolved: None,
            type_default: None,
            packed: false,
        }
    }

    /// Whether this is a map field.
    pub fn is_map(&self) -> bool {
        self.key_type.is_some()
    }

    /// Wire type of one value of this field (maps and messages are
    /// length-delimited; enums ride the varint wire).
    pub fn value_wire_type(&self) -> WireType {
        if self.is_map() {
            return WireType::Len;
        }
        match (self.scalar, self.resolved) {
            (Some(scalar), _) => scalar.wire_type(),
            (None, Some(ResolvedType::Enum(_))) => WireType::Varint,
            _ => WireType::Len,
        }
    }
}
