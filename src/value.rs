//! # Runtime Value Model
//!
//! Dynamically-typed message instances shaped by a reflection
//! [`MessageType`](crate::reflect::MessageType).
//!
//! A [`DynamicMessage`] owns no reflection state beyond a back-pointer to its
//! type's node id; instances are created and destroyed per encode/decode
//! call, while the reflection graph itself is shared read-only.

use crate::reflect::NodeId;
use bytes::Bytes;
use std::collections::BTreeMap;

/// A single field value inside a [`DynamicMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Bytes),
    /// An enum field's numeric value. Kept distinct from `I32` so converters
    /// can render symbolic names.
    Enum(i32),
    Message(DynamicMessage),
    /// Elements of a repeated field, in wire order.
    List(Vec<Value>),
    /// Entries of a map field.
    Map(BTreeMap<MapKey, Value>),
}

/// Map field keys: the scalar allow-list excludes floats and bytes, so keys
/// are totally ordered and hashable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    String(String),
}

/// A message instance: explicitly-present field values keyed by field number.
///
/// Absent entries mean "not set"; defaults are applied by the converters,
/// never stored. At most one member of a oneof is ever present — the setter
/// on [`MessageType`](crate::reflect::MessageType) and the decoder both clear
/// siblings when a member is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    type_id: NodeId,
    fields: BTreeMap<u32, Value>,
}

impl DynamicMessage {
    pub(crate) fn new(type_id: NodeId) -> Self {
        Self {
            type_id,
            fields: BTreeMap::new(),
        }
    }

    /// Node id of the message's [`MessageType`](crate::reflect::MessageType).
    pub fn type_id(&self) -> NodeId {
        self.type_id
    }

    /// Value of the field with the given number, if present.
    pub fn get(&self, field_number: u32) -> Option<&Value> {
        self.fields.get(&field_number)
    }

    /// Mutable value of the field with the given number, if present.
    pub fn get_mut(&mut self, field_number: u32) -> Option<&mut Value> {
        self.fields.get_mut(&field_number)
    }

    /// Whether the field is explicitly present.
    pub fn has(&self, field_number: u32) -> bool {
        self.fields.contains_key(&field_number)
    }

    /// Remove a field value, returning it if it was present.
    pub fn clear(&mut self, field_number: u32) -> Option<Value> {
        self.fields.remove(&field_number)
    }

    /// Present fields in ascending field-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.fields.iter().map(|(&id, value)| (id, value))
    }

    /// Number of explicitly-present fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Store a value without oneof bookkeeping. Schema-aware callers go
    /// through [`MessageType::set`](crate::reflect::MessageType::set).
    pub(crate) fn set_raw(&mut self, field_number: u32, value: Value) {
        self.fields.insert(field_number, value);
    }
}

impl Value {
    /// The variant name, used in type-mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "int32",
            Value::U32(_) => "uint32",
            Value::I64(_) => "int64",
            Value::U64(_) => "uint64",
            Value::F32(_) => "float",
            Value::F64(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_tracking() {
        let mut msg = DynamicMessage::new(NodeId::ROOT);
        assert!(!msg.has(1));
        msg.set_raw(1, Value::I32(-5));
        assert!(msg.has(1));
        assert_eq!(msg.get(1), Some(&Value::I32(-5)));
        assert_eq!(msg.clear(1), Some(Value::I32(-5)));
        assert!(!msg.has(1));
    }

    #[test]
    fn test_iter_ascending_field_order() {
        let mut msg = DynamicMessage::new(NodeId::ROOT);
        msg.set_raw(3, Value::Bool(true));
        msg.set_raw(1, Value::U32(9));
        let ids: Vec<u32> = msg.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_map_key_ordering() {
        let mut map = BTreeMap::new();
        map.insert(MapKey::String("b".into()), Value::I32(2));
        map.insert(MapKey::String("a".into()), Value::I32(1));
        let keys: Vec<&MapKey> = map.keys().collect();
        assert_eq!(keys[0], &MapKey::String("a".into()));
    }
}
