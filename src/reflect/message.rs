//! Message type records: field tables, oneofs, extension and reserved ranges.

use crate::error::{CodecError, Result};
use crate::reflect::field::FieldData;
use crate::reflect::{NodeId, OptionMap};
use std::collections::BTreeMap;

/// A set of fields of which at most one may be present at a time.
#[derive(Debug, Clone)]
pub struct OneOf {
    pub name: String,
    /// Member field names in declaration order.
    pub fields: Vec<String>,
    pub options: OptionMap,
}

/// Schema data of one message type.
///
/// A message is also a namespace: nested types live in `nested`.
#[derive(Debug, Clone, Default)]
pub struct MessageData {
    pub nested: BTreeMap<String, NodeId>,
    /// Fields in declaration order. Includes extension sister fields.
    pub fields: Vec<FieldData>,
    pub oneofs: Vec<OneOf>,
    /// Extension fields declared *inside* this type, targeting another type.
    /// They are not part of this type's own wire layout.
    pub extensions: Vec<FieldData>,
    pub extension_ranges: Vec<(u32, u32)>,
    pub reserved_ranges: Vec<(u32, u32)>,
    pub reserved_names: Vec<String>,
    /// Field indices sorted by ascending id, fixed by `resolve_all`.
    pub(crate) encode_order: Vec<usize>,
}

impl MessageData {
    /// Field with the given wire number.
    pub fn field_by_id(&self, id: u32) -> Option<&FieldData> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Field with the given name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldData> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether an id falls into a reserved range.
    pub fn is_reserved_id(&self, id: u32) -> bool {
        self.reserved_ranges
            .iter()
            .any(|&(start, end)| id >= start && id <= end)
    }

    /// Whether a name is reserved.
    pub fn is_reserved_name(&self, name: &str) -> bool {
        self.reserved_names.iter().any(|n| n == name)
    }

    /// Register a field, rejecting duplicate ids/names and reserved
    /// collisions. `message` is the owning type's full name, used in errors.
    pub(crate) fn add_field(&mut self, field: FieldData, message: &str) -> Result<()> {
        if field.id == 0 {
            return Err(CodecError::Descriptor(format!(
                "field '{}' in '{message}' must have a positive id",
                field.name
            )));
        }
        if self.field_by_id(field.id).is_some() {
            return Err(CodecError::DuplicateId {
                id: field.id,
                message: message.to_string(),
            });
        }
        if self.field_by_name(&field.name).is_some() {
            return Err(CodecError::DuplicateName {
                name: field.name,
                namespace: message.to_string(),
            });
        }
        if self.is_reserved_id(field.id) || self.is_reserved_name(&field.name) {
            return Err(CodecError::ReservedField {
                name: field.name,
                message: message.to_string(),
            });
        }
        self.fields.push(field);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_id_rejected() {
        let mut data = MessageData::default();
        data.add_field(FieldData::new("a", 1, "int32"), "T").unwrap();
        let err = data
            .add_field(FieldData::new("b", 1, "int32"), "T")
            .unwrap_err();
        assert!(matches!(err, CodecError::DuplicateId { id: 1, .. }));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut data = MessageData::default();
        data.add_field(FieldData::new("a", 1, "int32"), "T").unwrap();
        let err = data
            .add_field(FieldData::new("a", 2, "int32"), "T")
            .unwrap_err();
        assert!(matches!(err, CodecError::DuplicateName { .. }));
    }

    #[test]
    fn test_reserved_collisions_rejected() {
        let mut data = MessageData {
            reserved_ranges: vec![(5, 9)],
            reserved_names: vec!["legacy".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            data.add_field(FieldData::new("x", 7, "int32"), "T"),
            Err(CodecError::ReservedField { .. })
        ));
        assert!(matches!(
            data.add_field(FieldData::new("legacy", 1, "int32"), "T"),
            Err(CodecError::ReservedField { .. })
        ));
    }

    #[test]
    fn test_zero_id_rejected() {
        let mut data = MessageData::default();
        assert!(matches!(
            data.add_field(FieldData::new("a", 0, "int32"), "T"),
            Err(CodecError::Descriptor(_))
        ));
    }
}
