//! Enum type records.

use crate::error::{CodecError, Result};

/// Schema data of one enum type.
///
/// Duplicate numeric values are only legal when the enum declares the
/// `allow_alias` option; the first declared name stays canonical for a
/// number either way.
#[derive(Debug, Clone, Default)]
pub struct EnumData {
    entries: Vec<(String, i32)>,
    pub allow_alias: bool,
}

impl EnumData {
    /// Register a value, enforcing name uniqueness and the aliasing rule.
    /// `enum_name` is the owning enum's full name, used in errors.
    pub(crate) fn add_value(&mut self, name: &str, number: i32, enum_name: &str) -> Result<()> {
        if self.value_by_name(name).is_some() {
            return Err(CodecError::DuplicateName {
                name: name.to_string(),
                namespace: enum_name.to_string(),
            });
        }
        if !self.allow_alias && self.has_number(number) {
            return Err(CodecError::DuplicateEnumValue {
                value: number,
                enumeration: enum_name.to_string(),
            });
        }
        self.entries.push((name.to_string(), number));
        Ok(())
    }

    /// Numeric value of a symbolic name.
    pub fn value_by_name(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }

    /// First declared name carrying the given number.
    pub fn name_by_number(&self, number: i32) -> Option<&str> {
        self.entries
            .iter()
            .find(|&&(_, v)| v == number)
            .map(|(n, _)| n.as_str())
    }

    /// Whether any value carries the given number.
    pub fn has_number(&self, number: i32) -> bool {
        self.entries.iter().any(|&(_, v)| v == number)
    }

    /// The first declared value, used as the default for enum-typed fields.
    pub fn first_value(&self) -> i32 {
        self.entries.first().map(|&(_, v)| v).unwrap_or(0)
    }

    /// Values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_requires_option() {
        let mut data = EnumData::default();
        data.add_value("A", 0, "E").unwrap();
        let err = data.add_value("B", 0, "E").unwrap_err();
        assert!(matches!(err, CodecError::DuplicateEnumValue { value: 0, .. }));
    }

    #[test]
    fn test_alias_allowed_with_option() {
        let mut data = EnumData {
            allow_alias: true,
            ..Default::default()
        };
        data.add_value("A", 0, "E").unwrap();
        data.add_value("ALIAS", 0, "E").unwrap();
        // First declared name stays canonical
        assert_eq!(data.name_by_number(0), Some("A"));
        assert_eq!(data.value_by_name("ALIAS"), Some(0));
    }

    #[test]
    fn test_duplicate_name_rejected_even_with_alias() {
        let mut data = EnumData {
            allow_alias: true,
            ..Default::default()
        };
        data.add_value("A", 0, "E").unwrap();
        assert!(matches!(
            data.add_value("A", 1, "E"),
            Err(CodecError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_first_value_is_default() {
        let mut data = EnumData::default();
        data.add_value("STARTED", 3, "E").unwrap();
        data.add_value("STOPPED", 1, "E").unwrap();
        assert_eq!(data.first_value(), 3);
    }
}
