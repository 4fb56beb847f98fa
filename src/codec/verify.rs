//! Schema conformance checking.
//!
//! `verify` never panics and never raises: it returns `None` for a valid
//! instance or a path-qualified description of the first violation, so
//! callers can gate an encode on it cheaply.

use crate::reflect::root::Root;
use crate::reflect::{FieldData, MessageData, NodeId, ResolvedType, Rule};
use crate::value::{DynamicMessage, Value};

/// Check an instance against its schema.
pub(crate) fn verify_message(root: &Root, id: NodeId, message: &DynamicMessage) -> Option<String> {
    let data = root.message_data(id);

    if let Some(problem) = verify_oneofs(data, message) {
        return Some(problem);
    }

    for field in &data.fields {
        let Some(value) = message.get(field.id) else {
            if field.rule == Rule::Required {
                return Some(format!("missing required '{}'", field.name));
            }
            continue;
        };

        let problem = if field.is_map() {
            verify_map(root, field, value)
        } else if field.rule == Rule::Repeated {
            verify_list(root, field, value)
        } else {
            verify_singular(root, field, value)
        };
        if problem.is_some() {
            return problem;
        }
    }
    None
}

/// At most one member of each oneof may be present.
fn verify_oneofs(data: &MessageData, message: &DynamicMessage) -> Option<String> {
    for oneof in &data.oneofs {
        let present = oneof
            .fields
            .iter()
            .filter_map(|name| data.field_by_name(name))
            .filter(|field| message.has(field.id))
            .count();
        if present > 1 {
            return Some(format!("{}: multiple values", oneof.name));
        }
    }
    None
}

fn verify_map(root: &Root, field: &FieldData, value: &Value) -> Option<String> {
    let Value::Map(entries) = value else {
        return Some(format!("{}: object expected", field.name));
    };
    let key_type = field.key_type?;
    for (key, element) in entries {
        if !super::map_key_matches(key_type, key) {
            return Some(format!("{}: {} key expected", field.name, key_type.name()));
        }
        if let Some(problem) = verify_singular(root, field, element) {
            return Some(problem);
        }
    }
    None
}

fn verify_list(root: &Root, field: &FieldData, value: &Value) -> Option<String> {
    let Value::List(elements) = value else {
        return Some(format!("{}: array expected", field.name));
    };
    elements
        .iter()
        .find_map(|element| verify_singular(root, field, element))
}

fn verify_singular(root: &Root, field: &FieldData, value: &Value) -> Option<String> {
    match (field.scalar, field.resolved) {
        (Some(scalar), _) => {
            if super::scalar_matches(scalar, value) {
                None
            } else {
                Some(format!("{}: {} expected", field.name, scalar.name()))
            }
        }
        (None, Some(ResolvedType::Enum(target))) => match value {
            Value::Enum(number) if root.enum_data(target).has_number(*number) => None,
            _ => Some(format!("{}: enum value expected", field.name)),
        },
        (None, Some(ResolvedType::Message(target))) => match value {
            Value::Message(nested) if nested.type_id() == target => {
                verify_message(root, target, nested)
                    .map(|inner| format!("{}.{inner}", field.name))
            }
            _ => Some(format!("{}: object expected", field.name)),
        },
        (None, None) => Some(format!("{}: unresolved type", field.name)),
    }
}
