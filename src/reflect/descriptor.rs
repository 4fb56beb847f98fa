//! JSON descriptor interchange.
//!
//! The serde model of the namespace tree external tooling hands to the
//! runtime, and the [`Root`] methods that ingest and emit it. The shape is
//! keyed by structure, not by an explicit kind tag: an object with `fields`
//! is a message type, `values` an enum, `methods` a service, and anything
//! else a plain namespace.

use crate::error::{CodecError, Result};
use crate::reflect::field::FieldData;
use crate::reflect::message::OneOf;
use crate::reflect::service::Method;
use crate::reflect::{NodeId, NodeKind, OptionMap, Root, Rule, ScalarType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A namespace: options plus named children.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<BTreeMap<String, NodeDescriptor>>,
}

/// Any nested schema object, discriminated by its structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeDescriptor {
    Type(TypeDescriptor),
    Enum(EnumDescriptor),
    Service(ServiceDescriptor),
    Namespace(NamespaceDescriptor),
}

/// A message type: fields, oneofs, nested objects, ranges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
    pub fields: BTreeMap<String, FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oneofs: Option<BTreeMap<String, OneOfDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<BTreeMap<String, NodeDescriptor>>,
    /// Extension ranges as `[start, end]` pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<(u32, u32)>>,
    /// Reserved ranges and names, mixed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved: Option<Vec<ReservedEntry>>,
}

/// One entry of a `reserved` list: an id range or a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReservedEntry {
    Range((u32, u32)),
    Name(String),
}

/// One field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
}

/// One oneof declaration: its member field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneOfDescriptor {
    pub oneof: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
}

/// An enum type. Values stay a JSON map so declaration order survives the
/// round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
    pub values: serde_json::Map<String, serde_json::Value>,
}

/// A service: named methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
    pub methods: BTreeMap<String, MethodDescriptor>,
}

/// One rpc method declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub request_type: String,
    pub response_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
}

impl Root {
    /// Build a root from a JSON descriptor value and resolve it.
    pub fn from_json(value: serde_json::Value) -> Result<Root> {
        let desc: NamespaceDescriptor = serde_json::from_value(value)
            .map_err(|e| CodecError::Descriptor(e.to_string()))?;
        let mut root = Root::new();
        root.add_json(NodeId::ROOT, &desc)?;
        root.resolve_all()?;
        Ok(root)
    }

    /// Build a root from JSON descriptor text and resolve it.
    pub fn from_json_str(text: &str) -> Result<Root> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| CodecError::Descriptor(e.to_string()))?;
        Self::from_json(value)
    }

    /// Merge a namespace descriptor into an existing namespace node.
    pub fn add_json(&mut self, parent: NodeId, desc: &NamespaceDescriptor) -> Result<()> {
        if let Some(options) = &desc.options {
            self.node_mut(parent).options.extend(options.clone());
        }
        if let Some(nested) = &desc.nested {
            for (name, child) in nested {
                self.add_node_descriptor(parent, name, child)?;
            }
        }
        Ok(())
    }

    fn add_node_descriptor(
        &mut self,
        parent: NodeId,
        name: &str,
        desc: &NodeDescriptor,
    ) -> Result<NodeId> {
        match desc {
            NodeDescriptor::Type(t) => self.add_type_descriptor(parent, name, t),
            NodeDescriptor::Enum(e) => self.add_enum_descriptor(parent, name, e),
            NodeDescriptor::Service(s) => self.add_service_descriptor(parent, name, s),
            NodeDescriptor::Namespace(ns) => {
                let id = self.add_namespace(parent, name)?;
                self.add_json(id, ns)?;
                Ok(id)
            }
        }
    }

    fn add_type_descriptor(
        &mut self,
        parent: NodeId,
        name: &str,
        desc: &TypeDescriptor,
    ) -> Result<NodeId> {
        let id = self.add_message(parent, name)?;
        if let Some(options) = &desc.options {
            self.node_mut(id).options.extend(options.clone());
        }

        // Ranges first, so field registration validates against them.
        if let NodeKind::Message(m) = &mut self.node_mut(id).kind {
            if let Some(ranges) = &desc.extensions {
                m.extension_ranges = ranges.clone();
            }
            if let Some(reserved) = &desc.reserved {
                for entry in reserved {
                    match entry {
                        ReservedEntry::Range(range) => m.reserved_ranges.push(*range),
                        ReservedEntry::Name(reserved_name) => {
                            m.reserved_names.push(reserved_name.clone())
                        }
                    }
                }
            }
        }

        for (field_name, fd) in &desc.fields {
            let field = build_field(field_name, fd)?;
            self.add_field(id, field)?;
        }

        if let Some(oneofs) = &desc.oneofs {
            for (oneof_name, od) in oneofs {
                self.add_oneof(
                    id,
                    OneOf {
                        name: oneof_name.clone(),
                        fields: od.oneof.clone(),
                        options: od.options.clone().unwrap_or_default(),
                    },
                )?;
            }
        }

        if let Some(nested) = &desc.nested {
            for (child_name, child) in nested {
                self.add_node_descriptor(id, child_name, child)?;
            }
        }
        Ok(id)
    }

    fn add_enum_descriptor(
        &mut self,
        parent: NodeId,
        name: &str,
        desc: &EnumDescriptor,
    ) -> Result<NodeId> {
        let id = self.add_enum(parent, name)?;
        if let Some(options) = &desc.options {
            self.node_mut(id).options.extend(options.clone());
        }
        let full = self.full_name(id);
        let allow_alias = self
            .node(id)
            .options
            .get("allow_alias")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        if let NodeKind::Enum(e) = &mut self.node_mut(id).kind {
            e.allow_alias = allow_alias;
        }
        for (value_name, number) in &desc.values {
            let number = number
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| {
                    CodecError::Descriptor(format!(
                        "enum value '{full}.{value_name}' must be a 32-bit integer"
                    ))
                })?;
            if let NodeKind::Enum(e) = &mut self.node_mut(id).kind {
                e.add_value(value_name, number, &full)?;
            }
        }
        Ok(id)
    }

    fn add_service_descriptor(
        &mut self,
        parent: NodeId,
        name: &str,
        desc: &ServiceDescriptor,
    ) -> Result<NodeId> {
        let id = self.add_service(parent, name)?;
        if let Some(options) = &desc.options {
            self.node_mut(id).options.extend(options.clone());
        }
        if let NodeKind::Service(s) = &mut self.node_mut(id).kind {
            for (method_name, md) in &desc.methods {
                let mut method = Method::new(method_name, &md.request_type, &md.response_type);
                method.request_stream = md.request_stream.unwrap_or(false);
                method.response_stream = md.response_stream.unwrap_or(false);
                method.options = md.options.clone().unwrap_or_default();
                s.methods.push(method);
            }
        }
        Ok(id)
    }

    /// Emit the whole graph as a JSON descriptor tree.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.namespace_descriptor(NodeId::ROOT))
            .unwrap_or(serde_json::Value::Null)
    }

    fn namespace_descriptor(&self, id: NodeId) -> NamespaceDescriptor {
        let node = self.node(id);
        NamespaceDescriptor {
            options: non_empty(&node.options),
            nested: self.nested_descriptors(id),
        }
    }

    fn nested_descriptors(&self, id: NodeId) -> Option<BTreeMap<String, NodeDescriptor>> {
        let nested = self.node(id).nested()?;
        if nested.is_empty() {
            return None;
        }
        let mut out = BTreeMap::new();
        for (name, &child) in nested {
            out.insert(name.clone(), self.node_descriptor(child));
        }
        Some(out)
    }

    fn node_descriptor(&self, id: NodeId) -> NodeDescriptor {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Namespace(_) => NodeDescriptor::Namespace(self.namespace_descriptor(id)),
            NodeKind::Message(m) => {
                let mut fields = BTreeMap::new();
                // Extension sisters belong to their declaring type's JSON
                for field in m.fields.iter().filter(|f| !f.is_extension) {
                    fields.insert(field.name.clone(), field_descriptor(field));
                }
                for field in &m.extensions {
                    fields.insert(field.name.clone(), field_descriptor(field));
                }
                let oneofs: BTreeMap<String, OneOfDescriptor> = m
                    .oneofs
                    .iter()
                    .map(|o| {
                        (
                            o.name.clone(),
                            OneOfDescriptor {
                                oneof: o.fields.clone(),
                                options: non_empty(&o.options),
                            },
                        )
                    })
                    .collect();
                let mut reserved: Vec<ReservedEntry> = m
                    .reserved_ranges
                    .iter()
                    .map(|&r| ReservedEntry::Range(r))
                    .collect();
                reserved.extend(m.reserved_names.iter().cloned().map(ReservedEntry::Name));

                NodeDescriptor::Type(TypeDescriptor {
                    options: non_empty(&node.options),
                    fields,
                    oneofs: if oneofs.is_empty() { None } else { Some(oneofs) },
                    nested: self.nested_descriptors(id),
                    extensions: if m.extension_ranges.is_empty() {
                        None
                    } else {
                        Some(m.extension_ranges.clone())
                    },
                    reserved: if reserved.is_empty() {
                        None
                    } else {
                        Some(reserved)
                    },
                })
            }
            NodeKind::Enum(e) => {
                let mut values = serde_json::Map::new();
                for (value_name, number) in e.iter() {
                    values.insert(value_name.to_string(), serde_json::Value::from(number));
                }
                NodeDescriptor::Enum(EnumDescriptor {
                    options: non_empty(&node.options),
                    values,
                })
            }
            NodeKind::Service(s) => {
                let methods = s
                    .methods
                    .iter()
                    .map(|m| {
                        (
                            m.name.clone(),
                            MethodDescriptor {
                                request_type: m.request_type.clone(),
                                response_type: m.response_type.clone(),
                                request_stream: m.request_stream.then_some(true),
                                response_stream: m.response_stream.then_some(true),
                                options: non_empty(&m.options),
                            },
                        )
                    })
                    .collect();
                NodeDescriptor::Service(ServiceDescriptor {
                    options: non_empty(&node.options),
                    methods,
                })
            }
        }
    }
}

fn build_field(name: &str, fd: &FieldDescriptor) -> Result<FieldData> {
    let mut field = FieldData::new(name, fd.id, &fd.type_);
    if let Some(rule) = &fd.rule {
        field.rule = Rule::from_name(rule).ok_or_else(|| CodecError::InvalidRule {
            rule: rule.clone(),
            field: name.to_string(),
        })?;
    }
    if let Some(key_type) = &fd.key_type {
        let scalar = ScalarType::from_name(key_type)
            .filter(|s| s.valid_map_key())
            .ok_or_else(|| CodecError::InvalidMapKeyType {
                key_type: key_type.clone(),
                field: name.to_string(),
            })?;
        if field.rule != Rule::Optional {
            return Err(CodecError::InvalidRule {
                rule: fd.rule.clone().unwrap_or_default(),
                field: name.to_string(),
            });
        }
        field.key_type = Some(scalar);
    }
    field.extend = fd.extend.clone();
    field.options = fd.options.clone().unwrap_or_default();
    Ok(field)
}

fn field_descriptor(field: &FieldData) -> FieldDescriptor {
    FieldDescriptor {
        type_: field.type_name.clone(),
        id: field.id,
        rule: field.rule.name().map(str::to_string),
        key_type: field.key_type.map(|k| k.name().to_string()),
        extend: field.extend.clone(),
        options: non_empty(&field.options),
    }
}

fn non_empty(options: &OptionMap) -> Option<OptionMap> {
    if options.is_empty() {
        None
    } else {
        Some(options.clone())
    }
}
