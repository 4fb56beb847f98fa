//! The top-level namespace: arena ownership, lookup, deferred extensions and
//! the one-time resolution pass.

use crate::codec::convert::coerce_scalar;
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::reflect::enums::EnumData;
use crate::reflect::field::{FieldData, ResolvedType, Rule, ScalarType};
use crate::reflect::handle::{EnumType, MessageType, ServiceType};
use crate::reflect::message::{MessageData, OneOf};
use crate::reflect::{NamespaceData, Node, NodeId, NodeKind, OptionMap};
use crate::value::Value;
use tracing::{debug, trace};

/// An extension field waiting for its target type to be registered.
#[derive(Debug, Clone, Copy)]
struct Deferred {
    owner: NodeId,
    index: usize,
}

/// Owns the whole reflection graph.
///
/// Schema construction is fallible and mutable; after [`Root::resolve_all`]
/// the graph is treated as immutable metadata and may be shared read-only
/// across concurrent encode/decode operations.
#[derive(Debug, Clone)]
pub struct Root {
    pub(crate) nodes: Vec<Node>,
    deferred: Vec<Deferred>,
    config: CodecConfig,
}

impl Default for Root {
    fn default() -> Self {
        Self::new()
    }
}

impl Root {
    /// An empty root with default limits.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// An empty root with explicit limits.
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                options: OptionMap::new(),
                kind: NodeKind::Namespace(NamespaceData::default()),
            }],
            deferred: Vec::new(),
            config,
        }
    }

    /// The runtime limits this root was built with.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    // Handles are only constructed for nodes of the right kind, so these
    // lookups cannot miss on a well-formed id.
    pub(crate) fn message_data(&self, id: NodeId) -> &MessageData {
        match &self.node(id).kind {
            NodeKind::Message(m) => m,
            _ => panic!("node {} is not a message type", id.0),
        }
    }

    pub(crate) fn enum_data(&self, id: NodeId) -> &EnumData {
        match &self.node(id).kind {
            NodeKind::Enum(e) => e,
            _ => panic!("node {} is not an enum", id.0),
        }
    }

    /// Dotted full name of a node, empty for the root itself.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            if !node.name.is_empty() {
                parts.push(node.name.as_str());
            }
            cursor = node.parent;
        }
        parts.reverse();
        parts.join(".")
    }

    fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        let name = node.name.clone();
        let Some(nested) = self.node(parent).nested() else {
            return Err(CodecError::KindMismatch {
                path: self.full_name(parent),
                expected: "namespace",
            });
        };
        if let Some(existing) = nested.get(&name).copied() {
            // Merging two plain namespaces is the one tolerated duplicate.
            let both_plain = matches!(self.node(existing).kind, NodeKind::Namespace(_))
                && matches!(node.kind, NodeKind::Namespace(_));
            if both_plain {
                trace!(name = %self.full_name(existing), "merging duplicate namespace");
                let options = std::mem::take(&mut node.options);
                self.node_mut(existing).options.extend(options);
                return Ok(existing);
            }
            return Err(CodecError::DuplicateName {
                name,
                namespace: self.full_name(parent),
            });
        }

        let id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        self.nodes.push(node);
        if let Some(nested) = self.node_mut(parent).nested_mut() {
            nested.insert(name, id);
        }
        Ok(id)
    }

    fn blank(name: &str, kind: NodeKind) -> Node {
        Node {
            name: name.to_string(),
            parent: None,
            options: OptionMap::new(),
            kind,
        }
    }

    /// Add a plain namespace under `parent` (or merge into an existing one).
    pub fn add_namespace(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.add_child(
            parent,
            Self::blank(name, NodeKind::Namespace(NamespaceData::default())),
        )
    }

    /// Add a message type under `parent`. Registering a type retries all
    /// deferred extensions, since it may be the target one of them waits for.
    pub fn add_message(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let id = self.add_child(
            parent,
            Self::blank(name, NodeKind::Message(MessageData::default())),
        )?;
        debug!(type_name = %self.full_name(id), "registered message type");
        self.try_resolve_extensions()?;
        Ok(id)
    }

    /// Add an enum under `parent`.
    pub fn add_enum(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.add_child(parent, Self::blank(name, NodeKind::Enum(EnumData::default())))
    }

    /// Add a service under `parent`.
    pub fn add_service(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.add_child(
            parent,
            Self::blank(name, NodeKind::Service(crate::reflect::ServiceData::default())),
        )
    }

    /// Get or create the namespace at a dotted path from the root.
    pub fn define(&mut self, path: &str) -> Result<NodeId> {
        let mut current = NodeId::ROOT;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let existing = self
                .node(current)
                .nested()
                .and_then(|n| n.get(segment).copied());
            current = match existing {
                Some(id) => id,
                None => self.add_namespace(current, segment)?,
            };
        }
        Ok(current)
    }

    /// Add a field to a message type. Extension fields (with `extend` set)
    /// are queued on the root's deferred list instead of joining their
    /// declaring type's wire layout.
    pub fn add_field(&mut self, message: NodeId, field: FieldData) -> Result<()> {
        let full = self.full_name(message);
        let NodeKind::Message(data) = &mut self.node_mut(message).kind else {
            return Err(CodecError::KindMismatch {
                path: full,
                expected: "type",
            });
        };

        if field.extend.is_some() {
            data.extensions.push(field);
            let index = data.extensions.len() - 1;
            self.deferred.push(Deferred {
                owner: message,
                index,
            });
            return self.try_resolve_extensions();
        }

        data.add_field(field, &full)
    }

    /// Add a oneof to a message type, marking its member fields.
    pub fn add_oneof(&mut self, message: NodeId, oneof: OneOf) -> Result<()> {
        let full = self.full_name(message);
        let NodeKind::Message(data) = &mut self.node_mut(message).kind else {
            return Err(CodecError::KindMismatch {
                path: full,
                expected: "type",
            });
        };

        let index = data.oneofs.len();
        for member in &oneof.fields {
            let Some(position) = data.fields.iter().position(|f| &f.name == member) else {
                return Err(CodecError::TypeNotFound {
                    path: format!("{full}.{member}"),
                });
            };
            let field = &mut data.fields[position];
            if field.rule != Rule::Optional || field.is_map() {
                return Err(CodecError::InvalidRule {
                    rule: field.rule.name().unwrap_or("map").to_string(),
                    field: field.name.clone(),
                });
            }
            if field.part_of.is_some() {
                return Err(CodecError::DuplicateName {
                    name: field.name.clone(),
                    namespace: format!("{full}.{}", oneof.name),
                });
            }
            field.part_of = Some(index);
        }
        data.oneofs.push(oneof);
        Ok(())
    }

    /// Retry every deferred extension against the current graph, creating a
    /// sister field on each target that now exists.
    fn try_resolve_extensions(&mut self) -> Result<()> {
        let deferred = std::mem::take(&mut self.deferred);
        for entry in deferred {
            let Some((field, target_path)) = self.deferred_field(entry) else {
                continue;
            };
            let target = self
                .lookup_from(entry.owner, &target_path)
                .filter(|&t| matches!(self.node(t).kind, NodeKind::Message(_)));
            match target {
                Some(target_id) => {
                    let full = self.full_name(target_id);
                    trace!(
                        field = %field.name,
                        target = %full,
                        "resolved deferred extension"
                    );
                    let mut sister = field;
                    sister.is_extension = true;
                    if let NodeKind::Message(m) = &mut self.node_mut(target_id).kind {
                        m.add_field(sister, &full)?;
                    }
                }
                None => self.deferred.push(entry),
            }
        }
        Ok(())
    }

    fn deferred_field(&self, entry: Deferred) -> Option<(FieldData, String)> {
        let NodeKind::Message(m) = &self.node(entry.owner).kind else {
            return None;
        };
        let field = m.extensions.get(entry.index)?;
        let target = field.extend.clone()?;
        Some((field.clone(), target))
    }

    /// Resolve a dotted path relative to the root namespace.
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.lookup_from(NodeId::ROOT, path)
    }

    /// Resolve a dotted path starting at `from`: the path is tried against
    /// `from` itself, then against each ancestor up to the root. A leading
    /// `.` anchors the path at the root.
    pub fn lookup_from(&self, from: NodeId, path: &str) -> Option<NodeId> {
        if let Some(rest) = path.strip_prefix('.') {
            return self.lookup_in(NodeId::ROOT, rest);
        }
        let mut scope = Some(from);
        while let Some(current) = scope {
            if let Some(found) = self.lookup_in(current, path) {
                return Some(found);
            }
            scope = self.node(current).parent;
        }
        None
    }

    fn lookup_in(&self, base: NodeId, path: &str) -> Option<NodeId> {
        let mut current = base;
        for segment in path.split('.') {
            if segment.is_empty() {
                return None;
            }
            current = self.node(current).nested()?.get(segment).copied()?;
        }
        Some(current)
    }

    /// Resolve a path to a message type, failing on a miss or kind mismatch.
    pub fn lookup_type(&self, path: &str) -> Result<MessageType<'_>> {
        let id = self.lookup(path).ok_or_else(|| CodecError::TypeNotFound {
            path: path.to_string(),
        })?;
        match self.node(id).kind {
            NodeKind::Message(_) => Ok(MessageType { root: self, id }),
            _ => Err(CodecError::KindMismatch {
                path: path.to_string(),
                expected: "type",
            }),
        }
    }

    /// Resolve a path to an enum, failing on a miss or kind mismatch.
    pub fn lookup_enum(&self, path: &str) -> Result<EnumType<'_>> {
        let id = self.lookup(path).ok_or_else(|| CodecError::TypeNotFound {
            path: path.to_string(),
        })?;
        match self.node(id).kind {
            NodeKind::Enum(_) => Ok(EnumType { root: self, id }),
            _ => Err(CodecError::KindMismatch {
                path: path.to_string(),
                expected: "enum",
            }),
        }
    }

    /// Resolve a path to a service, failing on a miss or kind mismatch.
    pub fn lookup_service(&self, path: &str) -> Result<ServiceType<'_>> {
        let id = self.lookup(path).ok_or_else(|| CodecError::TypeNotFound {
            path: path.to_string(),
        })?;
        match self.node(id).kind {
            NodeKind::Service(_) => Ok(ServiceType { root: self, id }),
            _ => Err(CodecError::KindMismatch {
                path: path.to_string(),
                expected: "service",
            }),
        }
    }

    /// One-time fixups over the whole tree: resolve type references, compute
    /// field defaults and packedness, resolve service method types, and fail
    /// if any deferred extension is still without a target.
    pub fn resolve_all(&mut self) -> Result<()> {
        self.try_resolve_extensions()?;
        if let Some(entry) = self.deferred.first().copied() {
            if let Some((field, target)) = self.deferred_field(entry) {
                return Err(CodecError::UnresolvedExtension {
                    field: field.name,
                    target,
                });
            }
        }

        for index in 0..self.nodes.len() {
            let id = NodeId(index as u32);
            match self.nodes[index].kind {
                NodeKind::Message(_) => self.resolve_message(id)?,
                NodeKind::Service(_) => self.resolve_service(id)?,
                _ => {}
            }
        }
        debug!(nodes = self.nodes.len(), "resolved reflection graph");
        Ok(())
    }

    fn resolve_message(&mut self, id: NodeId) -> Result<()> {
        let field_count = match &self.node(id).kind {
            NodeKind::Message(m) => m.fields.len(),
            _ => return Ok(()),
        };

        for i in 0..field_count {
            let (name, type_name, scalar, key_type, rule, options) = {
                let NodeKind::Message(m) = &self.node(id).kind else {
                    return Ok(());
                };
                let f = &m.fields[i];
                (
                    f.name.clone(),
                    f.type_name.clone(),
                    f.scalar,
                    f.key_type,
                    f.rule,
                    f.options.clone(),
                )
            };

            let resolved = if scalar.is_some() {
                None
            } else {
                let target =
                    self.lookup_from(id, &type_name)
                        .ok_or_else(|| CodecError::TypeNotFound {
                            path: type_name.clone(),
                        })?;
                match &self.node(target).kind {
                    NodeKind::Message(_) => Some(ResolvedType::Message(target)),
                    NodeKind::Enum(_) => Some(ResolvedType::Enum(target)),
                    _ => {
                        return Err(CodecError::KindMismatch {
                            path: type_name.clone(),
                            expected: "type or enum",
                        })
                    }
                }
            };

            let type_default = self.compute_default(&name, scalar, resolved, &options)?;

            let packable = key_type.is_none()
                && rule == Rule::Repeated
                && match scalar {
                    Some(s) => s.is_packable(),
                    None => matches!(resolved, Some(ResolvedType::Enum(_))),
                };
            let packed = packable
                && options
                    .get("packed")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(true);

            if let NodeKind::Message(m) = &mut self.node_mut(id).kind {
                let f = &mut m.fields[i];
                f.resolved = resolved;
                f.type_default = type_default;
                f.packed = packed;
            }
        }

        if let NodeKind::Message(m) = &mut self.node_mut(id).kind {
            let mut order: Vec<usize> = (0..m.fields.len()).collect();
            order.sort_by_key(|&i| m.fields[i].id);
            m.encode_order = order;
        }
        Ok(())
    }

    fn compute_default(
        &self,
        field_name: &str,
        scalar: Option<ScalarType>,
        resolved: Option<ResolvedType>,
        options: &OptionMap,
    ) -> Result<Option<Value>> {
        match resolved {
            Some(ResolvedType::Message(_)) => Ok(None),
            Some(ResolvedType::Enum(enum_id)) => {
                let data = self.enum_data(enum_id);
                let number = match options.get("default") {
                    Some(serde_json::Value::String(name)) => {
                        data.value_by_name(name)
                            .ok_or_else(|| CodecError::Descriptor(format!(
                                "unknown enum default '{name}' for field '{field_name}'"
                            )))?
                    }
                    Some(other) => other
                        .as_i64()
                        .and_then(|n| i32::try_from(n).ok())
                        .ok_or_else(|| CodecError::Descriptor(format!(
                            "invalid enum default for field '{field_name}'"
                        )))?,
                    None => data.first_value(),
                };
                Ok(Some(Value::Enum(number)))
            }
            None => {
                let Some(scalar) = scalar else {
                    return Err(CodecError::TypeNotFound {
                        path: field_name.to_string(),
                    });
                };
                match options.get("default") {
                    None => Ok(Some(scalar.zero())),
                    Some(value) => Ok(Some(coerce_scalar(field_name, scalar, value)?)),
                }
            }
        }
    }

    fn resolve_service(&mut self, id: NodeId) -> Result<()> {
        let method_count = match &self.node(id).kind {
            NodeKind::Service(s) => s.methods.len(),
            _ => return Ok(()),
        };

        for i in 0..method_count {
            let (request, response) = {
                let NodeKind::Service(s) = &self.node(id).kind else {
                    return Ok(());
                };
                (
                    s.methods[i].request_type.clone(),
                    s.methods[i].response_type.clone(),
                )
            };
            let request_id = self.resolve_method_type(id, &request)?;
            let response_id = self.resolve_method_type(id, &response)?;
            if let NodeKind::Service(s) = &mut self.node_mut(id).kind {
                s.methods[i].resolved_request = Some(request_id);
                s.methods[i].resolved_response = Some(response_id);
            }
        }
        Ok(())
    }

    fn resolve_method_type(&self, service: NodeId, path: &str) -> Result<NodeId> {
        let id = self
            .lookup_from(service, path)
            .ok_or_else(|| CodecError::TypeNotFound {
                path: path.to_string(),
            })?;
        match self.node(id).kind {
            NodeKind::Message(_) => Ok(id),
            _ => Err(CodecError::KindMismatch {
                path: path.to_string(),
                expected: "type",
            }),
        }
    }
}
