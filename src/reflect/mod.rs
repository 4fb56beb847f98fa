//! # Reflection Graph
//!
//! An in-memory tree mirroring a message schema: namespaces, message types,
//! enums, services, and their fields, oneofs and methods.
//!
//! The graph is arena-owned: a [`Root`] holds every node and hands out
//! lightweight borrowing handles ([`MessageType`], [`EnumType`],
//! [`ServiceType`]) instead of parent-pointer object webs. After
//! [`Root::resolve_all`] the graph is treated as immutable metadata and may
//! be shared read-only across concurrent encode/decode operations.
//!
//! ## Components
//! - **Root**: the top-level namespace; owns the arena, deferred extension
//!   resolution, and JSON descriptor ingestion/emission
//! - **MessageType / EnumType / ServiceType**: typed handles exposing the
//!   runtime API (`encode`, `decode`, `verify`, `from_value`, `to_value`)
//! - **FieldData / OneOf / Method**: per-member schema records
//!
//! ## Descriptor interchange
//! Schemas arrive as a JSON-serializable namespace tree
//! (`{options, nested: {name: {fields: …} | {values: …} | {methods: …} | {…nested}}}`)
//! via [`Root::from_json`], and round-trip back out through [`Root::to_json`].

pub mod descriptor;
pub mod enums;
pub mod field;
pub mod handle;
pub mod message;
pub mod root;
pub mod service;

pub use enums::EnumData;
pub use field::{FieldData, ResolvedType, Rule, ScalarType};
pub use handle::{EnumType, MessageType, ServiceType};
pub use message::{MessageData, OneOf};
pub use root::Root;
pub use service::{Method, ServiceData};

use std::collections::BTreeMap;

/// Key-value option bag attached to every reflection object.
pub type OptionMap = serde_json::Map<String, serde_json::Value>;

/// Index of a node inside its owning [`Root`]'s arena.
///
/// Ids are only meaningful against the root that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The root namespace node.
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One arena slot: name, owning namespace, options, and kind-specific data.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub options: OptionMap,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Namespace(NamespaceData),
    Message(MessageData),
    Enum(EnumData),
    Service(ServiceData),
}

/// A plain namespace: nothing but named children.
#[derive(Debug, Clone, Default)]
pub(crate) struct NamespaceData {
    pub nested: BTreeMap<String, NodeId>,
}

impl Node {
    /// Child table, for the two kinds that can own children.
    pub fn nested(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Namespace(ns) => Some(&ns.nested),
            NodeKind::Message(m) => Some(&m.nested),
            _ => None,
        }
    }

    pub fn nested_mut(&mut self) -> Option<&mut BTreeMap<String, NodeId>> {
        match &mut self.kind {
            NodeKind::Namespace(ns) => Some(&mut ns.nested),
            NodeKind::Message(m) => Some(&mut m.nested),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Namespace(_) => "namespace",
            NodeKind::Message(_) => "type",
            NodeKind::Enum(_) => "enum",
            NodeKind::Service(_) => "service",
        }
    }
}
