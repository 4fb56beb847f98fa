//! Service and method records.
//!
//! Services are carried through the reflection graph and the descriptor
//! interchange format; call semantics (streaming, transports) are a
//! surrounding concern and live outside this crate.

use crate::reflect::{NodeId, OptionMap};

/// One rpc method of a service.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    /// Dotted path of the request message type.
    pub request_type: String,
    /// Dotted path of the response message type.
    pub response_type: String,
    pub request_stream: bool,
    pub response_stream: bool,
    pub options: OptionMap,
    /// Set by `resolve_all`.
    pub resolved_request: Option<NodeId>,
    /// Set by `resolve_all`.
    pub resolved_response: Option<NodeId>,
}

impl Method {
    pub fn new(
        name: impl Into<String>,
        request_type: impl Into<String>,
        response_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            request_type: request_type.into(),
            response_type: response_type.into(),
            request_stream: false,
            response_stream: false,
            options: OptionMap::new(),
            resolved_request: None,
            resolved_response: None,
        }
    }
}

/// Schema data of one service.
#[derive(Debug, Clone, Default)]
pub struct ServiceData {
    /// Methods in declaration order.
    pub methods: Vec<Method>,
}

impl ServiceData {
    /// Method with the given name.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}
