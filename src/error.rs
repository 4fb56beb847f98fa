//! # Error Types
//!
//! Comprehensive error handling for the codec runtime.
//!
//! This module defines all error variants that can occur during schema
//! construction, wire decoding, and plain-object conversion.
//!
//! ## Error Categories
//! - **Schema errors**: duplicate names/ids, reserved collisions, invalid
//!   rules, unresolved extensions — raised while a reflection graph is built
//!   or resolved, always fatal to schema loading.
//! - **Decode bounds errors**: a read that would exceed the buffer. The
//!   `Reader` is left in an undefined state and must be discarded.
//! - **Protocol errors**: a required field missing after a full decode pass.
//!   The partially-decoded instance is attached so callers can inspect what
//!   was recovered before the violation was detected.
//! - **Encoding errors**: malformed base64 or UTF-8 payloads.
//!
//! Validation through [`MessageType::verify`](crate::reflect::MessageType::verify)
//! deliberately does *not* use these types: it reports through a returned
//! error-path string so callers can validate speculatively without
//! exception-driven control flow.
//!
//! All errors implement `std::error::Error` for interoperability.

use crate::value::DynamicMessage;
use thiserror::Error;

/// Primary error type for all codec operations.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A sibling with the same name already exists in the namespace.
    #[error("duplicate name '{name}' in '{namespace}'")]
    DuplicateName { name: String, namespace: String },

    /// Two fields of one message share a numeric id.
    #[error("duplicate field id {id} in '{message}'")]
    DuplicateId { id: u32, message: String },

    /// Two enum values share a number and the enum does not set `allow_alias`.
    #[error("duplicate value {value} in enum '{enumeration}' without allow_alias")]
    DuplicateEnumValue { value: i32, enumeration: String },

    /// A field collides with a reserved id or reserved name.
    #[error("field '{name}' uses a reserved id or name in '{message}'")]
    ReservedField { name: String, message: String },

    /// Unrecognized field rule, or a rule that conflicts with the field's shape.
    #[error("invalid rule '{rule}' for field '{field}'")]
    InvalidRule { rule: String, field: String },

    /// Map key type outside the allow-list (floats and bytes cannot key a map).
    #[error("invalid map key type '{key_type}' for field '{field}'")]
    InvalidMapKeyType { key_type: String, field: String },

    /// A dotted-path type reference did not resolve.
    #[error("type '{path}' not found")]
    TypeNotFound { path: String },

    /// A path resolved, but to a different kind of reflection object.
    #[error("'{path}' is not a {expected}")]
    KindMismatch { path: String, expected: &'static str },

    /// An extension field's target type was never registered.
    #[error("unresolvable extension field '{field}' extending '{target}'")]
    UnresolvedExtension { field: String, target: String },

    /// A JSON schema descriptor could not be interpreted.
    #[error("invalid descriptor: {0}")]
    Descriptor(String),

    /// A read would run past the end of the buffer.
    #[error("index out of range: {needed} byte(s) needed, {remaining} remaining")]
    IndexOutOfRange { needed: usize, remaining: usize },

    /// A varint ran past its 10-byte maximum without terminating.
    #[error("invalid varint encoding")]
    InvalidVarint,

    /// An unrecognized 3-bit wire type tag.
    #[error("invalid wire type {0}")]
    InvalidWireType(u32),

    /// A `string` field carried bytes that are not valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// Base64 input contained a character outside the alphabet.
    #[error("invalid encoding")]
    InvalidEncoding,

    /// A required field was absent after a full decode pass. Carries the
    /// partially-decoded instance with every field that was present.
    #[error("missing required field '{field}' in '{message}'")]
    MissingRequiredField {
        field: String,
        message: String,
        partial: Box<DynamicMessage>,
    },

    /// A runtime value does not match the shape its field declares.
    #[error("type mismatch for '{field}': {expected} expected")]
    TypeMismatch { field: String, expected: String },

    /// Nested messages exceeded the configured recursion depth.
    #[error("recursion limit of {0} exceeded")]
    RecursionLimit(u32),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using [`CodecError`].
pub type Result<T> = std::result::Result<T, CodecError>;
