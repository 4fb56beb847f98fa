//! Borrowing handles over arena nodes.
//!
//! Handles bundle a [`Root`] reference with a node id and expose the runtime
//! API for their kind. They are `Copy` and cost nothing to pass around; all
//! schema state stays in the root's arena.

use crate::codec::convert::{message_from_value, message_to_value, ConversionOptions};
use crate::codec::decode::decode_message;
use crate::codec::encode::encode_message;
use crate::codec::store_field;
use crate::codec::verify::verify_message;
use crate::error::{CodecError, Result};
use crate::reflect::enums::EnumData;
use crate::reflect::field::FieldData;
use crate::reflect::message::{MessageData, OneOf};
use crate::reflect::root::Root;
use crate::reflect::service::{Method, ServiceData};
use crate::reflect::{NodeId, OptionMap};
use crate::utils::BufferPool;
use crate::value::{DynamicMessage, Value};
use crate::wire::{Reader, Writer};
use bytes::Bytes;

/// Handle to a message type node.
#[derive(Debug, Clone, Copy)]
pub struct MessageType<'a> {
    pub(crate) root: &'a Root,
    pub(crate) id: NodeId,
}

impl<'a> MessageType<'a> {
    /// Node id inside the owning root.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Short name of the type.
    pub fn name(&self) -> &'a str {
        &self.root.node(self.id).name
    }

    /// Dotted full name of the type.
    pub fn full_name(&self) -> String {
        self.root.full_name(self.id)
    }

    /// Options declared on the type.
    pub fn options(&self) -> &'a OptionMap {
        &self.root.node(self.id).options
    }

    pub(crate) fn data(&self) -> &'a MessageData {
        self.root.message_data(self.id)
    }

    /// Fields in declaration order, extension sisters included.
    pub fn fields(&self) -> &'a [FieldData] {
        &self.data().fields
    }

    /// Field with the given wire number.
    pub fn field_by_id(&self, id: u32) -> Option<&'a FieldData> {
        self.data().field_by_id(id)
    }

    /// Field with the given name.
    pub fn field_by_name(&self, name: &str) -> Option<&'a FieldData> {
        self.data().field_by_name(name)
    }

    /// Declared oneofs.
    pub fn oneofs(&self) -> &'a [OneOf] {
        &self.data().oneofs
    }

    /// A fresh instance of this type with no fields present.
    pub fn create(&self) -> DynamicMessage {
        DynamicMessage::new(self.id)
    }

    /// Set a field by name, checking the value's shape against the schema.
    /// Assigning a oneof member clears its present siblings first.
    pub fn set(&self, message: &mut DynamicMessage, name: &str, value: Value) -> Result<()> {
        let field = self
            .field_by_name(name)
            .ok_or_else(|| CodecError::TypeNotFound {
                path: format!("{}.{name}", self.full_name()),
            })?;
        store_field(self.data(), field, message, value)
    }

    /// Value of a field by name, if present.
    pub fn get<'m>(&self, message: &'m DynamicMessage, name: &str) -> Option<&'m Value> {
        self.field_by_name(name)
            .and_then(|field| message.get(field.id))
    }

    /// Encode an instance to a contiguous buffer.
    pub fn encode(&self, message: &DynamicMessage) -> Result<Bytes> {
        let mut writer = Writer::with_capacity(self.root.config().writer_capacity);
        encode_message(self.root, self.id, message, &mut writer)?;
        Ok(writer.finish())
    }

    /// Encode an instance, appending to an existing buffer.
    pub fn encode_to_vec(&self, message: &DynamicMessage, out: &mut Vec<u8>) -> Result<()> {
        let mut writer = Writer::with_capacity(self.root.config().writer_capacity);
        encode_message(self.root, self.id, message, &mut writer)?;
        writer.finish_into(out);
        Ok(())
    }

    /// Encode an instance into a buffer drawn from `pool`, returning the
    /// owned bytes. The backing buffer returns to the pool on drop.
    pub fn encode_pooled(&self, message: &DynamicMessage, pool: &BufferPool) -> Result<Vec<u8>> {
        let mut buffer = pool.acquire();
        self.encode_to_vec(message, &mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Encode an instance prefixed with its length as a varint.
    pub fn encode_delimited(&self, message: &DynamicMessage) -> Result<Bytes> {
        let mut writer = Writer::with_capacity(self.root.config().writer_capacity);
        writer.fork();
        encode_message(self.root, self.id, message, &mut writer)?;
        writer.ldelim();
        Ok(writer.finish())
    }

    /// Decode an instance from a buffer, consuming it fully.
    pub fn decode(&self, buf: impl Into<Bytes>) -> Result<DynamicMessage> {
        let mut reader = Reader::new(buf);
        let end = reader.len();
        decode_message(self.root, self.id, &mut reader, end, 0)
    }

    /// Decode an instance from a reader, consuming `len` bytes (or the rest
    /// of the buffer when `len` is `None`).
    pub fn decode_from(&self, reader: &mut Reader, len: Option<usize>) -> Result<DynamicMessage> {
        let end = match len {
            Some(len) => {
                let end = reader.pos() + len;
                if end > reader.len() {
                    return Err(CodecError::IndexOutOfRange {
                        needed: len,
                        remaining: reader.len() - reader.pos(),
                    });
                }
                end
            }
            None => reader.len(),
        };
        decode_message(self.root, self.id, reader, end, 0)
    }

    /// Decode a length-prefixed instance from a reader.
    pub fn decode_delimited(&self, reader: &mut Reader) -> Result<DynamicMessage> {
        let len = reader.uint32()? as usize;
        self.decode_from(reader, Some(len))
    }

    /// Check an instance against the schema. Returns `None` when valid, or
    /// a `"path: problem"` description of the first violation found.
    pub fn verify(&self, message: &DynamicMessage) -> Option<String> {
        verify_message(self.root, self.id, message)
    }

    /// Build an instance from a JSON-shaped value. Coercion is lenient:
    /// numbers arrive as JSON numbers or decimal strings, enums by name or
    /// number, bytes as base64 text or a byte array.
    pub fn from_value(&self, value: &serde_json::Value) -> Result<DynamicMessage> {
        message_from_value(self.root, self.id, value, 0)
    }

    /// Render an instance as a JSON-shaped value per `options`.
    pub fn to_value(&self, message: &DynamicMessage, options: &ConversionOptions) -> serde_json::Value {
        message_to_value(self.root, self.id, message, options)
    }
}

/// Handle to an enum node.
#[derive(Debug, Clone, Copy)]
pub struct EnumType<'a> {
    pub(crate) root: &'a Root,
    pub(crate) id: NodeId,
}

impl<'a> EnumType<'a> {
    /// Node id inside the owning root.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Short name of the enum.
    pub fn name(&self) -> &'a str {
        &self.root.node(self.id).name
    }

    /// Dotted full name of the enum.
    pub fn full_name(&self) -> String {
        self.root.full_name(self.id)
    }

    pub(crate) fn data(&self) -> &'a EnumData {
        self.root.enum_data(self.id)
    }

    /// Numeric value of a symbolic name.
    pub fn value_by_name(&self, name: &str) -> Option<i32> {
        self.data().value_by_name(name)
    }

    /// First declared name carrying the given number.
    pub fn name_by_number(&self, number: i32) -> Option<&'a str> {
        self.data().name_by_number(number)
    }

    /// Values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&'a str, i32)> {
        self.data().iter()
    }
}

/// Handle to a service node.
#[derive(Debug, Clone, Copy)]
pub struct ServiceType<'a> {
    pub(crate) root: &'a Root,
    pub(crate) id: NodeId,
}

impl<'a> ServiceType<'a> {
    /// Node id inside the owning root.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Short name of the service.
    pub fn name(&self) -> &'a str {
        &self.root.node(self.id).name
    }

    /// Dotted full name of the service.
    pub fn full_name(&self) -> String {
        self.root.full_name(self.id)
    }

    pub(crate) fn data(&self) -> &'a ServiceData {
        match &self.root.node(self.id).kind {
            crate::reflect::NodeKind::Service(s) => s,
            _ => panic!("node {} is not a service", self.id.0),
        }
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> &'a [Method] {
        &self.data().methods
    }

    /// Method with the given name.
    pub fn method(&self, name: &str) -> Option<&'a Method> {
        self.data().method(name)
    }

    /// Request message type of a method, after resolution.
    pub fn request_type(&self, method: &Method) -> Option<MessageType<'a>> {
        method.resolved_request.map(|id| MessageType {
            root: self.root,
            id,
        })
    }

    /// Response message type of a method, after resolution.
    pub fn response_type(&self, method: &Method) -> Option<MessageType<'a>> {
        method.resolved_response.map(|id| MessageType {
            root: self.root,
            id,
        })
    }
}
