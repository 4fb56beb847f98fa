//! # Wire Primitives
//!
//! Byte-exact encoding and decoding of the Protocol Buffers scalar wire
//! representations.
//!
//! This module is the leaf of the crate: nothing here knows about schemas.
//!
//! ## Components
//! - **varint**: 7-bits-per-byte variable-length integers and the zigzag
//!   signed/unsigned transform
//! - **base64**: strict alphabet-table codec for bytes-field interchange
//! - **Reader**: sequential cursor decoder over a byte buffer
//! - **Writer**: deferred operation-list encoder with `fork`/`ldelim`
//!   length-prefixed framing
//!
//! ## Wire Format
//! ```text
//! tag = (field_number << 3) | wire_type
//! wire types: 0=varint, 1=64-bit, 2=length-delimited,
//!             3/4=start/end group (legacy), 5=32-bit
//! ```

pub mod base64;
pub mod reader;
pub mod varint;
pub mod writer;

pub use reader::Reader;
pub use writer::Writer;

use crate::error::{CodecError, Result};

/// The 3-bit tag suffix identifying how a field value is physically laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum WireType {
    /// Varint-encoded integers and booleans.
    Varint = 0,
    /// Raw little-endian 8-byte values.
    Fixed64 = 1,
    /// Length-prefixed payloads: strings, bytes, sub-messages, packed runs.
    Len = 2,
    /// Legacy group start marker.
    StartGroup = 3,
    /// Legacy group end marker.
    EndGroup = 4,
    /// Raw little-endian 4-byte values.
    Fixed32 = 5,
}

impl WireType {
    /// Extract the wire type from the low 3 bits of a tag.
    pub fn from_tag(tag: u32) -> Result<Self> {
        Self::from_u32(tag & 7)
    }

    /// Interpret a raw 3-bit value.
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(CodecError::InvalidWireType(other)),
        }
    }

    /// The numeric tag suffix.
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Canonical quiet-NaN bit pattern written for single-precision NaN inputs.
pub(crate) const CANONICAL_NAN_32: u32 = 0x7fc0_0000;

/// Canonical quiet-NaN bit pattern written for double-precision NaN inputs.
pub(crate) const CANONICAL_NAN_64: u64 = 0x7ff8_0000_0000_0000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_round_trip() {
        for raw in 0..6u32 {
            let wt = WireType::from_u32(raw).expect("0..=5 are valid wire types");
            assert_eq!(wt.as_u32(), raw);
        }
    }

    #[test]
    fn test_wire_type_rejects_unknown() {
        assert!(matches!(
            WireType::from_u32(6),
            Err(CodecError::InvalidWireType(6))
        ));
        assert!(matches!(
            WireType::from_u32(7),
            Err(CodecError::InvalidWireType(7))
        ));
    }

    #[test]
    fn test_wire_type_from_tag_masks_field_number() {
        // tag for field 12, wire type 2
        let tag = (12 << 3) | 2;
        assert_eq!(WireType::from_tag(tag).unwrap(), WireType::Len);
    }
}
