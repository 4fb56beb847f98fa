//! Sequential cursor-based wire decoder.

use crate::error::{CodecError, Result};
use crate::wire::varint::{unzigzag32, unzigzag64, MAX_VARINT64_BYTES};
use crate::wire::WireType;
use bytes::Bytes;

/// A mutable-cursor decoder over a byte buffer.
///
/// Every read advances the position; every bounds violation raises
/// [`CodecError::IndexOutOfRange`] and leaves the cursor in an undefined
/// state — the reader must then be discarded.
///
/// A `Reader` is single-use by one logical decode operation at a time; there
/// is no internal synchronization.
#[derive(Debug, Clone)]
pub struct Reader {
    buf: Bytes,
    pos: usize,
}

impl Reader {
    /// Create a reader over an owned buffer.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            pos: 0,
        }
    }

    /// Create a reader copying from a borrowed slice.
    pub fn from_slice(buf: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(buf))
    }

    /// Current read position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.buf.len() {
            return Err(CodecError::IndexOutOfRange {
                needed: 1,
                remaining: 0,
            });
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    fn check(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(CodecError::IndexOutOfRange {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read a varint as an unsigned 64-bit value.
    pub fn uint64(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT64_BYTES {
            let byte = self.read_byte()?;
            // The tenth byte may only contribute the final bit.
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::InvalidVarint)
    }

    /// Read a varint, truncated to 32 bits.
    pub fn uint32(&mut self) -> Result<u32> {
        Ok(self.uint64()? as u32)
    }

    /// Read a varint reinterpreted as a signed 32-bit value.
    pub fn int32(&mut self) -> Result<i32> {
        Ok(self.uint32()? as i32)
    }

    /// Read a zigzag-encoded signed 32-bit value.
    pub fn sint32(&mut self) -> Result<i32> {
        Ok(unzigzag32(self.uint32()?))
    }

    /// Read a varint reinterpreted as a signed 64-bit value.
    pub fn int64(&mut self) -> Result<i64> {
        Ok(self.uint64()? as i64)
    }

    /// Read a zigzag-encoded signed 64-bit value.
    pub fn sint64(&mut self) -> Result<i64> {
        Ok(unzigzag64(self.uint64()?))
    }

    /// Read a varint as a boolean.
    pub fn bool(&mut self) -> Result<bool> {
        Ok(self.uint64()? != 0)
    }

    /// Read 4 raw little-endian bytes.
    pub fn fixed32(&mut self) -> Result<u32> {
        self.check(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(u32::from_le_bytes(raw))
    }

    /// Read 4 raw little-endian bytes as a signed value.
    pub fn sfixed32(&mut self) -> Result<i32> {
        Ok(self.fixed32()? as i32)
    }

    /// Read 8 raw little-endian bytes.
    pub fn fixed64(&mut self) -> Result<u64> {
        self.check(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_le_bytes(raw))
    }

    /// Read 8 raw little-endian bytes as a signed value.
    pub fn sfixed64(&mut self) -> Result<i64> {
        Ok(self.fixed64()? as i64)
    }

    /// Read an IEEE-754 single-precision value.
    pub fn float(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.fixed32()?))
    }

    /// Read an IEEE-754 double-precision value.
    pub fn double(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.fixed64()?))
    }

    /// Read a length-prefixed byte payload as a zero-copy sub-slice.
    pub fn bytes(&mut self) -> Result<Bytes> {
        let len = self.uint32()? as usize;
        self.check(len)?;
        let slice = self.buf.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(slice)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn string(&mut self) -> Result<String> {
        let raw = self.bytes()?;
        let text = std::str::from_utf8(&raw).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(text.to_owned())
    }

    /// Advance by `length` bytes, or — with `None` — past one whole varint.
    pub fn skip(&mut self, length: Option<usize>) -> Result<()> {
        match length {
            Some(len) => {
                self.check(len)?;
                self.pos += len;
                Ok(())
            }
            None => {
                for _ in 0..MAX_VARINT64_BYTES {
                    if self.read_byte()? & 0x80 == 0 {
                        return Ok(());
                    }
                }
                Err(CodecError::InvalidVarint)
            }
        }
    }

    /// Skip one value of the given wire type, recursing through groups until
    /// the matching end-group tag.
    pub fn skip_type(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => self.skip(None),
            WireType::Fixed64 => self.skip(Some(8)),
            WireType::Len => {
                let len = self.uint32()? as usize;
                self.skip(Some(len))
            }
            WireType::StartGroup => loop {
                let tag = self.uint32()?;
                let inner = WireType::from_tag(tag)?;
                if inner == WireType::EndGroup {
                    return Ok(());
                }
                self.skip_type(inner)?;
            },
            WireType::EndGroup => Err(CodecError::InvalidWireType(4)),
            WireType::Fixed32 => self.skip(Some(4)),
        }
    }
}
