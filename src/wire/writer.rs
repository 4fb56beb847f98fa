//! Deferred operation-list wire encoder.

use crate::wire::varint::{size64, write64, zigzag32, zigzag64};
use crate::wire::{WireType, CANONICAL_NAN_32, CANONICAL_NAN_64};
use bytes::Bytes;

/// One pending write, materialized only at [`Writer::finish`].
#[derive(Debug, Clone)]
enum OpKind {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Raw(Bytes),
}

#[derive(Debug, Clone)]
struct Op {
    len: usize,
    kind: OpKind,
}

/// A saved framing state pushed by [`Writer::fork`].
#[derive(Debug, Clone, Copy)]
struct State {
    op_index: usize,
    len: usize,
}

/// Accumulates typed write operations and materializes them into a single
/// contiguous buffer exactly once.
///
/// Deferring byte production lets `ldelim` compute a nested message's length
/// prefix from the running total instead of re-walking (or re-encoding) the
/// content. A `Writer` is single-use per top-level message; nested messages
/// share it through `fork`/`ldelim` rather than allocating sub-writers.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    ops: Vec<Op>,
    len: usize,
    states: Vec<State>,
}

impl Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with a pre-sized operation list.
    pub fn with_capacity(ops: usize) -> Self {
        Self {
            ops: Vec::with_capacity(ops),
            len: 0,
            states: Vec::new(),
        }
    }

    /// Total byte length accumulated so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, len: usize, kind: OpKind) -> &mut Self {
        self.ops.push(Op { len, kind });
        self.len += len;
        self
    }

    /// Write a field tag: `(field_number << 3) | wire_type`.
    pub fn tag(&mut self, field_number: u32, wire_type: WireType) -> &mut Self {
        self.uint32((field_number << 3) | wire_type.as_u32())
    }

    /// Write an unsigned 32-bit varint (1-5 bytes).
    pub fn uint32(&mut self, value: u32) -> &mut Self {
        self.uint64(u64::from(value))
    }

    /// Write a signed 32-bit varint. Negative values are sign-extended to 64
    /// bits and emit the full 10-byte form, matching the reference wire
    /// format.
    pub fn int32(&mut self, value: i32) -> &mut Self {
        self.uint64(i64::from(value) as u64)
    }

    /// Write a zigzag-encoded signed 32-bit varint.
    pub fn sint32(&mut self, value: i32) -> &mut Self {
        self.uint32(zigzag32(value))
    }

    /// Write an unsigned 64-bit varint (1-10 bytes).
    pub fn uint64(&mut self, value: u64) -> &mut Self {
        self.push(size64(value), OpKind::Varint(value))
    }

    /// Write a signed 64-bit varint.
    pub fn int64(&mut self, value: i64) -> &mut Self {
        self.uint64(value as u64)
    }

    /// Write a zigzag-encoded signed 64-bit varint.
    pub fn sint64(&mut self, value: i64) -> &mut Self {
        self.uint64(zigzag64(value))
    }

    /// Write a boolean as a one-byte varint.
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.uint64(u64::from(value))
    }

    /// Write 4 raw little-endian bytes.
    pub fn fixed32(&mut self, value: u32) -> &mut Self {
        self.push(4, OpKind::Fixed32(value))
    }

    /// Write 4 raw little-endian bytes from a signed value.
    pub fn sfixed32(&mut self, value: i32) -> &mut Self {
        self.fixed32(value as u32)
    }

    /// Write 8 raw little-endian bytes.
    pub fn fixed64(&mut self, value: u64) -> &mut Self {
        self.push(8, OpKind::Fixed64(value))
    }

    /// Write 8 raw little-endian bytes from a signed value.
    pub fn sfixed64(&mut self, value: i64) -> &mut Self {
        self.fixed64(value as u64)
    }

    /// Write an IEEE-754 single-precision value. NaN inputs are canonicalized
    /// to the quiet-NaN bit pattern.
    pub fn float(&mut self, value: f32) -> &mut Self {
        let bits = if value.is_nan() {
            CANONICAL_NAN_32
        } else {
            value.to_bits()
        };
        self.fixed32(bits)
    }

    /// Write an IEEE-754 double-precision value. NaN inputs are canonicalized
    /// to the quiet-NaN bit pattern.
    pub fn double(&mut self, value: f64) -> &mut Self {
        let bits = if value.is_nan() {
            CANONICAL_NAN_64
        } else {
            value.to_bits()
        };
        self.fixed64(bits)
    }

    /// Write a length-prefixed byte payload.
    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.uint32(value.len() as u32);
        if value.is_empty() {
            return self;
        }
        self.push(value.len(), OpKind::Raw(Bytes::copy_from_slice(value)))
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn string(&mut self, value: &str) -> &mut Self {
        self.bytes(value.as_bytes())
    }

    /// Save the current framing state and start a fresh segment. Paired with
    /// either [`Writer::ldelim`] or [`Writer::reset`].
    pub fn fork(&mut self) -> &mut Self {
        self.states.push(State {
            op_index: self.ops.len(),
            len: self.len,
        });
        self
    }

    /// Discard everything written since the matching `fork`. With no saved
    /// state, discards the entire writer content.
    pub fn reset(&mut self) -> &mut Self {
        match self.states.pop() {
            Some(state) => {
                self.ops.truncate(state.op_index);
                self.len = state.len;
            }
            None => {
                self.ops.clear();
                self.len = 0;
            }
        }
        self
    }

    /// Close the segment opened by the matching `fork`: splice its byte
    /// length as a varint in front of the segment's operations. This is how
    /// length-delimited sub-messages are framed without a separate size pass.
    pub fn ldelim(&mut self) -> &mut Self {
        let state = match self.states.pop() {
            Some(state) => state,
            None => State { op_index: 0, len: 0 },
        };
        let segment_len = (self.len - state.len) as u64;
        let prefix = Op {
            len: size64(segment_len),
            kind: OpKind::Varint(segment_len),
        };
        self.len += prefix.len;
        self.ops.insert(state.op_index, prefix);
        self
    }

    /// Materialize all pending operations into `out`, appending exactly
    /// [`Writer::len`] bytes.
    pub fn finish_into(self, out: &mut Vec<u8>) {
        out.reserve(self.len);
        for op in self.ops {
            match op.kind {
                OpKind::Varint(value) => write64(value, out),
                OpKind::Fixed32(value) => out.extend_from_slice(&value.to_le_bytes()),
                OpKind::Fixed64(value) => out.extend_from_slice(&value.to_le_bytes()),
                OpKind::Raw(raw) => out.extend_from_slice(&raw),
            }
        }
    }

    /// Materialize all pending operations into one exactly-sized buffer.
    pub fn finish(self) -> Bytes {
        let mut out = Vec::with_capacity(self.len);
        self.finish_into(&mut out);
        Bytes::from(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint32_canonical_lengths() {
        for (value, expected) in [(0u32, 1usize), (127, 1), (128, 2), (16_384, 3)] {
            let mut w = Writer::new();
            w.uint32(value);
            assert_eq!(w.len(), expected, "value {value}");
            assert_eq!(w.finish().len(), expected);
        }
    }

    #[test]
    fn test_negative_int32_is_ten_bytes() {
        let mut w = Writer::new();
        w.int32(-1);
        let out = w.finish();
        assert_eq!(out.len(), 10);
        assert_eq!(
            &out[..],
            &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
        );
    }

    #[test]
    fn test_fixed_little_endian() {
        let mut w = Writer::new();
        w.fixed32(0x0102_0304);
        assert_eq!(&w.finish()[..], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_fork_ldelim_splices_length() {
        let mut w = Writer::new();
        w.uint32(0x0a); // outer tag
        w.fork();
        w.uint32(0x08).uint32(5); // inner content: 2 bytes
        w.ldelim();
        assert_eq!(&w.finish()[..], &[0x0a, 0x02, 0x08, 0x05]);
    }

    #[test]
    fn test_fork_reset_discards_segment() {
        let mut w = Writer::new();
        w.uint32(1);
        w.fork();
        w.string("discarded");
        w.reset();
        w.uint32(2);
        assert_eq!(&w.finish()[..], &[0x01, 0x02]);
    }

    #[test]
    fn test_nested_forks() {
        let mut w = Writer::new();
        w.fork();
        w.fork();
        w.uint32(7);
        w.ldelim(); // inner: 01 07
        w.ldelim(); // outer: 02 01 07
        assert_eq!(&w.finish()[..], &[0x02, 0x01, 0x07]);
    }

    #[test]
    fn test_string_length_prefix() {
        let mut w = Writer::new();
        w.string("ab");
        assert_eq!(&w.finish()[..], &[0x02, b'a', b'b']);
    }

    #[test]
    fn test_finish_len_is_exact() {
        let mut w = Writer::new();
        w.uint32(300).string("hello").double(1.5);
        let expected = w.len();
        assert_eq!(w.finish().len(), expected);
    }

    #[test]
    fn test_nan_canonicalized() {
        let mut w = Writer::new();
        w.float(f32::NAN);
        assert_eq!(&w.finish()[..], &CANONICAL_NAN_32.to_le_bytes());
    }
}
