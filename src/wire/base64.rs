//! Base64 codec for bytes-field interchange.
//!
//! Strict by design: decode rejects any character outside the 64-symbol
//! alphabet with [`CodecError::InvalidEncoding`]. Trailing `=` padding is
//! tolerated once at least two symbols of the final quantum have been
//! consumed.

use crate::error::{CodecError, Result};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const fn build_reverse() -> [i8; 256] {
    let mut table = [-1i8; 256];
    let mut i = 0;
    while i < 64 {
        table[ALPHABET[i] as usize] = i as i8;
        i += 1;
    }
    table
}

const REVERSE: [i8; 256] = build_reverse();

/// Encoded length of `len` raw bytes, padding included.
pub const fn encoded_len(len: usize) -> usize {
    (len + 2) / 3 * 4
}

/// Encode bytes to a padded base64 string.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(encoded_len(data.len()));
    let mut chunks = data.chunks_exact(3);
    for chunk in &mut chunks {
        let n = (u32::from(chunk[0]) << 16) | (u32::from(chunk[1]) << 8) | u32::from(chunk[2]);
        out.push(ALPHABET[(n >> 18) as usize & 63] as char);
        out.push(ALPHABET[(n >> 12) as usize & 63] as char);
        out.push(ALPHABET[(n >> 6) as usize & 63] as char);
        out.push(ALPHABET[n as usize & 63] as char);
    }
    match chunks.remainder() {
        [a] => {
            let n = u32::from(*a) << 16;
            out.push(ALPHABET[(n >> 18) as usize & 63] as char);
            out.push(ALPHABET[(n >> 12) as usize & 63] as char);
            out.push('=');
            out.push('=');
        }
        [a, b] => {
            let n = (u32::from(*a) << 16) | (u32::from(*b) << 8);
            out.push(ALPHABET[(n >> 18) as usize & 63] as char);
            out.push(ALPHABET[(n >> 12) as usize & 63] as char);
            out.push(ALPHABET[(n >> 6) as usize & 63] as char);
            out.push('=');
        }
        _ => {}
    }
    out
}

/// Decode a base64 string.
///
/// Fails with [`CodecError::InvalidEncoding`] on any character outside the
/// alphabet, on a lone symbol in the final quantum, or on padding placed
/// before two symbols of a quantum were seen.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / 4 * 3);
    let mut i = 0;

    while i < bytes.len() {
        let mut sym = [0u8; 4];
        let mut n = 0;
        while n < 4 && i < bytes.len() {
            let c = bytes[i];
            if c == b'=' {
                break;
            }
            let v = REVERSE[c as usize];
            if v < 0 {
                return Err(CodecError::InvalidEncoding);
            }
            sym[n] = v as u8;
            n += 1;
            i += 1;
        }

        if n == 4 {
            out.push((sym[0] << 2) | (sym[1] >> 4));
            out.push((sym[1] << 4) | (sym[2] >> 2));
            out.push((sym[2] << 6) | sym[3]);
            continue;
        }

        // Partial final quantum: fewer than two symbols cannot carry a byte.
        match n {
            0 => {
                if i < bytes.len() {
                    return Err(CodecError::InvalidEncoding);
                }
            }
            1 => return Err(CodecError::InvalidEncoding),
            2 => out.push((sym[0] << 2) | (sym[1] >> 4)),
            _ => {
                out.push((sym[0] << 2) | (sym[1] >> 4));
                out.push((sym[1] << 4) | (sym[2] >> 2));
            }
        }

        while i < bytes.len() && bytes[i] == b'=' {
            i += 1;
        }
        if i < bytes.len() {
            return Err(CodecError::InvalidEncoding);
        }
        break;
    }

    Ok(out)
}
