//! QUIC variable-length integers (RFC 9000 §16).
//!
//! | 2MSB | Length  | Range                     |
//! |------|---------|---------------------------|
//! | 00   | 1 byte  | 0..=63                    |
//! | 01   | 2 bytes | 0..=16383                 |
//! | 10   | 4 bytes | 0..=1073741823            |
//! | 11   | 8 bytes | 0..=4611686018427387903   |
//!
//! Every type and length field of an HTTP/3 frame uses this encoding.

use crate::error::VarIntError;
use bytes::{Buf, BufMut};

/// Largest value representable as a varint (2^62 - 1).
pub const MAX_VARINT: u64 = (1 << 62) - 1;

/// Number of bytes the minimal encoding of `value` occupies.
pub const fn varint_size(value: u64) -> usize {
    if value < 1 << 6 {
        1
    } else if value < 1 << 14 {
        2
    } else if value < 1 << 30 {
        4
    } else {
        8
    }
}

/// Width of a varint, read from the tag bits of its first byte.
pub const fn varint_width(first_byte: u8) -> usize {
    1 << (first_byte >> 6)
}

/// Write the minimal-width encoding of `value` into `buf`.
///
/// Returns the number of bytes written. Nothing is written when the value is
/// out of range.
pub fn encode_varint<B: BufMut>(value: u64, buf: &mut B) -> Result<usize, VarIntError> {
    if value > MAX_VARINT {
        return Err(VarIntError::ValueOutOfRange(value));
    }

    let size = varint_size(value);
    match size {
        1 => buf.put_u8(value as u8),
        2 => buf.put_u16(0x4000 | value as u16),
        4 => buf.put_u32(0x8000_0000 | value as u32),
        _ => buf.put_u64(0xc000_0000_0000_0000 | value),
    }
    Ok(size)
}

/// Decode a varint from the front of `buf` without consuming it.
///
/// Returns `(value, bytes_consumed)`. Non-minimal encodings are accepted.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), VarIntError> {
    let Some(&first) = buf.first() else {
        return Err(VarIntError::InsufficientData { needed: 1 });
    };

    let width = varint_width(first);
    if buf.len() < width {
        return Err(VarIntError::InsufficientData { needed: width });
    }

    let value = buf[1..width]
        .iter()
        .fold(u64::from(first & 0x3f), |acc, &b| (acc << 8) | u64::from(b));
    Ok((value, width))
}

/// Read a varint from `buf`, advancing past it.
///
/// On [`VarIntError::InsufficientData`] the buffer is left untouched.
pub fn read_varint<B: Buf>(buf: &mut B) -> Result<u64, VarIntError> {
    let chunk = buf.chunk();
    let Some(&first) = chunk.first() else {
        return Err(VarIntError::InsufficientData { needed: 1 });
    };

    let width = varint_width(first);
    if buf.remaining() < width {
        return Err(VarIntError::InsufficientData { needed: width });
    }

    let value = match width {
        1 => u64::from(buf.get_u8()),
        2 => u64::from(buf.get_u16() & 0x3fff),
        4 => u64::from(buf.get_u32() & 0x3fff_ffff),
        _ => buf.get_u64() & MAX_VARINT,
    };
    Ok(value)
}
