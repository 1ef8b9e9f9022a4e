//! Header compression seam.
//!
//! The frame codec never looks inside a QPACK field section; it hands
//! HEADERS and PUSH_PROMISE field lists to a [`HeaderCompressor`] and the
//! received blocks to a [`HeaderDecompressor`]. [`LiteralQpack`] is a
//! stateless implementation of both that uses neither the static nor the
//! dynamic table.

use crate::error::QpackError;
use crate::protocol::frame::{FieldSection, HeaderField};
use bytes::{BufMut, Bytes, BytesMut};

/// Turns a field list into an encoded field section.
pub trait HeaderCompressor {
    fn compress(&mut self, fields: &FieldSection, dst: &mut BytesMut) -> Result<(), QpackError>;
}

/// Turns an encoded field section back into a field list.
///
/// `decompress(compress(fields))` must yield `fields`, in order and with
/// duplicate names preserved.
pub trait HeaderDecompressor {
    fn decompress(&mut self, block: Bytes) -> Result<FieldSection, QpackError>;
}

impl<T: HeaderCompressor + ?Sized> HeaderCompressor for &mut T {
    fn compress(&mut self, fields: &FieldSection, dst: &mut BytesMut) -> Result<(), QpackError> {
        (**self).compress(fields, dst)
    }
}

impl<T: HeaderDecompressor + ?Sized> HeaderDecompressor for &mut T {
    fn decompress(&mut self, block: Bytes) -> Result<FieldSection, QpackError> {
        (**self).decompress(block)
    }
}

// Literal field line with literal name: 001N H NameLen(3+) (RFC 9204 §4.5.6).
const LITERAL_WITH_LITERAL_NAME: u8 = 0x20;
const LITERAL_WITH_LITERAL_NAME_MASK: u8 = 0xe0;
const NAME_HUFFMAN: u8 = 0x08;
const VALUE_HUFFMAN: u8 = 0x80;

/// QPACK without tables or Huffman coding.
///
/// Every field is emitted as a literal field line with a literal name and the
/// section prefix is always Required Insert Count 0, Base 0. Such sections are
/// valid for any QPACK decoder. Decoding accepts only that subset; any
/// indexed or Huffman-coded representation is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralQpack;

impl LiteralQpack {
    pub fn new() -> Self {
        Self
    }
}

impl HeaderCompressor for LiteralQpack {
    fn compress(&mut self, fields: &FieldSection, dst: &mut BytesMut) -> Result<(), QpackError> {
        // Required Insert Count = 0, then Sign = 0 / Delta Base = 0.
        dst.put_u8(0x00);
        dst.put_u8(0x00);

        for field in fields {
            encode_integer(field.name.len() as u64, 3, LITERAL_WITH_LITERAL_NAME, dst);
            dst.put_slice(&field.name);
            encode_integer(field.value.len() as u64, 7, 0x00, dst);
            dst.put_slice(&field.value);
        }
        Ok(())
    }
}

impl HeaderDecompressor for LiteralQpack {
    fn decompress(&mut self, block: Bytes) -> Result<FieldSection, QpackError> {
        let mut pos = 0;

        let (required_insert_count, used) = decode_integer(&block[pos..], 8)?;
        pos += used;
        if required_insert_count != 0 {
            return Err(QpackError::DynamicTableReference(required_insert_count));
        }
        let (_delta_base, used) = decode_integer(&block[pos..], 7)?;
        pos += used;

        let mut fields = Vec::new();
        while pos < block.len() {
            let first = block[pos];
            if first & LITERAL_WITH_LITERAL_NAME_MASK != LITERAL_WITH_LITERAL_NAME
                || first & NAME_HUFFMAN != 0
            {
                return Err(QpackError::UnsupportedRepresentation(first));
            }

            let (name_len, used) = decode_integer(&block[pos..], 3)?;
            pos += used;
            let name = take(&block, &mut pos, name_len)?;

            let Some(&value_first) = block.get(pos) else {
                return Err(QpackError::Truncated);
            };
            if value_first & VALUE_HUFFMAN != 0 {
                return Err(QpackError::UnsupportedRepresentation(value_first));
            }
            let (value_len, used) = decode_integer(&block[pos..], 7)?;
            pos += used;
            let value = take(&block, &mut pos, value_len)?;

            fields.push(HeaderField { name, value });
        }

        Ok(FieldSection::from(fields))
    }
}

/// Slice `len` bytes out of `block` at `pos` without copying.
fn take(block: &Bytes, pos: &mut usize, len: u64) -> Result<Bytes, QpackError> {
    let remaining = (block.len() - *pos) as u64;
    if len > remaining {
        return Err(QpackError::Truncated);
    }
    let end = *pos + len as usize;
    let slice = block.slice(*pos..end);
    *pos = end;
    Ok(slice)
}

/// Prefixed integer encoding (RFC 7541 §5.1), `prefix_bits` in 1..=8.
///
/// `first_byte_mask` carries the bits above the prefix.
fn encode_integer(value: u64, prefix_bits: u8, first_byte_mask: u8, dst: &mut BytesMut) {
    let max_prefix = (1u64 << prefix_bits) - 1;
    if value < max_prefix {
        dst.put_u8(first_byte_mask | value as u8);
        return;
    }

    dst.put_u8(first_byte_mask | max_prefix as u8);
    let mut remaining = value - max_prefix;
    while remaining >= 0x80 {
        dst.put_u8(0x80 | (remaining & 0x7f) as u8);
        remaining >>= 7;
    }
    dst.put_u8(remaining as u8);
}

/// Returns `(value, bytes_consumed)`.
fn decode_integer(buf: &[u8], prefix_bits: u8) -> Result<(u64, usize), QpackError> {
    let Some(&first) = buf.first() else {
        return Err(QpackError::Truncated);
    };

    let max_prefix = (1u64 << prefix_bits) - 1;
    let mut value = u64::from(first) & max_prefix;
    if value < max_prefix {
        return Ok((value, 1));
    }

    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate().skip(1) {
        if shift > 56 {
            return Err(QpackError::IntegerOverflow);
        }
        value = value
            .checked_add(u64::from(byte & 0x7f) << shift)
            .ok_or(QpackError::IntegerOverflow)?;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }
    Err(QpackError::Truncated)
}
