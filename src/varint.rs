//! Unsigned LEB128 varints, used to delimit units inside a compact sequence.

use thiserror::Error;

const CONTINUATION_BIT_MASK: u8 = 0x80;
const DATA_BITS_MASK: u8 = 0x7f;
const DATA_BITS_PER_BYTE: u32 = 7;
/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VarintError {
    #[error("varint truncated")]
    EndOfBuffer,

    #[error("varint overflows u64")]
    Overflow,
}

/// Appends `value` to `buf`.
pub fn write(value: u64, buf: &mut Vec<u8>) {
    let mut val = value;
    while val >= u64::from(CONTINUATION_BIT_MASK) {
        buf.push((val as u8 & DATA_BITS_MASK) | CONTINUATION_BIT_MASK);
        val >>= DATA_BITS_PER_BYTE;
    }
    buf.push(val as u8);
}

/// Reads a varint from the front of `buf`, returning the value and the number of bytes consumed.
pub fn read(buf: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (i, byte) in buf.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && *byte > 1 {
            return Err(VarintError::Overflow);
        }
        result |= u64::from(byte & DATA_BITS_MASK) << shift;
        if byte & CONTINUATION_BIT_MASK == 0 {
            return Ok((result, i + 1));
        }
        shift += DATA_BITS_PER_BYTE;
    }
    Err(VarintError::EndOfBuffer)
}

/// Number of bytes needed to encode `value`.
pub fn size(value: u64) -> usize {
    let data_bits = (u64::BITS - value.leading_zeros()) as usize;
    usize::max(1, data_bits.div_ceil(DATA_BITS_PER_BYTE as usize))
}
