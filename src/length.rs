//! Definite-form length codec
//!
//! Lengths up to 127 occupy a single octet. Longer values use a prefix
//! octet `0x81`/`0x82`/`0x83` announcing one, two or three value octets.
//! The indefinite form (`0x80`) is not supported and reads as an
//! over-limit length, as does any two-octet value with the top bit set.

use crate::error::{Error, Result};
use crate::util;

/// Maximum value length supported by the node model.
pub const MAX_LENGTH: usize = 32767;

/// Decode the length value at `off`.
pub fn read_at(buf: &[u8], off: usize) -> Result<usize> {
    let first = util::byte_at(buf, off)?;
    if first & 0x80 == 0 {
        Ok((first & 0x7F) as usize)
    } else if first == 0x81 {
        Ok(util::byte_at(buf, off + 1)? as usize)
    } else if first == 0x82 {
        let value = util::read_u16_at(buf, off + 1)?;
        if value & 0x8000 != 0 {
            return Err(Error::TlvLengthGreaterThan32767);
        }
        Ok(value as usize)
    } else {
        Err(Error::TlvLengthGreaterThan32767)
    }
}

/// Width in octets of the length field at `off`, read from its first
/// octet without decoding the value.
pub fn size_at(buf: &[u8], off: usize) -> Result<usize> {
    let first = util::byte_at(buf, off)?;
    if first & 0x80 == 0 {
        Ok(1)
    } else {
        Ok(1 + (first & 0x7F) as usize)
    }
}

/// Width in octets of the length field that encodes a value length of
/// `len`.
pub fn of_value(len: usize) -> usize {
    if len < 128 {
        1
    } else if len < 256 {
        2
    } else if len < 65536 {
        3
    } else {
        4
    }
}

/// Encode `len` into `out` at `off`; returns the encoded width.
///
/// Lengths up to 24 bits are emitted (the `0x83` form for 65536 and
/// above), even though the node model rejects lengths over
/// [`MAX_LENGTH`] in its size queries.
pub fn write_into(len: usize, out: &mut [u8], off: usize) -> Result<usize> {
    if len > 0xFF_FFFF {
        return Err(Error::IllegalSize);
    }
    let width = of_value(len);
    util::check_range(out.len(), off, width)?;
    match width {
        1 => out[off] = len as u8,
        2 => {
            out[off] = 0x81;
            out[off + 1] = len as u8;
        }
        3 => {
            out[off] = 0x82;
            out[off + 1] = (len >> 8) as u8;
            out[off + 2] = len as u8;
        }
        _ => {
            out[off] = 0x83;
            out[off + 1] = (len >> 16) as u8;
            out[off + 2] = (len >> 8) as u8;
            out[off + 3] = len as u8;
        }
    }
    Ok(width)
}
