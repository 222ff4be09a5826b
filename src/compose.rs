//! Packed-tag composition helpers
//!
//! Request payloads in card tooling are usually keyed by the 2-byte
//! packed tag form: the raw tag octets left-justified in a big-endian
//! `u16`, high byte zero for single-octet tags (`0x0084` for `84`,
//! `0x9F38` for `9F 38`). These helpers build tags and whole TLVs
//! straight from that form.

use crate::error::Result;
use crate::tag::Tag;
use crate::tlv::Tlv;

/// Write the tag octets for `packed` into `out` at `off`; returns the
/// tag size (1 or 2).
pub fn make_tag(packed: u16, out: &mut [u8], off: usize) -> Result<usize> {
    Tag::from_packed(packed)?.write_into(out, off)
}

/// Encoded width of a packed tag: 2 when the high byte is set, else 1.
pub fn packed_tag_size(packed: u16) -> usize {
    if packed & 0xFF00 != 0 {
        2
    } else {
        1
    }
}

/// Compose a TLV for `packed` and `value` into `out` at `off`; returns
/// the number of bytes written.
///
/// A primitive packed tag takes `value` as its content octets; a
/// constructed one takes it as a pre-encoded body of inner TLVs.
pub fn make_tlv(packed: u16, value: &[u8], out: &mut [u8], off: usize) -> Result<usize> {
    node_for(packed, value)?.to_bytes(out, off)
}

/// Compose a TLV for `packed` and `value` into a fresh buffer.
pub fn make_tlv_vec(packed: u16, value: &[u8]) -> Result<Vec<u8>> {
    node_for(packed, value)?.to_vec()
}

/// Compose a zero-length TLV for `packed`, the leaf form used when
/// building template skeletons.
pub fn make_empty_tlv(packed: u16) -> Result<Vec<u8>> {
    make_tlv_vec(packed, &[])
}

/// Byte concatenation of two TLV images.
pub fn concat_tlv(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

fn node_for(packed: u16, value: &[u8]) -> Result<Tlv> {
    let tag = Tag::from_packed(packed)?;
    if tag.is_constructed() {
        let mut node = Tlv::constructed(0);
        node.init_constructed(tag, value)?;
        Ok(node)
    } else {
        let mut node = Tlv::primitive(value.len());
        node.init_primitive(tag, value)?;
        Ok(node)
    }
}
