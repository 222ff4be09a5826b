//! In-place operations on TLV byte images
//!
//! These helpers edit and search TLV structures directly in a byte
//! buffer, without handing a tree back to the caller: parse, modify,
//! re-emit at the same offset. They are the buffer-level counterparts of
//! the [`Tlv`](crate::Tlv) node operations, for callers that keep APDU
//! payloads in flat buffers.

use tracing::debug;

use crate::error::{Error, Result};
use crate::length;
use crate::tag::{self, Tag};
use crate::tlv::Tlv;
use crate::util;

fn remaining(buf: &[u8], off: usize) -> Result<usize> {
    buf.len().checked_sub(off).ok_or(Error::OutOfBounds {
        offset: off,
        len: buf.len(),
    })
}

/// Offset of the value field of the primitive TLV at `off`:
/// `off + tag size + length-field width`. `MalformedTlv` for a
/// constructed TLV.
pub fn value_offset(buf: &[u8], off: usize) -> Result<usize> {
    if tag::is_constructed_at(buf, off)? {
        return Err(Error::MalformedTlv);
    }
    let tag_len = tag::size_at(buf, off)?;
    let len_len = length::size_at(buf, off + tag_len)?;
    Ok(off + tag_len + len_len)
}

/// Copy the tag octets of the TLV at `tlv_off` into `out` at `out_off`;
/// returns the tag size.
pub fn copy_tag(buf: &[u8], tlv_off: usize, out: &mut [u8], out_off: usize) -> Result<usize> {
    let tag_len = tag::size_at(buf, tlv_off)?;
    util::copy_into(&buf[tlv_off..tlv_off + tag_len], out, out_off)
}

/// Parse one TLV from `input` at `in_off` and append it to the
/// constructed TLV at `out[out_off..]`, re-emitting the container in
/// place. Returns the new container size.
///
/// `MalformedTlv` when the container tag is primitive; `OutOfBounds`
/// when the grown container no longer fits in `out`.
pub fn append(input: &[u8], in_off: usize, out: &mut [u8], out_off: usize) -> Result<usize> {
    let in_len = remaining(input, in_off)?;
    let out_len = remaining(out, out_off)?;
    let child = Tlv::parse(input, in_off, in_len)?;
    let mut container = Tlv::parse(out, out_off, out_len)?;
    if !container.is_constructed() {
        return Err(Error::MalformedTlv);
    }
    container.append(child)?;
    debug!(offset = out_off, size = container.size().ok(), "rewriting container in place");
    container.to_bytes(out, out_off)
}

/// Append `value` to the primitive TLV at `tlv_off`, re-emitting it in
/// place. Returns the new TLV size.
///
/// `MalformedTlv` when the TLV is constructed; `OutOfBounds` when the
/// grown TLV no longer fits in `buf`.
pub fn append_value(buf: &mut [u8], tlv_off: usize, value: &[u8]) -> Result<usize> {
    let avail = remaining(buf, tlv_off)?;
    let mut tlv = Tlv::parse(buf, tlv_off, avail)?;
    if tlv.is_constructed() {
        return Err(Error::MalformedTlv);
    }
    tlv.append_value(value)?;
    tlv.to_bytes(buf, tlv_off)
}

/// Compose a primitive TLV at `off` from a pre-encoded tag image and a
/// value; returns the number of bytes written.
///
/// `MalformedTag` when the tag image has its constructed bit set.
pub fn write_primitive(
    tag_image: &[u8],
    value: &[u8],
    out: &mut [u8],
    off: usize,
) -> Result<usize> {
    let tag = Tag::parse(tag_image, 0)?;
    if tag.is_constructed() {
        return Err(Error::MalformedTag);
    }
    let mut pos = off;
    pos += tag.write_into(out, pos)?;
    pos += length::write_into(value.len(), out, pos)?;
    pos += util::copy_into(value, out, pos)?;
    Ok(pos - off)
}

/// Absolute offset of the first child of the constructed TLV at
/// `tlv_off` whose tag octets equal `tag_image` (any child when `None`),
/// or `None` when there is no match.
pub fn find(buf: &[u8], tlv_off: usize, tag_image: Option<&[u8]>) -> Result<Option<usize>> {
    find_next(buf, tlv_off, 0, tag_image)
}

/// Like [`find`], resuming the scan at `start_off` (relative to
/// `tlv_off`): children that begin before it are skipped, so `0` starts
/// at the first child. End-of-content filler octets at child boundaries
/// are skipped.
///
/// `MalformedTlv` when the TLV at `tlv_off` is primitive.
pub fn find_next(
    buf: &[u8],
    tlv_off: usize,
    start_off: usize,
    tag_image: Option<&[u8]>,
) -> Result<Option<usize>> {
    let target = match tag_image {
        Some(raw) => Some(Tag::parse(raw, 0)?),
        None => None,
    };
    if !tag::is_constructed_at(buf, tlv_off)? {
        return Err(Error::MalformedTlv);
    }
    let tag_len = tag::size_at(buf, tlv_off)?;
    let data_len = length::read_at(buf, tlv_off + tag_len)?;
    let len_len = length::size_at(buf, tlv_off + tag_len)?;
    util::check_range(buf.len(), tlv_off, tag_len + len_len + data_len)?;

    let resume = tlv_off + start_off;
    let body = tlv_off + tag_len + len_len;
    let end = body + data_len;
    let mut pos = body;
    while pos < end {
        if tag::is_eoc(buf[pos]) {
            pos += 1;
            continue;
        }
        let child = Tlv::parse(buf, pos, end - pos)?;
        if pos >= resume {
            let matched = match &target {
                None => true,
                Some(wanted) => child.tag().is_ok_and(|t| t == wanted),
            };
            if matched {
                return Ok(Some(pos));
            }
        }
        pos += child.size()?;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const PPSE: [u8; 37] =
        hex!("6F23840E325041592E5359532E4444463031A511BF0C0E610C4F07A0000000031010870101");

    #[test]
    fn append_value_in_place() {
        let mut buf = hex!("C801000000000000000000");
        let size = append_value(&mut buf, 0, &hex!("12345678")).unwrap();
        assert_eq!(size, 7);
        assert_eq!(buf[..7], hex!("C8050012345678"));
    }

    #[test]
    fn append_value_rejects_constructed() {
        let mut buf = hex!("6F038401AA0000");
        assert_eq!(append_value(&mut buf, 0, &hex!("11")), Err(Error::MalformedTlv));
    }

    #[test]
    fn append_child_in_place() {
        let mut out = [0u8; 16];
        out[..2].copy_from_slice(&hex!("E100"));
        let size = append(&hex!("4F03AABBCC"), 0, &mut out, 0).unwrap();
        assert_eq!(size, 7);
        assert_eq!(out[..7], hex!("E1054F03AABBCC"));

        // append once more behind the first child
        let size = append(&hex!("870101"), 0, &mut out, 0).unwrap();
        assert_eq!(size, 10);
        assert_eq!(out[..10], hex!("E1084F03AABBCC870101"));
    }

    #[test]
    fn append_into_primitive_container_is_malformed() {
        let mut out = [0u8; 8];
        out[..3].copy_from_slice(&hex!("C80100"));
        assert_eq!(
            append(&hex!("4F00"), 0, &mut out, 0),
            Err(Error::MalformedTlv)
        );
    }

    #[test]
    fn find_returns_absolute_offsets() {
        assert_eq!(find(&PPSE, 0, Some(&hex!("84"))).unwrap(), Some(2));
        assert_eq!(find(&PPSE, 0, Some(&hex!("A5"))).unwrap(), Some(18));
        assert_eq!(find(&PPSE, 0, None).unwrap(), Some(2));
        // only the top level is scanned
        assert_eq!(find(&PPSE, 0, Some(&hex!("BF0C"))).unwrap(), None);
        // and the nested container has its own children
        assert_eq!(find(&PPSE, 18, Some(&hex!("BF0C"))).unwrap(), Some(20));
    }

    #[test]
    fn find_next_resumes_after_start_offset() {
        let buf = hex!("61064F01AA4F01BB");
        let first = find(&buf, 0, Some(&hex!("4F"))).unwrap().unwrap();
        assert_eq!(first, 2);
        let next = find_next(&buf, 0, first + 3, Some(&hex!("4F"))).unwrap();
        assert_eq!(next, Some(5));
        assert_eq!(find_next(&buf, 0, 5 + 3, Some(&hex!("4F"))).unwrap(), None);
    }

    #[test]
    fn find_skips_eoc_between_children() {
        let buf = hex!("6109004F01AA00004F01BB");
        assert_eq!(find(&buf, 0, Some(&hex!("4F"))).unwrap(), Some(3));
        assert_eq!(find_next(&buf, 0, 6, Some(&hex!("4F"))).unwrap(), Some(8));
    }

    #[test]
    fn find_on_primitive_is_malformed() {
        assert_eq!(
            find(&hex!("810100"), 0, Some(&hex!("84"))),
            Err(Error::MalformedTlv)
        );
    }

    #[test]
    fn write_primitive_from_tag_image() {
        let mut out = [0u8; 16];
        let written = write_primitive(&hex!("9F37"), &hex!("DEADBEEF"), &mut out, 1).unwrap();
        assert_eq!(written, 7);
        assert_eq!(out[1..8], hex!("9F3704DEADBEEF"));
        assert_eq!(
            write_primitive(&hex!("6F"), &[], &mut out, 0),
            Err(Error::MalformedTag)
        );
    }

    #[test]
    fn value_offset_skips_header() {
        assert_eq!(value_offset(&hex!("9F3803112233"), 0).unwrap(), 3);
        assert_eq!(value_offset(&hex!("C88180"), 0).unwrap(), 3);
        assert_eq!(value_offset(&PPSE, 0), Err(Error::MalformedTlv));
    }

    #[test]
    fn copy_tag_extracts_identifier_octets() {
        let mut out = [0u8; 4];
        assert_eq!(copy_tag(&hex!("9F3803112233"), 0, &mut out, 0).unwrap(), 2);
        assert_eq!(out[..2], hex!("9F38"));
    }
}
