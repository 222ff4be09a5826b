//! TLV node model and parser
//!
//! A [`Tlv`] is either primitive (the value field is opaque content
//! octets) or constructed (the value field is an ordered list of inner
//! TLVs). Which one is decided by the constructed bit of the tag, and the
//! two variants never convert into each other: operations that belong to
//! the other variant fail with `MalformedTlv`.
//!
//! Nodes can be built empty and filled later, parsed from a wire image,
//! mutated in place, and serialized back byte-exactly. A freshly parsed
//! tree always re-encodes to the bytes it was parsed from.

use std::fmt;
use std::fmt::Write as _;

use bytes::BytesMut;

use crate::error::{Error, Result};
use crate::length;
use crate::list::TlvList;
use crate::tag::{self, Tag};
use crate::util;

/// Maximum encoded size of a single TLV supported by the node model.
pub const MAX_TLV_SIZE: usize = 32767;

/// Content-octet buffer of a primitive node.
///
/// Grows on demand unless the node was created with a fixed capacity, in
/// which case any growth past it fails with `InsufficientStorage` and
/// leaves the buffer untouched.
#[derive(Debug, Clone)]
pub struct ValueBuf {
    data: BytesMut,
    limit: usize,
    expand: bool,
}

impl ValueBuf {
    fn with_capacity(capacity: usize, expand: bool) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            limit: capacity,
            expand,
        }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if !self.expand && needed > self.limit {
            return Err(Error::InsufficientStorage);
        }
        Ok(())
    }

    /// The content octets.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of content octets.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when there are no content octets.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::ops::Deref for ValueBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl PartialEq for ValueBuf {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for ValueBuf {}

/// Value field of a TLV node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Opaque content octets.
    Primitive(ValueBuf),
    /// Concatenation of inner TLVs.
    Constructed(TlvList),
}

/// A BER TLV node. Equality compares the tag and the value field, not
/// capacity bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Option<Tag>,
    value: Value,
}

impl Tlv {
    /// Empty primitive node with room for `capacity` value bytes, growing
    /// as needed.
    pub fn primitive(capacity: usize) -> Self {
        Self {
            tag: None,
            value: Value::Primitive(ValueBuf::with_capacity(capacity, true)),
        }
    }

    /// Empty primitive node whose value may never exceed `capacity` bytes.
    pub fn primitive_fixed(capacity: usize) -> Self {
        Self {
            tag: None,
            value: Value::Primitive(ValueBuf::with_capacity(capacity, false)),
        }
    }

    /// Empty constructed node with room for `capacity` children, growing
    /// as needed.
    pub fn constructed(capacity: usize) -> Self {
        Self {
            tag: None,
            value: Value::Constructed(TlvList::with_capacity(capacity)),
        }
    }

    /// Empty constructed node that may never hold more than `capacity`
    /// children.
    pub fn constructed_fixed(capacity: usize) -> Self {
        Self {
            tag: None,
            value: Value::Constructed(TlvList::fixed_capacity(capacity)),
        }
    }

    /// Recognize one TLV at `off`, reading at most `len` bytes.
    ///
    /// The node variant follows the constructed bit of the tag; a
    /// constructed body is parsed recursively into children, with
    /// end-of-content filler octets at child boundaries skipped. Bytes
    /// past the recognized TLV are ignored. `IllegalSize` when the
    /// declared length overruns `len`.
    pub fn parse(buf: &[u8], off: usize, len: usize) -> Result<Self> {
        util::check_range(buf.len(), off, len)?;
        let mut tlv = if tag::is_constructed_at(buf, off)? {
            Self::constructed(0)
        } else {
            let tag_len = tag::size_at(buf, off)?;
            let data_len = length::read_at(buf, off + tag_len)?;
            Self::primitive(data_len)
        };
        tlv.init(buf, off, len)?;
        Ok(tlv)
    }

    /// True when `buf` holds a well-formed TLV at `off` within `len`
    /// bytes.
    pub fn verify_format(buf: &[u8], off: usize, len: usize) -> bool {
        Self::parse(buf, off, len).is_ok()
    }

    /// (Re-)initialize this node from the wire image at `off`.
    ///
    /// The image's constructed bit must match the node variant,
    /// `MalformedTlv` otherwise. Returns the resulting encoded size.
    pub fn init(&mut self, buf: &[u8], off: usize, len: usize) -> Result<usize> {
        util::check_range(buf.len(), off, len)?;
        let t = Tag::parse(buf, off)?;
        let tag_len = t.size();
        let data_len = length::read_at(buf, off + tag_len)?;
        let len_len = length::size_at(buf, off + tag_len)?;
        if tag_len + len_len + data_len > len {
            return Err(Error::IllegalSize);
        }
        if t.is_constructed() != self.is_constructed() {
            return Err(Error::MalformedTlv);
        }
        let body = off + tag_len + len_len;
        let image = &buf[body..body + data_len];
        if self.is_constructed() {
            self.init_constructed(t, image)
        } else {
            self.init_primitive(t, image)
        }
    }

    /// (Re-)initialize a primitive node with `tag` and `value`.
    ///
    /// `MalformedTag` when the tag has its constructed bit set,
    /// `MalformedTlv` when the node is constructed. Returns the resulting
    /// encoded size.
    pub fn init_primitive(&mut self, tag: Tag, value: &[u8]) -> Result<usize> {
        if tag.is_constructed() {
            return Err(Error::MalformedTag);
        }
        let Value::Primitive(buf) = &mut self.value else {
            return Err(Error::MalformedTlv);
        };
        buf.ensure(value.len())?;
        buf.data.clear();
        buf.data.extend_from_slice(value);
        self.tag = Some(tag);
        self.size()
    }

    /// (Re-)initialize a constructed node with `tag` and a pre-encoded
    /// `body`, which is parsed into children.
    ///
    /// `MalformedTag` when the tag is primitive, `MalformedTlv` when the
    /// node is primitive. Returns the resulting encoded size.
    pub fn init_constructed(&mut self, tag: Tag, body: &[u8]) -> Result<usize> {
        if !tag.is_constructed() {
            return Err(Error::MalformedTag);
        }
        let Value::Constructed(children) = &mut self.value else {
            return Err(Error::MalformedTlv);
        };
        children.clear();
        children.init(body, 0, body.len())?;
        self.tag = Some(tag);
        self.size()
    }

    /// True once the node has been given a tag.
    pub fn is_initialized(&self) -> bool {
        self.tag.is_some()
    }

    /// The node's tag; `EmptyTlv` before initialization.
    pub fn tag(&self) -> Result<&Tag> {
        self.tag.as_ref().ok_or(Error::EmptyTlv)
    }

    /// True for the constructed variant.
    pub fn is_constructed(&self) -> bool {
        matches!(self.value, Value::Constructed(_))
    }

    /// Borrow the value field.
    pub fn content(&self) -> &Value {
        &self.value
    }

    /// Byte count of the value field; `TlvLengthGreaterThan32767` past
    /// the limit, `EmptyTlv` before initialization.
    pub fn length(&self) -> Result<usize> {
        if self.tag.is_none() {
            return Err(Error::EmptyTlv);
        }
        let len = self.data_length();
        if len > length::MAX_LENGTH {
            return Err(Error::TlvLengthGreaterThan32767);
        }
        Ok(len)
    }

    fn data_length(&self) -> usize {
        match &self.value {
            Value::Primitive(v) => v.len(),
            Value::Constructed(c) => c.data_length(),
        }
    }

    /// Encoded size: tag size + length-field width + value length.
    /// `TlvSizeGreaterThan32767` past the limit.
    pub fn size(&self) -> Result<usize> {
        let tag = self.tag()?;
        let len = self.length()?;
        let total = tag.size() + length::of_value(len) + len;
        if total > MAX_TLV_SIZE {
            return Err(Error::TlvSizeGreaterThan32767);
        }
        Ok(total)
    }

    /// Serialize the node into `out` at `off`; returns the number of
    /// bytes written.
    pub fn to_bytes(&self, out: &mut [u8], off: usize) -> Result<usize> {
        let total = self.size()?;
        util::check_range(out.len(), off, total)?;
        let tag = self.tag()?;
        let len = self.length()?;
        let mut pos = off;
        pos += tag.write_into(out, pos)?;
        pos += length::write_into(len, out, pos)?;
        match &self.value {
            Value::Primitive(v) => {
                pos += util::copy_into(v.as_slice(), out, pos)?;
            }
            Value::Constructed(c) => {
                pos += c.write_into(out, pos)?;
            }
        }
        Ok(pos - off)
    }

    /// Serialize into a fresh buffer.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.size()?];
        self.to_bytes(&mut out, 0)?;
        Ok(out)
    }

    /// Borrow the content octets of a primitive node.
    pub fn value(&self) -> Result<&[u8]> {
        if self.tag.is_none() {
            return Err(Error::EmptyTlv);
        }
        match &self.value {
            Value::Primitive(v) => Ok(v.as_slice()),
            Value::Constructed(_) => Err(Error::MalformedTlv),
        }
    }

    /// Copy the content octets of a primitive node into `out` at `off`;
    /// returns the number of bytes copied.
    pub fn copy_value_into(&self, out: &mut [u8], off: usize) -> Result<usize> {
        match &self.value {
            Value::Primitive(v) => util::copy_into(v.as_slice(), out, off),
            Value::Constructed(_) => Err(Error::MalformedTlv),
        }
    }

    /// Append `value` to the content octets of a primitive node; returns
    /// the new value length.
    pub fn append_value(&mut self, value: &[u8]) -> Result<usize> {
        if self.tag.is_none() {
            return Err(Error::EmptyTlv);
        }
        let Value::Primitive(buf) = &mut self.value else {
            return Err(Error::MalformedTlv);
        };
        buf.ensure(buf.len() + value.len())?;
        buf.data.extend_from_slice(value);
        Ok(buf.len())
    }

    /// Replace the content octets of a primitive node with `value`;
    /// returns the new value length.
    pub fn replace_value(&mut self, value: &[u8]) -> Result<usize> {
        if self.tag.is_none() {
            return Err(Error::EmptyTlv);
        }
        let Value::Primitive(buf) = &mut self.value else {
            return Err(Error::MalformedTlv);
        };
        buf.ensure(value.len())?;
        buf.data.clear();
        buf.data.extend_from_slice(value);
        Ok(buf.len())
    }

    /// Borrow the child list of a constructed node.
    pub fn children(&self) -> Result<&TlvList> {
        match &self.value {
            Value::Constructed(c) => Ok(c),
            Value::Primitive(_) => Err(Error::MalformedTlv),
        }
    }

    /// Mutably borrow the child list of a constructed node.
    pub fn children_mut(&mut self) -> Result<&mut TlvList> {
        match &mut self.value {
            Value::Constructed(c) => Ok(c),
            Value::Primitive(_) => Err(Error::MalformedTlv),
        }
    }

    /// Append `child` to a constructed node; returns the resulting body
    /// length. Ownership of the child moves into this node.
    pub fn append(&mut self, child: Tlv) -> Result<usize> {
        let Value::Constructed(children) = &mut self.value else {
            return Err(Error::MalformedTlv);
        };
        children.append(child)
    }

    /// Delete the `occurrence`-th child (1-based) whose tag equals `tag`;
    /// returns the resulting body length. See [`TlvList::delete`].
    pub fn delete(&mut self, tag: &Tag, occurrence: usize) -> Result<usize> {
        let Value::Constructed(children) = &mut self.value else {
            return Err(Error::MalformedTlv);
        };
        children.delete(tag, occurrence)
    }

    /// First child matching `tag` (any child when `None`); `None` when
    /// there is no match or the node is primitive.
    pub fn find(&self, tag: Option<&Tag>) -> Option<&Tlv> {
        match &self.value {
            Value::Constructed(c) => c.find(tag),
            Value::Primitive(_) => None,
        }
    }

    /// Mutable variant of [`find`](Self::find).
    pub fn find_mut(&mut self, tag: Option<&Tag>) -> Option<&mut Tlv> {
        match &mut self.value {
            Value::Constructed(c) => c.find_mut(tag),
            Value::Primitive(_) => None,
        }
    }

    /// The `occurrence`-th child matching `tag` after the child `after`.
    /// See [`TlvList::find_next`].
    pub fn find_next(
        &self,
        tag: Option<&Tag>,
        after: &Tlv,
        occurrence: usize,
    ) -> Result<Option<&Tlv>> {
        let Value::Constructed(children) = &self.value else {
            return Err(Error::MalformedTlv);
        };
        children.find_next(tag, after, occurrence)
    }

    /// Human-readable rendering of the tree, indented by nesting level.
    ///
    /// The exact text is informational only and not part of the wire
    /// contract.
    pub fn describe(&self, level: usize) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, level);
        out
    }

    fn describe_into(&self, out: &mut String, level: usize) {
        out.push_str(&indent(level));
        let Some(tag) = &self.tag else {
            out.push_str("Invalid TLV\n");
            return;
        };
        match &self.value {
            Value::Primitive(v) => {
                let _ = writeln!(
                    out,
                    "T={}, L={}, V={}",
                    tag,
                    v.len(),
                    hex::encode_upper(v.as_slice())
                );
            }
            Value::Constructed(c) => {
                let _ = writeln!(out, "T={}, L={} (children={})", tag, c.data_length(), c.len());
                for child in c {
                    child.describe_into(out, level + 1);
                }
            }
        }
    }
}

/// Indentation for one description line: `+-- ` at the innermost level,
/// four spaces for each enclosing level.
fn indent(level: usize) -> String {
    let mut out = String::new();
    let mut remaining = level;
    while remaining > 0 {
        if remaining > 1 {
            out.push_str("    ");
        } else {
            out.push_str("+-- ");
        }
        remaining -= 1;
    }
    out
}

impl fmt::Display for Tlv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(0))
    }
}
