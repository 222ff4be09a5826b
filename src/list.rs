//! Ordered stream of TLV nodes
//!
//! [`TlvList`] backs two things: the child list of every constructed node,
//! and a top-level stream of concatenated TLVs with no enclosing tag (a
//! SELECT response listing one FCI per application, for instance). It is
//! not itself a TLV.

use tracing::trace;

use crate::error::{Error, Result};
use crate::tag::{self, Tag};
use crate::tlv::Tlv;
use crate::util;

/// Ordered, growable collection of TLV nodes. Equality compares the
/// contained nodes in order, not capacity bookkeeping.
#[derive(Debug, Clone)]
pub struct TlvList {
    items: Vec<Tlv>,
    limit: usize,
    expand: bool,
}

impl PartialEq for TlvList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for TlvList {}

impl TlvList {
    /// Empty list with room for `capacity` nodes, growing as needed.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            limit: capacity,
            expand: true,
        }
    }

    /// Empty list that refuses to grow past `capacity`; appending beyond
    /// it fails with `InsufficientStorage`.
    pub fn fixed_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            limit: capacity,
            expand: false,
        }
    }

    /// Parse a stream of concatenated TLVs covering `len` bytes at `off`.
    pub fn parse(buf: &[u8], off: usize, len: usize) -> Result<Self> {
        let mut list = Self::with_capacity(0);
        list.init(buf, off, len)?;
        Ok(list)
    }

    /// Parse TLVs from `buf` and append them until `len` bytes are
    /// consumed. End-of-content filler octets at element boundaries are
    /// skipped. Returns the resulting [`data_length`](Self::data_length).
    pub fn init(&mut self, buf: &[u8], off: usize, len: usize) -> Result<usize> {
        util::check_range(buf.len(), off, len)?;
        let mut pos = off;
        let mut remaining = len;
        while remaining > 0 {
            if tag::is_eoc(buf[pos]) {
                trace!(offset = pos, "skipping end-of-content octet");
                pos += 1;
                remaining -= 1;
                continue;
            }
            let tlv = Tlv::parse(buf, pos, remaining)?;
            let size = tlv.size()?;
            self.append(tlv)?;
            pos += size;
            remaining -= size;
        }
        Ok(self.data_length())
    }

    /// Number of contained nodes.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the list holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all contained nodes.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Borrow the node at `index`.
    pub fn get(&self, index: usize) -> Option<&Tlv> {
        self.items.get(index)
    }

    /// Mutably borrow the node at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tlv> {
        self.items.get_mut(index)
    }

    /// Iterate over the contained nodes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Tlv> {
        self.items.iter()
    }

    /// Iterate mutably over the contained nodes in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Tlv> {
        self.items.iter_mut()
    }

    /// Append a node to the end of the list. Returns the resulting
    /// [`data_length`](Self::data_length).
    pub fn append(&mut self, tlv: Tlv) -> Result<usize> {
        if !self.expand && self.items.len() >= self.limit {
            return Err(Error::InsufficientStorage);
        }
        self.items.push(tlv);
        Ok(self.data_length())
    }

    /// Remove the node at `index`, shifting the following nodes down.
    pub fn remove(&mut self, index: usize) -> Option<Tlv> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Delete the `occurrence`-th node (1-based) whose tag equals `tag`.
    /// The whole list is scanned before the occurrence bound is checked;
    /// `InvalidParam` when `occurrence` is zero or exceeds the number of
    /// matches. Returns the resulting [`data_length`](Self::data_length).
    pub fn delete(&mut self, tag: &Tag, occurrence: usize) -> Result<usize> {
        if occurrence == 0 {
            return Err(Error::InvalidParam);
        }
        let mut seen = 0usize;
        let mut found = None;
        for (index, item) in self.items.iter().enumerate() {
            if item.tag().is_ok_and(|t| t == tag) {
                seen += 1;
                if seen == occurrence {
                    found = Some(index);
                }
            }
        }
        let Some(index) = found else {
            return Err(Error::InvalidParam);
        };
        self.items.remove(index);
        Ok(self.data_length())
    }

    /// First node whose tag equals `tag`, or the first node when `tag` is
    /// `None`.
    pub fn find(&self, tag: Option<&Tag>) -> Option<&Tlv> {
        self.items.iter().find(|item| matches_tag(item, tag))
    }

    /// Mutable variant of [`find`](Self::find).
    pub fn find_mut(&mut self, tag: Option<&Tag>) -> Option<&mut Tlv> {
        self.items.iter_mut().find(|item| matches_tag(item, tag))
    }

    /// The `occurrence`-th node (1-based) matching `tag` after the node
    /// `after`, which must itself be contained in this list.
    ///
    /// `InvalidParam` when `after` is not an element of the list or
    /// `occurrence` is zero; `Ok(None)` once the matches are exhausted.
    pub fn find_next(
        &self,
        tag: Option<&Tag>,
        after: &Tlv,
        occurrence: usize,
    ) -> Result<Option<&Tlv>> {
        if occurrence == 0 {
            return Err(Error::InvalidParam);
        }
        let start = self
            .items
            .iter()
            .position(|item| std::ptr::eq(item, after))
            .ok_or(Error::InvalidParam)?
            + 1;
        let mut seen = 0usize;
        for item in &self.items[start..] {
            if matches_tag(item, tag) {
                seen += 1;
                if seen == occurrence {
                    return Ok(Some(item));
                }
            }
        }
        Ok(None)
    }

    /// Serialize the contained nodes in order into `out` at `off`;
    /// returns the number of bytes written.
    pub fn write_into(&self, out: &mut [u8], off: usize) -> Result<usize> {
        let mut pos = off;
        for item in &self.items {
            pos += item.to_bytes(out, pos)?;
        }
        Ok(pos - off)
    }

    /// Sum of the encoded sizes of the contained nodes. Nodes whose size
    /// query fails (empty, or past the 32767 ceiling) are excluded from
    /// the sum; the enclosing node's own size query still surfaces the
    /// over-limit errors.
    pub fn data_length(&self) -> usize {
        self.items.iter().filter_map(|item| item.size().ok()).sum()
    }
}

impl<'a> IntoIterator for &'a TlvList {
    type Item = &'a Tlv;
    type IntoIter = std::slice::Iter<'a, Tlv>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn matches_tag(item: &Tlv, tag: Option<&Tag>) -> bool {
    match tag {
        None => true,
        Some(wanted) => item.tag().is_ok_and(|t| t == wanted),
    }
}
