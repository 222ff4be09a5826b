//! Template-driven TLV composition
//!
//! A parsed skeleton — a TLV tree whose primitive leaves all carry
//! zero-length values — acts as a schema: emit these tags in this nested
//! order, filling in values by tag. [`write_with_values`] substitutes
//! leaf values from a map keyed by the 2-byte packed tag and offers two
//! policies for leaves the map does not cover: keep them at zero length,
//! or drop them (and any constructed node left without surviving leaves)
//! from the output entirely.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::Result;
use crate::tlv::Tlv;

/// Leaf values keyed by the 2-byte packed tag form.
pub type TagValueMap = HashMap<u16, Vec<u8>>;

/// Parse `structure` as a skeleton, substitute leaf values from
/// `values`, and serialize the result.
///
/// With `remove_missing` set, leaves absent from `values` are deleted,
/// and constructed nodes whose whole subtree was absent are deleted with
/// them; the top-level node itself is always emitted, collapsing to an
/// empty body when everything below it was absent. Without it, absent
/// leaves are emitted with zero-length values.
pub fn write_with_values(
    structure: &[u8],
    values: &TagValueMap,
    remove_missing: bool,
) -> Result<Vec<u8>> {
    let mut tlv = Tlv::parse(structure, 0, structure.len())?;
    fill(&mut tlv, Some(values), remove_missing);
    tlv.to_vec()
}

/// Normalize every primitive leaf of `tlv` to a zero-length value and
/// serialize the resulting skeleton shape.
pub fn write_structure(tlv: &mut Tlv) -> Result<Vec<u8>> {
    fill(tlv, None, false);
    tlv.to_vec()
}

/// Depth-first fill. Returns true when the subtree ended up holding at
/// least one value ("present"), false when every leaf in it was absent.
///
/// A node that cannot be processed at all reports absent instead of
/// failing the whole walk.
fn fill(tlv: &mut Tlv, values: Option<&TagValueMap>, remove_missing: bool) -> bool {
    match fill_node(tlv, values, remove_missing) {
        Ok(present) => present,
        Err(error) => {
            debug!(%error, "treating unfillable subtree as absent");
            false
        }
    }
}

fn fill_node(tlv: &mut Tlv, values: Option<&TagValueMap>, remove_missing: bool) -> Result<bool> {
    if tlv.tag()?.is_constructed() {
        let children = tlv.children_mut()?;
        let mut present = false;
        let mut index = 0;
        while let Some(child) = children.get_mut(index) {
            if fill(child, values, remove_missing) {
                present = true;
                index += 1;
            } else if remove_missing {
                children.remove(index);
            } else {
                index += 1;
            }
        }
        Ok(present)
    } else {
        let tag = *tlv.tag()?;
        let entry = tag
            .packed()
            .and_then(|key| values.and_then(|map| map.get(&key)));
        match entry {
            Some(data) => {
                trace!(tag = %tag, len = data.len(), "substituting leaf value");
                tlv.replace_value(data)?;
                Ok(true)
            }
            None if remove_missing => {
                trace!(tag = %tag, "leaf missing from value map");
                Ok(false)
            }
            None => {
                tlv.replace_value(&[])?;
                Ok(true)
            }
        }
    }
}
