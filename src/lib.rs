//! BER-TLV (ISO/IEC 8825-1) parsing, editing and serialization
//!
//! This crate models the Tag-Length-Value structures that smart card
//! tooling lives on: PPSE and ADF SELECT responses, GET PROCESSING
//! OPTIONS payloads, READ RECORD templates, GlobalPlatform status
//! entries. It decodes the definite-length BER wire form into an
//! editable tree, lets callers search and mutate it, and re-encodes it
//! byte-exactly. Content octets are never interpreted; the value field
//! of a primitive TLV is opaque bytes.
//!
//! The pieces:
//!
//! - [`Tag`]: the identifier-octet codec, short and long form, backed by
//!   the exact wire octets so equality is byte-equality.
//! - [`Tlv`]: a primitive or constructed node with parse, mutate, search
//!   and serialize operations.
//! - [`TlvList`]: an ordered stream of nodes, used for constructed
//!   bodies and for top-level buffers holding several concatenated TLVs.
//! - [`raw`]: the same edits performed directly on a byte image, for
//!   callers that keep APDU payloads in flat buffers.
//! - [`template`]: template-driven composition — fill a parsed skeleton
//!   from a tag-to-value map and serialize the result.
//! - [`compose`]: one-shot builders keyed by the 2-byte packed tag form.
//!
//! # Example
//!
//! ```
//! use bertlv::{Tag, Tlv};
//!
//! // FCI from a SELECT response: 6F [ 84 <DF name>  A5 [ 88 .. 87 .. ] ]
//! let fci = [
//!     0x6F, 0x0E, 0x84, 0x05, 0x32, 0x50, 0x41, 0x59, 0x2E, 0xA5, 0x05, 0x88,
//!     0x01, 0x01, 0x87, 0x00,
//! ];
//! let tlv = Tlv::parse(&fci, 0, fci.len())?;
//!
//! let df_name = Tag::from_packed(0x84)?;
//! let entry = tlv.find(Some(&df_name)).expect("DF name present");
//! assert_eq!(entry.value()?, &[0x32, 0x50, 0x41, 0x59, 0x2E]);
//!
//! // byte-exact round trip
//! assert_eq!(tlv.to_vec()?, fci);
//! # Ok::<(), bertlv::Error>(())
//! ```
//!
//! Indefinite-form lengths, CER/DER canonicalization, tag numbers and
//! value lengths above 32767 are out of scope and surface as errors.

pub mod compose;
pub mod error;
pub mod length;
pub mod list;
pub mod raw;
pub mod tag;
pub mod template;
pub mod tlv;
mod util;

pub use error::{Error, Result};
pub use list::TlvList;
pub use tag::{Tag, TagClass};
pub use template::{write_structure, write_with_values, TagValueMap};
pub use tlv::{Tlv, Value, ValueBuf};

/// Commonly used types and helpers, for glob imports.
pub mod prelude {
    pub use crate::compose::{concat_tlv, make_tag, make_tlv, make_tlv_vec};
    pub use crate::error::{Error, Result};
    pub use crate::list::TlvList;
    pub use crate::tag::{Tag, TagClass};
    pub use crate::template::{write_structure, write_with_values, TagValueMap};
    pub use crate::tlv::{Tlv, Value};
}
