//! Error types for BER-TLV operations
//!
//! Every fallible operation in this crate returns [`Error`]. The variants
//! mirror the reason codes smart-card runtimes report for TLV processing,
//! so callers migrating card-side logic can switch on them directly.

use thiserror::Error;

/// Result type for BER-TLV operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for BER-TLV operations
///
/// Format errors (`MalformedTag`, `MalformedTlv`, the `*GreaterThan*`
/// limits) describe bad wire data; `OutOfBounds` is a caller error on a
/// supplied buffer and is deliberately a separate variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Parameter out of range: zero occurrence number, missing search
    /// anchor, or a packed tag that does not round-trip
    #[error("invalid parameter")]
    InvalidParam,

    /// Tag longer than 4 octets, or a tag number too large to encode
    #[error("size exceeds the supported maximum")]
    IllegalSize,

    /// Tag observer invoked on an empty tag
    #[error("tag is empty")]
    EmptyTag,

    /// TLV observer invoked on an uninitialized node
    #[error("TLV is empty")]
    EmptyTlv,

    /// Identifier octets fail well-formedness
    #[error("malformed BER tag")]
    MalformedTag,

    /// TLV bytes fail well-formedness, or an operation was applied to the
    /// wrong node variant
    #[error("malformed BER TLV")]
    MalformedTlv,

    /// Capacity exceeded on a node with automatic expansion disabled
    #[error("capacity exceeded and automatic expansion is disabled")]
    InsufficientStorage,

    /// Reserved reason, kept for taxonomy compatibility
    #[error("tag size greater than 127")]
    TagSizeGreaterThan127,

    /// Decoded tag number above 32767
    #[error("tag number greater than 32767")]
    TagNumberGreaterThan32767,

    /// Composed TLV size above 32767
    #[error("TLV size greater than 32767")]
    TlvSizeGreaterThan32767,

    /// Decoded or queried value length above 32767
    #[error("TLV length greater than 32767")]
    TlvLengthGreaterThan32767,

    /// Access past the end of a caller-supplied buffer
    #[error("access at offset {offset} is outside the {len}-byte buffer")]
    OutOfBounds {
        /// First offset that would have been touched out of range
        offset: usize,
        /// Length of the buffer that was accessed
        len: usize,
    },
}
