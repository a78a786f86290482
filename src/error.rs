//! Error types shared across the crate.

use thiserror::Error;

/// Errors surfaced by encoding, decoding and container parsing.
#[derive(Error, Debug)]
pub enum HuffError {
    /// A character other than '0' or '1' while parsing a bit string.
    #[error("character must be either '0' or '1', but found {found:?}")]
    MalformedBitString {
        /// The offending character.
        found: char,
    },

    /// A leaf ended up deeper than the 24-bit code cap allows.
    #[error("code for byte {byte:#04x} exceeds the {max}-bit limit")]
    CodeTooLong {
        /// The byte whose code overflowed.
        byte: u8,
        /// The cap in force.
        max: usize,
    },

    /// More bits requested in a single writer call than fit in a u32.
    #[error("cannot write {requested} bits in one call (maximum 32)")]
    MaxLenExceeded {
        /// Number of bits requested.
        requested: u8,
    },

    /// Encoding was requested for a byte the table does not cover.
    #[error("no code for byte {byte:#04x} at input offset {offset}")]
    CodeMissing {
        /// The byte with no code.
        byte: u8,
        /// Offset of the byte in the input.
        offset: usize,
    },

    /// The decoder consumed the maximum code length without a table hit.
    #[error("bit code not found")]
    CodeNotFound,

    /// The decoder was asked for a byte with no bits remaining.
    #[error("bits exhausted")]
    BitsExhausted,

    /// Buffer shorter than the minimum a parse step requires.
    #[error("len of data is smaller than {need} (got {len})")]
    TooSmall {
        /// Actual buffer length.
        len: usize,
        /// Minimum required length.
        need: usize,
    },

    /// A cursor-guarded read would run past the end of the buffer.
    #[error("cursor overflow at offset {at}")]
    Overflow {
        /// Offset at which the read was attempted.
        at: usize,
    },

    /// Start sentinel does not match.
    #[error("start flag invalid")]
    BadStartFlag,

    /// End sentinel does not match.
    #[error("end flag invalid")]
    BadEndFlag,

    /// Recomputed CRC-32 disagrees with the stored value.
    #[error("checksum not matched: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the buffer.
        expected: u32,
        /// Checksum recomputed over the covered bytes.
        actual: u32,
    },

    /// Input size or filename length exceeds a container header field.
    #[error("input of {len} bytes does not fit the container header")]
    InputTooLarge {
        /// The oversized length.
        len: usize,
    },

    /// I/O error from the surrounding file layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HuffError>;
