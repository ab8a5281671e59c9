// Author: Lukas Bower
// Purpose: Define error types raised by the bigint transfer codec.

//! Codec and parse errors.

/// Errors produced while encoding or decoding bigint chunk sets.
///
/// Every decode-side variant means the transfer is corrupt; callers must discard
/// the whole transfer rather than use any part of it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input buffer was shorter than the fixed frame header.
    #[error("truncated frame")]
    Truncated,
    /// Declared frame size does not match the buffer length.
    #[error("length mismatch: declared {declared} actual {actual}")]
    LengthMismatch {
        /// Size declared in the frame header.
        declared: u32,
        /// Actual byte length of the buffer.
        actual: usize,
    },
    /// Frame carried a version byte this codec does not understand.
    #[error("unsupported frame version {0}")]
    UnsupportedVersion(u8),
    /// Frame would exceed the `u32` size field.
    #[error("frame of {size} bytes exceeds the size field")]
    FrameTooLarge {
        /// Size the frame would have needed.
        size: usize,
    },
    /// Number of limb groups differs from the declared limb count.
    #[error("limb count mismatch: declared {declared} actual {actual}")]
    LimbCountMismatch {
        /// Limb count declared by the chunk set.
        declared: usize,
        /// Limb groups actually present.
        actual: usize,
    },
    /// A limb group does not hold one limb per element.
    #[error("limb group {group} holds {actual} limbs, expected {declared}")]
    GroupLengthMismatch {
        /// Index of the offending limb group.
        group: usize,
        /// Element count declared by the chunk set.
        declared: usize,
        /// Limbs present in the group.
        actual: usize,
    },
    /// The sign lane does not hold one entry per element.
    #[error("sign lane holds {actual} entries, expected {declared}")]
    SignLaneMismatch {
        /// Element count declared by the chunk set.
        declared: usize,
        /// Entries present in the sign lane.
        actual: usize,
    },
    /// A bounded transfer carried a negative value.
    #[error("negative value at index {index} in a bounded transfer")]
    NegativeInBoundedTransfer {
        /// Element index carrying the sign bit.
        index: usize,
    },
    /// Frame body length disagrees with the header's element and limb counts.
    #[error("limb payload mismatch: expected {expected} bytes actual {actual}")]
    PayloadMismatch {
        /// Bytes implied by the header.
        expected: usize,
        /// Bytes present after the header.
        actual: usize,
    },
    /// Wire value for `max_bits` is outside the supported range.
    #[error("invalid max_bits {0}")]
    InvalidMaxBits(i64),
}

/// Errors produced when parsing a decimal integer literal.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseBigIntegerError {
    /// Input held no digits.
    #[error("empty integer literal")]
    Empty,
    /// Input held a non-decimal character.
    #[error("invalid digit {0:?}")]
    InvalidDigit(char),
}
