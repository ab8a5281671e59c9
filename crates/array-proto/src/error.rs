// Author: Lukas Bower
// Purpose: Error type for wire schema encoding and payload verification.

use bigint_codec::CodecError;

/// Errors raised while encoding, decoding, or verifying wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// Message was not valid JSON for the expected schema.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// A handle descriptor carried an out-of-range field.
    #[error("invalid handle descriptor: {0}")]
    InvalidDescriptor(String),
    /// Bigint payload was not valid base64.
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Digest string did not follow `sha256:<64 hex>`.
    #[error("bytes_hash must use sha256:<hex> format")]
    MalformedDigest,
    /// Payload bytes did not hash to the advertised digest.
    #[error("payload hash mismatch")]
    DigestMismatch,
    /// Chunk-set frame failed structural checks.
    #[error("bigint payload: {0}")]
    Codec(#[from] CodecError),
    /// Payload element count disagrees with the array it belongs to.
    #[error("payload carries {actual} elements, array declares {expected}")]
    ElementCountMismatch {
        /// Element count of the array handle.
        expected: usize,
        /// Element count found in the payload.
        actual: usize,
    },
}
