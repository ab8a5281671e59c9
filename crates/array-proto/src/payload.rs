// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Carry framed bigint chunk sets inside JSON messages with a content digest.
// Author: Lukas Bower

//! Bigint transfer payloads.
//!
//! The chunk-set frame is Base64-encoded and accompanied by a
//! `sha256:<hex>` digest of the raw frame bytes. Opening a payload checks the
//! digest before the frame is parsed.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use bigint_codec::{decode_frame, encode, encode_frame, BigInteger, ChunkSet, MaxBits};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ProtoError;

const DIGEST_PREFIX: &str = "sha256:";

/// Framed chunk set plus digest, as carried in requests and replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BigintPayload {
    /// Base64 encoding of the chunk-set frame.
    pub limbs_b64: String,
    /// SHA-256 digest of the frame bytes in `sha256:<hex>` form.
    pub bytes_hash: String,
}

impl BigintPayload {
    /// Frame, digest, and encode a chunk set.
    pub fn seal(chunks: &ChunkSet) -> Result<Self, ProtoError> {
        let frame = encode_frame(chunks)?;
        Ok(Self {
            bytes_hash: format!("{DIGEST_PREFIX}{}", digest_hex(&frame)),
            limbs_b64: BASE64_STANDARD.encode(frame),
        })
    }

    /// Encode values under `max_bits` and seal the resulting chunk set.
    pub fn from_values(values: &[BigInteger], max_bits: MaxBits) -> Result<Self, ProtoError> {
        Self::seal(&encode(values, max_bits))
    }

    /// Verify the digest and parse the chunk set.
    pub fn open(&self) -> Result<ChunkSet, ProtoError> {
        let expected = self
            .bytes_hash
            .strip_prefix(DIGEST_PREFIX)
            .ok_or(ProtoError::MalformedDigest)?;
        if expected.len() != 64 || !expected.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ProtoError::MalformedDigest);
        }
        let frame = BASE64_STANDARD.decode(&self.limbs_b64)?;
        if !digest_hex(&frame).eq_ignore_ascii_case(expected) {
            return Err(ProtoError::DigestMismatch);
        }
        Ok(decode_frame(&frame)?)
    }

    /// Open the payload and rebuild its values.
    pub fn to_values(&self) -> Result<Vec<BigInteger>, ProtoError> {
        Ok(self.open()?.decode()?)
    }
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
