// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Encode and decode bigint chunk sets as length-prefixed binary frames.
// Author: Lukas Bower

//! Binary framing for chunk sets.
//!
//! ```text
//! size[4] version[1] max_bits[8] len[8] limbs[4] signs[ceil(len/8)] groups[limbs*len*8]
//! ```
//!
//! All integers are little-endian. `size` counts the whole frame including
//! itself. Groups are written in order, limb 0 first, each holding `len` limbs.

use crate::{ChunkSet, CodecError, MaxBits};

/// Version byte written by this codec.
pub const FRAME_VERSION: u8 = 1;

/// Bytes preceding the sign bitmap.
pub const FRAME_HEADER_LEN: usize = 4 + 1 + 8 + 8 + 4;

/// Serialise a chunk set. The set is verified first so a corrupt set is never framed.
pub fn encode_frame(chunks: &ChunkSet) -> Result<Vec<u8>, CodecError> {
    chunks.verify()?;
    let limb_count: u32 =
        chunks
            .declared_limbs()
            .try_into()
            .map_err(|_| CodecError::FrameTooLarge {
                size: chunks.declared_limbs(),
            })?;
    let mut payload = Vec::with_capacity(
        FRAME_HEADER_LEN + chunks.len().div_ceil(8) + chunks.len() * chunks.declared_limbs() * 8,
    );
    payload.push(FRAME_VERSION);
    payload.extend_from_slice(&chunks.max_bits().to_wire().to_le_bytes());
    payload.extend_from_slice(&(chunks.len() as u64).to_le_bytes());
    payload.extend_from_slice(&limb_count.to_le_bytes());
    put_signs(&mut payload, chunks.signs());
    for group in chunks.groups() {
        for limb in group {
            payload.extend_from_slice(&limb.to_le_bytes());
        }
    }
    finish(&payload)
}

/// Parse a frame back into a chunk set, rejecting any structural inconsistency.
pub fn decode_frame(bytes: &[u8]) -> Result<ChunkSet, CodecError> {
    let payload = decode_message(bytes)?;
    let mut cursor = Cursor::new(payload);
    let version = read_u8(&mut cursor)?;
    if version != FRAME_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let max_bits = MaxBits::from_wire(read_i64(&mut cursor)?)?;
    let raw_len = read_u64(&mut cursor)?;
    let limbs = read_u32(&mut cursor)? as usize;
    let remaining = cursor.remaining();
    let len = usize::try_from(raw_len).map_err(|_| CodecError::PayloadMismatch {
        expected: usize::MAX,
        actual: remaining,
    })?;
    // An empty batch decomposes into zero groups; any other count is forged.
    if len == 0 && limbs != 0 {
        return Err(CodecError::LimbCountMismatch {
            declared: limbs,
            actual: 0,
        });
    }
    let expected = len
        .checked_mul(limbs)
        .and_then(|count| count.checked_mul(8))
        .and_then(|bytes| bytes.checked_add(len.div_ceil(8)))
        .ok_or(CodecError::PayloadMismatch {
            expected: usize::MAX,
            actual: remaining,
        })?;
    if remaining != expected {
        return Err(CodecError::PayloadMismatch {
            expected,
            actual: remaining,
        });
    }
    let signs = read_signs(&mut cursor, len)?;
    // Every group holds at least one byte here, so `limbs <= remaining`.
    let mut groups = Vec::with_capacity(limbs.min(remaining));
    for _ in 0..limbs {
        let mut group = Vec::with_capacity(len);
        for _ in 0..len {
            group.push(read_u64(&mut cursor)?);
        }
        groups.push(group);
    }
    let chunks = ChunkSet::from_parts(max_bits, len, limbs, signs, groups);
    chunks.verify()?;
    Ok(chunks)
}

fn finish(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let size = payload
        .len()
        .checked_add(4)
        .ok_or(CodecError::FrameTooLarge { size: usize::MAX })?;
    let declared: u32 = size
        .try_into()
        .map_err(|_| CodecError::FrameTooLarge { size })?;
    let mut buffer = Vec::with_capacity(size);
    buffer.extend_from_slice(&declared.to_le_bytes());
    buffer.extend_from_slice(payload);
    Ok(buffer)
}

fn decode_message(bytes: &[u8]) -> Result<&[u8], CodecError> {
    let Some(prefix) = bytes.get(..4) else {
        return Err(CodecError::Truncated);
    };
    let mut size = [0u8; 4];
    size.copy_from_slice(prefix);
    let declared = u32::from_le_bytes(size);
    let actual: u32 = bytes
        .len()
        .try_into()
        .map_err(|_| CodecError::LengthMismatch {
            declared,
            actual: bytes.len(),
        })?;
    if declared != actual {
        return Err(CodecError::LengthMismatch {
            declared,
            actual: bytes.len(),
        });
    }
    Ok(&bytes[4..])
}

fn put_signs(buffer: &mut Vec<u8>, signs: &[bool]) {
    for chunk in signs.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (bit, &negative)| acc | (u8::from(negative) << bit));
        buffer.push(byte);
    }
}

fn read_signs(cursor: &mut Cursor<'_>, len: usize) -> Result<Vec<bool>, CodecError> {
    let mut bitmap = vec![0u8; len.div_ceil(8)];
    cursor
        .read_exact(&mut bitmap)
        .map_err(|_| CodecError::Truncated)?;
    Ok((0..len)
        .map(|index| bitmap[index / 8] & (1 << (index % 8)) != 0)
        .collect())
}

fn read_u8(cursor: &mut Cursor<'_>) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| CodecError::Truncated)?;
    Ok(buf[0])
}

fn read_u32(cursor: &mut Cursor<'_>) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| CodecError::Truncated)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(cursor: &mut Cursor<'_>) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| CodecError::Truncated)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i64(cursor: &mut Cursor<'_>) -> Result<i64, CodecError> {
    let mut buf = [0u8; 8];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| CodecError::Truncated)?;
    Ok(i64::from_le_bytes(buf))
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn read_exact(&mut self, out: &mut [u8]) -> Result<(), ()> {
        let end = self.pos.saturating_add(out.len());
        if end > self.buf.len() {
            return Err(());
        }
        out.copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(())
    }
}
