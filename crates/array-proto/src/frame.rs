// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Length-prefixed message framing for stream transports.
// Author: Lukas Bower

//! Stream framing.
//!
//! Each message is preceded by a little-endian `u32` holding the total frame
//! length, prefix included.

use std::io::{self, Read, Write};

/// Length of the size prefix.
pub const PREFIX_LEN: usize = 4;

/// Largest frame accepted by [`read_frame`].
pub const MAX_FRAME_LEN: usize = 512 * 1024 * 1024;

/// Write one framed message.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let total_len = payload
        .len()
        .checked_add(PREFIX_LEN)
        .filter(|&len| len <= MAX_FRAME_LEN)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("frame payload of {} bytes exceeds limit", payload.len()),
            )
        })?;
    let len_bytes = (total_len as u32).to_le_bytes();
    writer.write_all(&len_bytes)?;
    writer.write_all(payload)?;
    writer.flush()
}

/// Read one framed message. Returns `Ok(None)` when the peer closed the stream
/// before a new frame started.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; PREFIX_LEN];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    }
    let total_len = u32::from_le_bytes(len_buf) as usize;
    if !(PREFIX_LEN..=MAX_FRAME_LEN).contains(&total_len) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid frame length {total_len}"),
        ));
    }
    let mut payload = vec![0u8; total_len - PREFIX_LEN];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}
