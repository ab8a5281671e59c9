// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Encode validated operations as requests and decode server replies.
// Author: Lukas Bower

//! Command encoder and reply decoder.
//!
//! Decoding is per operation: compute and staging commands expect a fresh
//! array descriptor, downloads expect inline values or a bigint payload. Any
//! other reply, including one that is not valid JSON, is a remote error
//! carrying the server's text unchanged.

use array_proto::{
    decode_reply, ArrayHandle, BigintPayload, Command, HandleDescriptor, HostArray, ProtoError,
    Reply, ReplyPayload, Request,
};
use bigint_codec::BigInteger;
use log::trace;

use crate::GatewayError;

/// Argument key naming the operand array.
pub const ARRAY_ARG: &str = "array";

/// Request for a single-array command.
#[must_use]
pub fn encode_array_command(command: Command, handle: &ArrayHandle) -> Request {
    Request::new(command).array(ARRAY_ARG, handle.server_ref())
}

/// Parse a raw reply into its successful payload.
pub fn decode_payload(command: Command, raw: &[u8]) -> Result<ReplyPayload, GatewayError> {
    trace!("{command} reply of {} bytes", raw.len());
    match decode_reply(raw) {
        Ok(Reply::Result(payload)) => Ok(payload),
        Ok(Reply::Error(message)) => Err(GatewayError::Remote(message)),
        Err(_) => Err(GatewayError::Remote(
            String::from_utf8_lossy(raw).into_owned(),
        )),
    }
}

/// Decode a reply that must name a new array.
pub fn decode_handle(command: Command, raw: &[u8]) -> Result<ArrayHandle, GatewayError> {
    match decode_payload(command, raw)? {
        ReplyPayload::Array(descriptor) => descriptor_to_handle(descriptor),
        other => Err(unexpected(command, &other)),
    }
}

/// Decode a reply that must carry inline fixed-width values.
pub fn decode_values(
    command: Command,
    raw: &[u8],
    expected_len: usize,
) -> Result<HostArray, GatewayError> {
    match decode_payload(command, raw)? {
        ReplyPayload::Values(values) if values.len() == expected_len => Ok(values),
        ReplyPayload::Values(values) => Err(GatewayError::Remote(format!(
            "{command} returned {} values for an array of {expected_len}",
            values.len()
        ))),
        other => Err(unexpected(command, &other)),
    }
}

/// Decode a reply that must carry a bigint payload of `expected_len` values.
///
/// The payload is verified in full before any value is returned.
pub fn decode_bigint(
    command: Command,
    raw: &[u8],
    expected_len: usize,
) -> Result<Vec<BigInteger>, GatewayError> {
    match decode_payload(command, raw)? {
        ReplyPayload::Bigint(payload) => open_bigint(&payload, expected_len),
        other => Err(unexpected(command, &other)),
    }
}

/// Verify and unpack a bigint payload.
pub fn open_bigint(
    payload: &BigintPayload,
    expected_len: usize,
) -> Result<Vec<BigInteger>, GatewayError> {
    let chunks = payload.open().map_err(GatewayError::Corruption)?;
    if chunks.len() != expected_len {
        return Err(GatewayError::Corruption(ProtoError::ElementCountMismatch {
            expected: expected_len,
            actual: chunks.len(),
        }));
    }
    chunks
        .decode()
        .map_err(|err| GatewayError::Corruption(ProtoError::Codec(err)))
}

fn descriptor_to_handle(descriptor: HandleDescriptor) -> Result<ArrayHandle, GatewayError> {
    descriptor
        .into_handle()
        .map_err(|err| GatewayError::Remote(err.to_string()))
}

fn unexpected(command: Command, payload: &ReplyPayload) -> GatewayError {
    let shape = match payload {
        ReplyPayload::Array(_) => "array",
        ReplyPayload::Scalar(_) => "scalar",
        ReplyPayload::Values(_) => "values",
        ReplyPayload::Bigint(_) => "bigint",
    };
    GatewayError::Remote(format!("{command} returned an unexpected {shape} reply"))
}
