// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Shared remote array handle model, command schema, and framing primitives.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Remote array wire schema shared by the client gateway, the mock server, and
//! host tooling.
//!
//! Requests are `{"command": .., "args": {..}}` JSON objects; replies are either
//! `{"result": ..}` or `{"error": ".."}`. Both travel in length-prefixed frames
//! (see [`frame`]).

pub mod frame;
pub mod handle;
pub mod kind;
pub mod message;
pub mod payload;

mod error;

pub use error::ProtoError;
pub use handle::{ArrayHandle, Operand, ScalarValue, ServerRef};
pub use kind::ElementKind;
pub use message::{
    decode_reply, decode_request, encode_reply, encode_request, Command, HandleDescriptor,
    HostArray, Reply, ReplyPayload, Request,
};
pub use payload::BigintPayload;
