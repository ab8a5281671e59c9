// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define command requests and replies exchanged with the array server.
// Author: Lukas Bower

//! Command and reply schema.

use core::fmt;

use bigint_codec::MaxBits;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ArrayHandle, BigintPayload, ElementKind, ProtoError, ScalarValue, ServerRef};

/// Commands understood by the array server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Elementwise doubling.
    #[serde(rename = "times2")]
    Times2,
    /// Exclusive prefix sum on device-resident arrays.
    #[serde(rename = "gpuScan")]
    GpuScan,
    /// Stable ascending radix sort.
    #[serde(rename = "gpuSort")]
    GpuSort,
    /// Allocate an array from inline host values.
    #[serde(rename = "array")]
    CreateArray,
    /// Allocate a bigint array from a limb payload.
    #[serde(rename = "bigintCreation")]
    CreateBigint,
    /// Copy a fixed-width array back to the client.
    #[serde(rename = "tondarray")]
    ToNdarray,
    /// Copy a bigint array back to the client as a limb payload.
    #[serde(rename = "bigintToLimbs")]
    BigintToLimbs,
    /// Stage an array into accelerator memory.
    #[serde(rename = "gpuStage")]
    GpuStage,
    /// Stage an array back into host memory.
    #[serde(rename = "gpuUnstage")]
    GpuUnstage,
}

impl Command {
    /// Wire name of the command.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Times2 => "times2",
            Self::GpuScan => "gpuScan",
            Self::GpuSort => "gpuSort",
            Self::CreateArray => "array",
            Self::CreateBigint => "bigintCreation",
            Self::ToNdarray => "tondarray",
            Self::BigintToLimbs => "bigintToLimbs",
            Self::GpuStage => "gpuStage",
            Self::GpuUnstage => "gpuUnstage",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request envelope: a command plus named scalar arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    /// Command to run.
    pub command: Command,
    /// Named arguments; arrays are passed by server reference.
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl Request {
    /// Start a request with no arguments.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            args: Map::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.args.insert(key.to_owned(), value.into());
        self
    }

    /// Add an array argument by server reference.
    #[must_use]
    pub fn array(self, key: &str, server_ref: &ServerRef) -> Self {
        self.arg(key, server_ref.as_str())
    }

    /// Read a string argument.
    #[must_use]
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    /// Read an integer argument.
    #[must_use]
    pub fn i64_arg(&self, key: &str) -> Option<i64> {
        self.args.get(key).and_then(Value::as_i64)
    }
}

fn unbounded_wire() -> i64 {
    MaxBits::UNBOUNDED.to_wire()
}

/// Wire form of an [`ArrayHandle`] returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandleDescriptor {
    /// Server-side identifier.
    pub name: String,
    /// Element kind.
    pub dtype: ElementKind,
    /// Element count.
    pub size: u64,
    /// Residency flag.
    #[serde(default)]
    pub on_device: bool,
    /// Bigint bound, `-1` when unbounded; ignored for other kinds.
    #[serde(default = "unbounded_wire")]
    pub max_bits: i64,
}

impl HandleDescriptor {
    /// Describe a handle for the wire.
    #[must_use]
    pub fn from_handle(handle: &ArrayHandle) -> Self {
        Self {
            name: handle.server_ref().as_str().to_owned(),
            dtype: handle.kind(),
            size: handle.size() as u64,
            on_device: handle.on_device(),
            max_bits: handle.max_bits().unwrap_or_default().to_wire(),
        }
    }

    /// Build the local handle this descriptor names.
    pub fn into_handle(self) -> Result<ArrayHandle, ProtoError> {
        let size = usize::try_from(self.size)
            .map_err(|_| ProtoError::InvalidDescriptor(format!("size {} overflows", self.size)))?;
        let server_ref = ServerRef::new(self.name);
        if self.dtype == ElementKind::BigInt {
            let max_bits = MaxBits::from_wire(self.max_bits)?;
            return Ok(ArrayHandle::bigint(server_ref, size, self.on_device, max_bits));
        }
        Ok(ArrayHandle::new(server_ref, self.dtype, size, self.on_device))
    }
}

/// Fixed-width array values held on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostArray {
    /// Signed 64-bit values.
    Int64(Vec<i64>),
    /// Unsigned 64-bit values.
    #[serde(rename = "uint64")]
    UInt64(Vec<u64>),
    /// Double precision values.
    Float64(Vec<f64>),
    /// Booleans.
    Bool(Vec<bool>),
}

impl HostArray {
    /// Empty values of `kind`; `None` for bigint, which has its own transfer path.
    #[must_use]
    pub fn empty(kind: ElementKind) -> Option<Self> {
        match kind {
            ElementKind::Int64 => Some(Self::Int64(Vec::new())),
            ElementKind::UInt64 => Some(Self::UInt64(Vec::new())),
            ElementKind::Float64 => Some(Self::Float64(Vec::new())),
            ElementKind::Bool => Some(Self::Bool(Vec::new())),
            ElementKind::BigInt => None,
        }
    }

    /// Element kind of the values.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Int64(_) => ElementKind::Int64,
            Self::UInt64(_) => ElementKind::UInt64,
            Self::Float64(_) => ElementKind::Float64,
            Self::Bool(_) => ElementKind::Bool,
        }
    }

    /// Element count.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int64(values) => values.len(),
            Self::UInt64(values) => values.len(),
            Self::Float64(values) => values.len(),
            Self::Bool(values) => values.len(),
        }
    }

    /// Whether no values are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Server reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reply {
    /// Successful result.
    Result(ReplyPayload),
    /// Failure reported by the server, surfaced verbatim.
    Error(String),
}

impl Reply {
    /// Error reply.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Reply naming a freshly allocated array.
    #[must_use]
    pub fn array(handle: &ArrayHandle) -> Self {
        Self::Result(ReplyPayload::Array(HandleDescriptor::from_handle(handle)))
    }
}

/// Successful reply payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyPayload {
    /// New server-side array.
    Array(HandleDescriptor),
    /// Scalar result.
    Scalar(ScalarValue),
    /// Inline fixed-width values.
    Values(HostArray),
    /// Bigint limb payload.
    Bigint(BigintPayload),
}

/// Serialise a request.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, ProtoError> {
    Ok(serde_json::to_vec(request)?)
}

/// Parse a request.
pub fn decode_request(bytes: &[u8]) -> Result<Request, ProtoError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serialise a reply.
pub fn encode_reply(reply: &Reply) -> Result<Vec<u8>, ProtoError> {
    Ok(serde_json::to_vec(reply)?)
}

/// Parse a reply.
pub fn decode_reply(bytes: &[u8]) -> Result<Reply, ProtoError> {
    Ok(serde_json::from_slice(bytes)?)
}
