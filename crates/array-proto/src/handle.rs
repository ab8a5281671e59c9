// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Describe server-resident arrays through lightweight local handles.
// Author: Lukas Bower

//! Array handles and operands.
//!
//! A handle holds no element data. Its kind and residency are fixed when it
//! is built; operations that change either hand back a new handle.

use core::fmt;

use bigint_codec::MaxBits;
use serde::{Deserialize, Serialize};

use crate::ElementKind;

const UNBACKED_REF: &str = "unbacked";

/// Opaque identifier the server uses to locate an array's storage.
///
/// The client only compares references and hands them to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerRef(String);

impl ServerRef {
    /// Wrap a server-issued identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Reference carried by locally synthesised empty arrays.
    #[must_use]
    pub fn unbacked() -> Self {
        Self(UNBACKED_REF.to_owned())
    }

    /// Whether this reference names no server storage.
    #[must_use]
    pub fn is_unbacked(&self) -> bool {
        self.0 == UNBACKED_REF
    }

    /// Borrow the identifier for hand-off to the transport.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local descriptor of a server-resident array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayHandle {
    server_ref: ServerRef,
    kind: ElementKind,
    size: usize,
    on_device: bool,
    max_bits: Option<MaxBits>,
}

impl ArrayHandle {
    /// Describe an array the server already holds.
    ///
    /// Bigint handles built this way are unbounded; use [`ArrayHandle::bigint`]
    /// to attach a bound.
    #[must_use]
    pub fn new(server_ref: ServerRef, kind: ElementKind, size: usize, on_device: bool) -> Self {
        let max_bits = (kind == ElementKind::BigInt).then_some(MaxBits::UNBOUNDED);
        Self {
            server_ref,
            kind,
            size,
            on_device,
            max_bits,
        }
    }

    /// Describe a bigint array with the given bound.
    #[must_use]
    pub fn bigint(server_ref: ServerRef, size: usize, on_device: bool, max_bits: MaxBits) -> Self {
        Self {
            server_ref,
            kind: ElementKind::BigInt,
            size,
            on_device,
            max_bits: Some(max_bits),
        }
    }

    /// Synthesise an empty host-resident array of `kind` without server storage.
    #[must_use]
    pub fn empty(kind: ElementKind) -> Self {
        Self::new(ServerRef::unbacked(), kind, 0, false)
    }

    /// Empty array with the same kind, residency, and bound as `self`.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            server_ref: ServerRef::unbacked(),
            kind: self.kind,
            size: 0,
            on_device: self.on_device,
            max_bits: self.max_bits,
        }
    }

    /// Server-side identifier.
    #[must_use]
    pub fn server_ref(&self) -> &ServerRef {
        &self.server_ref
    }

    /// Element kind.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Logical element count.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the array holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Whether the array currently lives in accelerator memory.
    #[must_use]
    pub fn on_device(&self) -> bool {
        self.on_device
    }

    /// Bit bound for bigint arrays; `None` for every other kind.
    #[must_use]
    pub fn max_bits(&self) -> Option<MaxBits> {
        self.max_bits
    }
}

impl fmt::Display for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let residency = if self.on_device { "device" } else { "host" };
        write!(
            f,
            "{} {}[{}] on {residency}",
            self.server_ref, self.kind, self.size
        )
    }
}

/// Scalar result or argument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarValue {
    /// Signed 64-bit value.
    Int64(i64),
    /// Unsigned 64-bit value.
    #[serde(rename = "uint64")]
    UInt64(u64),
    /// Double precision value.
    Float64(f64),
    /// Boolean value.
    Bool(bool),
}

impl ScalarValue {
    /// Element kind matching the scalar.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Int64(_) => ElementKind::Int64,
            Self::UInt64(_) => ElementKind::UInt64,
            Self::Float64(_) => ElementKind::Float64,
            Self::Bool(_) => ElementKind::Bool,
        }
    }
}

/// Anything a caller may pass where an operation expects an argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Server-resident array.
    Array(ArrayHandle),
    /// Local scalar.
    Scalar(ScalarValue),
}

impl Operand {
    /// Short description used in usage errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Array(handle) => format!("array {handle}"),
            Self::Scalar(value) => format!("{} scalar", value.kind()),
        }
    }
}

impl From<ArrayHandle> for Operand {
    fn from(handle: ArrayHandle) -> Self {
        Self::Array(handle)
    }
}

impl From<&ArrayHandle> for Operand {
    fn from(handle: &ArrayHandle) -> Self {
        Self::Array(handle.clone())
    }
}

impl From<ScalarValue> for Operand {
    fn from(value: ScalarValue) -> Self {
        Self::Scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bigint_handles_carry_a_bound() {
        let plain = ArrayHandle::new(ServerRef::new("id_1"), ElementKind::UInt64, 4, true);
        assert_eq!(plain.max_bits(), None);
        let big = ArrayHandle::new(ServerRef::new("id_2"), ElementKind::BigInt, 4, false);
        assert_eq!(big.max_bits(), Some(MaxBits::UNBOUNDED));
    }

    #[test]
    fn empty_like_keeps_kind_and_residency() {
        let handle =
            ArrayHandle::bigint(ServerRef::new("id_9"), 12, true, MaxBits::bounded(128));
        let empty = handle.empty_like();
        assert!(empty.is_empty());
        assert!(empty.server_ref().is_unbacked());
        assert_eq!(empty.kind(), ElementKind::BigInt);
        assert!(empty.on_device());
        assert_eq!(empty.max_bits(), Some(MaxBits::bounded(128)));
    }

    #[test]
    fn operand_descriptions_name_the_variant() {
        let scalar = Operand::from(ScalarValue::Float64(1.5));
        assert_eq!(scalar.describe(), "float64 scalar");
        let array = Operand::from(ArrayHandle::empty(ElementKind::Int64));
        assert_eq!(array.describe(), "array unbacked int64[0] on host");
    }
}
