// Author: Lukas Bower
// Purpose: Enumerate the logical element kinds of server-resident arrays.

//! Element kinds.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical numeric type of an array's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Signed 64-bit integers.
    Int64,
    /// Unsigned 64-bit integers.
    #[serde(rename = "uint64")]
    UInt64,
    /// IEEE-754 double precision.
    Float64,
    /// Arbitrary-precision integers, optionally bounded by `max_bits`.
    #[serde(rename = "bigint")]
    BigInt,
    /// Booleans; accepted by transfers but by no compute operation.
    Bool,
}

impl ElementKind {
    /// Every kind, in wire order.
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Int64,
        ElementKind::UInt64,
        ElementKind::Float64,
        ElementKind::BigInt,
        ElementKind::Bool,
    ];

    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float64 => "float64",
            Self::BigInt => "bigint",
            Self::Bool => "bool",
        }
    }

    /// Whether the kind is a fixed-width number (int64, uint64, float64).
    #[must_use]
    pub fn is_fixed_numeric(self) -> bool {
        matches!(self, Self::Int64 | Self::UInt64 | Self::Float64)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown element kind '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_serde() {
        for kind in ElementKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<ElementKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("complex128".parse::<ElementKind>().is_err());
    }
}
