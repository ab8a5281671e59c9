// Author: Lukas Bower
// Purpose: Apply max_bits wraparound to arbitrary-precision values ahead of limb packing.

//! Bounded-width wraparound.

use core::fmt;

use crate::{BigInteger, CodecError};

/// Optional bit-width bound for a bigint array.
///
/// On the wire the bound is an `i64` where any negative value (canonically `-1`)
/// means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MaxBits(Option<u32>);

impl MaxBits {
    /// No bound: values are transferred exactly.
    pub const UNBOUNDED: MaxBits = MaxBits(None);

    /// Bound values to `bits` bits.
    #[must_use]
    pub fn bounded(bits: u32) -> Self {
        Self(Some(bits))
    }

    /// Parse the wire representation.
    pub fn from_wire(raw: i64) -> Result<Self, CodecError> {
        if raw < 0 {
            return Ok(Self::UNBOUNDED);
        }
        u32::try_from(raw)
            .map(Self::bounded)
            .map_err(|_| CodecError::InvalidMaxBits(raw))
    }

    /// Wire representation, `-1` when unbounded.
    #[must_use]
    pub fn to_wire(self) -> i64 {
        self.0.map_or(-1, i64::from)
    }

    /// Bound in bits, if any.
    #[must_use]
    pub fn bits(self) -> Option<u32> {
        self.0
    }

    /// Whether a bound is set.
    #[must_use]
    pub fn is_bounded(self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for MaxBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

/// Reduce `value` into `[0, 2^bits)` when `max_bits` is bounded.
#[must_use]
pub fn wrap_value(value: &BigInteger, max_bits: MaxBits) -> BigInteger {
    let Some(bits) = max_bits.bits() else {
        return value.clone();
    };
    let low = value.magnitude().truncate_bits(bits);
    if value.is_negative() && !low.is_zero() {
        BigInteger::from_parts(false, low.negate_mod_pow2(bits))
    } else {
        BigInteger::from_parts(false, low)
    }
}

/// Apply [`wrap_value`] to every element.
#[must_use]
pub fn wrap_values(values: &[BigInteger], max_bits: MaxBits) -> Vec<BigInteger> {
    values
        .iter()
        .map(|value| wrap_value(value, max_bits))
        .collect()
}

/// Bound to use when two bigint arrays meet: the smaller positive bound wins.
///
/// A zero bound is ignored, matching how arrays created without a meaningful
/// bound are treated by the server.
#[must_use]
pub fn merge_max_bits(lhs: MaxBits, rhs: MaxBits) -> MaxBits {
    let positive = |bits: MaxBits| bits.bits().filter(|&value| value > 0);
    match (positive(lhs), positive(rhs)) {
        (Some(a), Some(b)) => MaxBits::bounded(a.min(b)),
        (Some(a), None) | (None, Some(a)) => MaxBits::bounded(a),
        (None, None) => MaxBits::UNBOUNDED,
    }
}
