// Author: Lukas Bower
// Purpose: Represent arbitrary-precision integers as little-endian 64-bit limb vectors.

//! Sign-magnitude integers over little-endian limb vectors with radix `2^64`.

use core::cmp::Ordering;
use core::fmt;
use core::ops::Neg;
use core::str::FromStr;

use crate::ParseBigIntegerError;

/// Bit width of a single limb. The limb radix is `2^LIMB_BITS`.
pub const LIMB_BITS: u32 = 64;

/// Largest power of ten that fits in one limb (`10^19`).
const DECIMAL_CHUNK: u64 = 10_000_000_000_000_000_000;
const DECIMAL_CHUNK_DIGITS: usize = 19;

/// Unsigned magnitude stored as little-endian 64-bit limbs.
///
/// Limb 0 is the least significant. The vector never ends in a zero limb, so
/// zero is the empty vector and equality is structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Limbs(Vec<u64>);

impl Limbs {
    /// The zero magnitude.
    #[must_use]
    pub fn zero() -> Self {
        Self(Vec::new())
    }

    /// Build a magnitude from little-endian limbs, dropping high zero limbs.
    #[must_use]
    pub fn from_le(limbs: Vec<u64>) -> Self {
        let mut value = Self(limbs);
        value.normalize();
        value
    }

    /// Borrow the limbs, least significant first.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Number of significant limbs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the magnitude is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Limb at `index`, or zero past the most significant limb.
    #[must_use]
    pub fn limb(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }

    /// Number of bits needed to represent the magnitude.
    #[must_use]
    pub fn bit_len(&self) -> u64 {
        match self.0.last() {
            None => 0,
            Some(top) => {
                (self.0.len() as u64 - 1) * u64::from(LIMB_BITS)
                    + u64::from(LIMB_BITS - top.leading_zeros())
            }
        }
    }

    /// Keep the low `bits` bits, i.e. `self mod 2^bits`.
    #[must_use]
    pub fn truncate_bits(&self, bits: u32) -> Self {
        let full = (bits / LIMB_BITS) as usize;
        let rem = bits % LIMB_BITS;
        let mut out: Vec<u64> = self.0.iter().copied().take(full).collect();
        if rem > 0 {
            if let Some(&partial) = self.0.get(full) {
                out.push(partial & ((1u64 << rem) - 1));
            }
        }
        Self::from_le(out)
    }

    /// `(2^bits - self) mod 2^bits`. `self` must already be below `2^bits`.
    #[must_use]
    pub fn negate_mod_pow2(&self, bits: u32) -> Self {
        let width = bits.div_ceil(LIMB_BITS) as usize;
        let mut out = Vec::with_capacity(width);
        let mut carry = 1u64;
        for index in 0..width {
            let (sum, overflow) = (!self.limb(index)).overflowing_add(carry);
            out.push(sum);
            carry = u64::from(overflow);
        }
        Self::from_le(out).truncate_bits(bits)
    }

    /// Shift left by `bits`.
    #[must_use]
    pub fn shl_bits(&self, bits: u32) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let limb_shift = (bits / LIMB_BITS) as usize;
        let bit_shift = bits % LIMB_BITS;
        let mut out = vec![0u64; limb_shift];
        if bit_shift == 0 {
            out.extend_from_slice(&self.0);
        } else {
            let mut carry = 0u64;
            for &limb in &self.0 {
                out.push((limb << bit_shift) | carry);
                carry = limb >> (LIMB_BITS - bit_shift);
            }
            if carry != 0 {
                out.push(carry);
            }
        }
        Self::from_le(out)
    }

    fn mul_small_add(&mut self, mul: u64, add: u64) {
        let mut carry = u128::from(add);
        for limb in &mut self.0 {
            let wide = u128::from(*limb) * u128::from(mul) + carry;
            *limb = wide as u64;
            carry = wide >> LIMB_BITS;
        }
        if carry != 0 {
            self.0.push(carry as u64);
        }
        self.normalize();
    }

    fn div_rem_small(&mut self, divisor: u64) -> u64 {
        let divisor = u128::from(divisor);
        let mut rem = 0u128;
        for limb in self.0.iter_mut().rev() {
            let wide = (rem << LIMB_BITS) | u128::from(*limb);
            *limb = (wide / divisor) as u64;
            rem = wide % divisor;
        }
        self.normalize();
        rem as u64
    }

    fn normalize(&mut self) {
        while self.0.last() == Some(&0) {
            self.0.pop();
        }
    }
}

impl From<u64> for Limbs {
    fn from(value: u64) -> Self {
        Self::from_le(vec![value])
    }
}

impl From<u128> for Limbs {
    fn from(value: u128) -> Self {
        Self::from_le(vec![value as u64, (value >> LIMB_BITS) as u64])
    }
}

impl Ord for Limbs {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.iter().rev().cmp(other.0.iter().rev()))
    }
}

impl PartialOrd for Limbs {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Signed arbitrary-precision integer. Zero is never negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BigInteger {
    negative: bool,
    magnitude: Limbs,
}

impl BigInteger {
    /// The value zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a value from a sign flag and magnitude.
    #[must_use]
    pub fn from_parts(negative: bool, magnitude: Limbs) -> Self {
        Self {
            negative: negative && !magnitude.is_zero(),
            magnitude,
        }
    }

    /// `2^bits`.
    #[must_use]
    pub fn pow2(bits: u32) -> Self {
        Self::from_parts(false, Limbs::from(1u64).shl_bits(bits))
    }

    /// Whether the value is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whether the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    /// Borrow the absolute value.
    #[must_use]
    pub fn magnitude(&self) -> &Limbs {
        &self.magnitude
    }

    /// Split into sign flag and magnitude.
    #[must_use]
    pub fn into_parts(self) -> (bool, Limbs) {
        (self.negative, self.magnitude)
    }

    /// Convert to `u64` when the value is non-negative and fits one limb.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        if self.negative || self.magnitude.len() > 1 {
            return None;
        }
        Some(self.magnitude.limb(0))
    }
}

impl From<u64> for BigInteger {
    fn from(value: u64) -> Self {
        Self::from_parts(false, Limbs::from(value))
    }
}

impl From<i64> for BigInteger {
    fn from(value: i64) -> Self {
        Self::from_parts(value < 0, Limbs::from(value.unsigned_abs()))
    }
}

impl From<u128> for BigInteger {
    fn from(value: u128) -> Self {
        Self::from_parts(false, Limbs::from(value))
    }
}

impl From<i128> for BigInteger {
    fn from(value: i128) -> Self {
        Self::from_parts(value < 0, Limbs::from(value.unsigned_abs()))
    }
}

impl Neg for BigInteger {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::from_parts(!self.negative, self.magnitude)
    }
}

impl Ord for BigInteger {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
        }
    }
}

impl PartialOrd for BigInteger {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for BigInteger {
    type Err = ParseBigIntegerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if digits.is_empty() {
            return Err(ParseBigIntegerError::Empty);
        }
        let mut magnitude = Limbs::zero();
        for ch in digits.chars() {
            let digit = ch
                .to_digit(10)
                .ok_or(ParseBigIntegerError::InvalidDigit(ch))?;
            magnitude.mul_small_add(10, u64::from(digit));
        }
        Ok(Self::from_parts(negative, magnitude))
    }
}

impl fmt::Display for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.magnitude.clone();
        let mut chunks = Vec::new();
        while !rest.is_zero() {
            chunks.push(rest.div_rem_small(DECIMAL_CHUNK));
        }
        let mut digits = match chunks.pop() {
            Some(top) => top.to_string(),
            None => "0".to_owned(),
        };
        for chunk in chunks.iter().rev() {
            digits.push_str(&format!("{chunk:0width$}", width = DECIMAL_CHUNK_DIGITS));
        }
        f.pad_integral(!self.negative, "", &digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_round_trip_beyond_one_limb() {
        let text = "-340282366920938463463374607431768211457";
        let value: BigInteger = text.parse().unwrap();
        assert!(value.is_negative());
        assert_eq!(value.magnitude().len(), 3);
        assert_eq!(value.to_string(), text);
    }

    #[test]
    fn pow2_matches_shifted_literal() {
        let value = BigInteger::pow2(200);
        assert_eq!(value.magnitude().bit_len(), 201);
        assert_eq!(
            value.to_string(),
            "1606938044258990275541962092341162602522202993782792835301376"
        );
    }

    #[test]
    fn zero_is_never_negative() {
        let value = -BigInteger::zero();
        assert!(!value.is_negative());
        assert_eq!(value, BigInteger::from(0u64));
        assert_eq!("-0".parse::<BigInteger>().unwrap(), BigInteger::zero());
    }

    #[test]
    fn ordering_accounts_for_sign() {
        let mut values = vec![
            BigInteger::from(5i64),
            BigInteger::from(-7i64),
            BigInteger::pow2(70),
            -BigInteger::pow2(70),
            BigInteger::zero(),
        ];
        values.sort();
        assert_eq!(values[0], -BigInteger::pow2(70));
        assert_eq!(values[1], BigInteger::from(-7i64));
        assert_eq!(values[2], BigInteger::zero());
        assert_eq!(values[4], BigInteger::pow2(70));
    }

    #[test]
    fn truncate_and_negate_stay_within_width() {
        let value = Limbs::from(u128::MAX);
        assert_eq!(value.truncate_bits(70), Limbs::from_le(vec![u64::MAX, 0x3f]));
        assert_eq!(value.truncate_bits(0), Limbs::zero());
        assert_eq!(Limbs::from(1u64).negate_mod_pow2(8), Limbs::from(255u64));
        assert_eq!(Limbs::zero().negate_mod_pow2(64), Limbs::zero());
        assert_eq!(
            Limbs::from(1u64).negate_mod_pow2(128),
            Limbs::from(u128::MAX)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<BigInteger>(), Err(ParseBigIntegerError::Empty));
        assert_eq!("-".parse::<BigInteger>(), Err(ParseBigIntegerError::Empty));
        assert_eq!(
            "12a".parse::<BigInteger>(),
            Err(ParseBigIntegerError::InvalidDigit('a'))
        );
    }
}
