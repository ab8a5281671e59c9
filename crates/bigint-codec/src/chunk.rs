// Author: Lukas Bower
// Purpose: Decompose bigint batches into limb groups and reassemble them with structural checks.

//! Limb-group chunk sets.
//!
//! A chunk set is columnar: group `k` holds limb `k` of every element, so each
//! group is as long as the batch. The limb count is the widest element's limb
//! count; narrower elements are padded with zero limbs.

use crate::{wrap_values, BigInteger, CodecError, Limbs, MaxBits};

/// Limb-group representation of one bigint transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSet {
    max_bits: MaxBits,
    len: usize,
    declared_limbs: usize,
    signs: Vec<bool>,
    groups: Vec<Vec<u64>>,
}

impl ChunkSet {
    /// Assemble a chunk set from raw parts without checking them.
    ///
    /// Used by frame decoding and by tests that need inconsistent sets;
    /// [`ChunkSet::verify`] runs before any value is rebuilt.
    #[must_use]
    pub fn from_parts(
        max_bits: MaxBits,
        len: usize,
        declared_limbs: usize,
        signs: Vec<bool>,
        groups: Vec<Vec<u64>>,
    ) -> Self {
        Self {
            max_bits,
            len,
            declared_limbs,
            signs,
            groups,
        }
    }

    /// Transfer-level bound the values were reduced by.
    #[must_use]
    pub fn max_bits(&self) -> MaxBits {
        self.max_bits
    }

    /// Number of logical elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set carries no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Limb count declared for every element.
    #[must_use]
    pub fn declared_limbs(&self) -> usize {
        self.declared_limbs
    }

    /// Per-element sign lane.
    #[must_use]
    pub fn signs(&self) -> &[bool] {
        &self.signs
    }

    /// Limb groups, least significant first.
    #[must_use]
    pub fn groups(&self) -> &[Vec<u64>] {
        &self.groups
    }

    /// Check the declared shape against the carried data.
    pub fn verify(&self) -> Result<(), CodecError> {
        if self.groups.len() != self.declared_limbs {
            return Err(CodecError::LimbCountMismatch {
                declared: self.declared_limbs,
                actual: self.groups.len(),
            });
        }
        for (group, limbs) in self.groups.iter().enumerate() {
            if limbs.len() != self.len {
                return Err(CodecError::GroupLengthMismatch {
                    group,
                    declared: self.len,
                    actual: limbs.len(),
                });
            }
        }
        if self.signs.len() != self.len {
            return Err(CodecError::SignLaneMismatch {
                declared: self.len,
                actual: self.signs.len(),
            });
        }
        if self.max_bits.is_bounded() {
            if let Some(index) = self.signs.iter().position(|&negative| negative) {
                return Err(CodecError::NegativeInBoundedTransfer { index });
            }
        }
        Ok(())
    }

    /// Rebuild every value as the positional sum of its limbs.
    ///
    /// No masking happens here; a bounded set was already reduced when encoded.
    pub fn decode(&self) -> Result<Vec<BigInteger>, CodecError> {
        self.verify()?;
        let values = (0..self.len)
            .map(|index| {
                let limbs = self.groups.iter().map(|group| group[index]).collect();
                BigInteger::from_parts(self.signs[index], Limbs::from_le(limbs))
            })
            .collect();
        Ok(values)
    }
}

/// Pack values into limb groups without applying any bound.
///
/// `max_bits` is recorded on the set; callers that want wraparound go through
/// [`encode`], which reduces first.
#[must_use]
pub fn decompose(values: &[BigInteger], max_bits: MaxBits) -> ChunkSet {
    let width = values
        .iter()
        .map(|value| value.magnitude().len())
        .max()
        .unwrap_or(0);
    let groups = (0..width)
        .map(|limb| {
            values
                .iter()
                .map(|value| value.magnitude().limb(limb))
                .collect()
        })
        .collect();
    let signs = values.iter().map(BigInteger::is_negative).collect();
    ChunkSet::from_parts(max_bits, values.len(), width, signs, groups)
}

/// Reduce values by `max_bits`, then pack them into limb groups.
#[must_use]
pub fn encode(values: &[BigInteger], max_bits: MaxBits) -> ChunkSet {
    decompose(&wrap_values(values, max_bits), max_bits)
}

/// Rebuild the values carried by `chunks`.
pub fn decode(chunks: &ChunkSet) -> Result<Vec<BigInteger>, CodecError> {
    chunks.decode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_values_are_zero_padded() {
        let values = vec![BigInteger::from(7u64), BigInteger::pow2(130)];
        let chunks = encode(&values, MaxBits::UNBOUNDED);
        assert_eq!(chunks.declared_limbs(), 3);
        assert_eq!(chunks.groups()[0], vec![7, 0]);
        assert_eq!(chunks.groups()[1], vec![0, 0]);
        assert_eq!(chunks.groups()[2], vec![0, 4]);
        assert_eq!(decode(&chunks).unwrap(), values);
    }

    #[test]
    fn empty_batch_has_no_groups() {
        let chunks = encode(&[], MaxBits::bounded(64));
        assert!(chunks.is_empty());
        assert_eq!(chunks.declared_limbs(), 0);
        assert!(decode(&chunks).unwrap().is_empty());
    }

    #[test]
    fn decompose_does_not_reduce() {
        let values = vec![BigInteger::pow2(100)];
        let chunks = decompose(&values, MaxBits::bounded(64));
        assert_eq!(chunks.declared_limbs(), 2);
        let reduced = encode(&values, MaxBits::bounded(64));
        assert_eq!(reduced.declared_limbs(), 0);
        assert_eq!(decode(&reduced).unwrap(), vec![BigInteger::zero()]);
    }

    #[test]
    fn missing_group_is_corruption() {
        let chunks = ChunkSet::from_parts(
            MaxBits::UNBOUNDED,
            2,
            3,
            vec![false, false],
            vec![vec![1, 2], vec![3, 4]],
        );
        assert_eq!(
            decode(&chunks),
            Err(CodecError::LimbCountMismatch {
                declared: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn short_group_is_corruption() {
        let chunks = ChunkSet::from_parts(
            MaxBits::UNBOUNDED,
            2,
            2,
            vec![false, false],
            vec![vec![1, 2], vec![3]],
        );
        assert_eq!(
            decode(&chunks),
            Err(CodecError::GroupLengthMismatch {
                group: 1,
                declared: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn negative_sign_in_bounded_set_is_corruption() {
        let chunks =
            ChunkSet::from_parts(MaxBits::bounded(8), 1, 1, vec![true], vec![vec![1]]);
        assert_eq!(
            decode(&chunks),
            Err(CodecError::NegativeInBoundedTransfer { index: 0 })
        );
    }
}
