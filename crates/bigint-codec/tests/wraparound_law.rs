// Author: Lukas Bower
// Purpose: Property tests for the bigint transfer round-trip law.
#![forbid(unsafe_code)]

use bigint_codec::{decode, encode, BigInteger, Limbs, MaxBits};
use proptest::prelude::*;

fn low_mask(bits: u32) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

proptest! {
    #[test]
    fn bounded_round_trip_is_modular(values in proptest::collection::vec(any::<i128>(), 0..32), bits in 0u32..=128) {
        let input: Vec<BigInteger> = values.iter().copied().map(BigInteger::from).collect();
        let decoded = decode(&encode(&input, MaxBits::bounded(bits))).unwrap();
        let expected: Vec<BigInteger> = values
            .iter()
            .map(|&value| BigInteger::from((value as u128) & low_mask(bits)))
            .collect();
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn unbounded_round_trip_is_exact(
        raw in proptest::collection::vec((any::<bool>(), proptest::collection::vec(any::<u64>(), 0..6)), 0..32)
    ) {
        let input: Vec<BigInteger> = raw
            .into_iter()
            .map(|(negative, limbs)| BigInteger::from_parts(negative, Limbs::from_le(limbs)))
            .collect();
        let decoded = decode(&encode(&input, MaxBits::UNBOUNDED)).unwrap();
        prop_assert_eq!(decoded, input);
    }

    #[test]
    fn wide_bounds_keep_narrow_values(values in proptest::collection::vec(any::<u64>(), 0..16), bits in 64u32..512) {
        let input: Vec<BigInteger> = values.iter().copied().map(BigInteger::from).collect();
        let decoded = decode(&encode(&input, MaxBits::bounded(bits))).unwrap();
        prop_assert_eq!(decoded, input);
    }
}

#[test]
fn values_beyond_sixty_four_bits_survive_unbounded() {
    let input = vec![
        "123456789012345678901234567890123456789".parse::<BigInteger>().unwrap(),
        "-98765432109876543210987654321".parse::<BigInteger>().unwrap(),
        BigInteger::pow2(255),
    ];
    let chunks = encode(&input, MaxBits::UNBOUNDED);
    assert_eq!(chunks.declared_limbs(), 4);
    assert_eq!(decode(&chunks).unwrap(), input);
}

#[test]
fn two_to_the_max_bits_wraps_to_zero() {
    let input = vec![BigInteger::pow2(200), -BigInteger::pow2(200)];
    let decoded = decode(&encode(&input, MaxBits::bounded(200))).unwrap();
    assert_eq!(decoded, vec![BigInteger::zero(), BigInteger::zero()]);
}
