// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Host implementations of the array server's compute kernels.
// Author: Lukas Bower

//! Host kernels backing `times2`, `gpuScan`, and `gpuSort`.

const RADIX_BITS: u32 = 8;
const BUCKETS: usize = 1 << RADIX_BITS;

/// Exclusive prefix combination: `out[0] = zero`, `out[i] = add(out[i-1], values[i-1])`.
pub fn exclusive_scan<T: Copy>(values: &[T], zero: T, add: impl Fn(T, T) -> T) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len());
    let mut running = zero;
    for &value in values {
        out.push(running);
        running = add(running, value);
    }
    out
}

/// Stable least-significant-digit radix sort on a `u64` key.
///
/// Passes whose digit is the same for every item are skipped.
pub fn radix_sort_by_key<T: Copy>(items: &[T], key: impl Fn(&T) -> u64) -> Vec<T> {
    let mut current = items.to_vec();
    let mut scratch = Vec::with_capacity(items.len());
    for pass in 0..(u64::BITS / RADIX_BITS) {
        let shift = pass * RADIX_BITS;
        let digit = |item: &T| ((key(item) >> shift) as usize) & (BUCKETS - 1);

        let mut counts = [0usize; BUCKETS];
        for item in &current {
            counts[digit(item)] += 1;
        }
        if counts.iter().any(|&count| count == current.len()) {
            continue;
        }
        let mut offsets = [0usize; BUCKETS];
        let mut total = 0;
        for (offset, count) in offsets.iter_mut().zip(counts) {
            *offset = total;
            total += count;
        }

        scratch.clear();
        scratch.resize(current.len(), current[0]);
        for item in &current {
            let slot = &mut offsets[digit(item)];
            scratch[*slot] = *item;
            *slot += 1;
        }
        std::mem::swap(&mut current, &mut scratch);
    }
    current
}

/// Stable ascending sort of `u64` values.
pub fn radix_sort(values: &[u64]) -> Vec<u64> {
    radix_sort_by_key(values, |value| *value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn scan_excludes_the_current_element() {
        let input = [5u64, 3, 7, 7, 5, 9, 0, 5, 9, 2];
        assert_eq!(
            exclusive_scan(&input, 0, u64::wrapping_add),
            vec![0, 5, 8, 15, 22, 27, 36, 36, 41, 50]
        );
        assert!(exclusive_scan::<u64>(&[], 0, u64::wrapping_add).is_empty());
    }

    #[test]
    fn sort_matches_reference() {
        assert_eq!(
            radix_sort(&[9, 8, 3, 6, 2, 0, 3, 9, 1, 9]),
            vec![0, 1, 2, 3, 3, 6, 8, 9, 9, 9]
        );
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let values: Vec<u64> = (0..2048).map(|_| rng.random()).collect();
        let mut expected = values.clone();
        expected.sort_unstable();
        assert_eq!(radix_sort(&values), expected);
    }

    #[test]
    fn equal_keys_keep_their_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let tagged: Vec<(u64, usize)> = (0..512)
            .map(|tag| (rng.random_range(0..16u64) << 40, tag))
            .collect();
        let sorted = radix_sort_by_key(&tagged, |(value, _)| *value);
        for pair in sorted.windows(2) {
            assert!(pair[0].0 <= pair[1].0);
            if pair[0].0 == pair[1].0 {
                assert!(pair[0].1 < pair[1].1);
            }
        }
    }
}
