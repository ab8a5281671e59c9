// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Round-trip and time bigint transfers against a live server.
// Author: Lukas Bower

//! Bigint transfer checks.

use std::time::{Duration, Instant};

use bigint_codec::{encode, wrap_values, BigInteger, Limbs, MaxBits};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Gateway, GatewayError, Transport};

/// Widest random value, in limbs.
pub const MAX_RANDOM_LIMBS: usize = 4;

const GIB: f64 = (1u64 << 30) as f64;

/// Outcome of one upload/download comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Values sent.
    pub size: usize,
    /// Bound the values were uploaded under.
    pub max_bits: MaxBits,
    /// Positions whose downloaded value differs from the expected one.
    pub mismatches: usize,
    /// First differing position.
    pub first_mismatch: Option<usize>,
}

impl TransferReport {
    /// Whether every value came back as expected.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }
}

/// Averages over timed transfer trials.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingReport {
    /// Values per trial.
    pub size: usize,
    /// Trials run.
    pub trials: usize,
    /// Limb bytes moved per transfer.
    pub payload_bytes: usize,
    /// Mean upload time.
    pub avg_upload: Duration,
    /// Mean download time.
    pub avg_download: Duration,
}

impl TimingReport {
    /// Upload throughput in GiB/s.
    #[must_use]
    pub fn upload_rate(&self) -> f64 {
        rate(self.payload_bytes, self.avg_upload)
    }

    /// Download throughput in GiB/s.
    #[must_use]
    pub fn download_rate(&self) -> f64 {
        rate(self.payload_bytes, self.avg_download)
    }
}

fn rate(bytes: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return 0.0;
    }
    bytes as f64 / GIB / secs
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Draw `size` values of one to [`MAX_RANDOM_LIMBS`] limbs with random sign.
pub fn random_bigints<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Vec<BigInteger> {
    (0..size)
        .map(|_| {
            let limb_count = rng.random_range(1..=MAX_RANDOM_LIMBS);
            let limbs = (0..limb_count).map(|_| rng.random::<u64>()).collect();
            BigInteger::from_parts(rng.random_bool(0.5), Limbs::from_le(limbs))
        })
        .collect()
}

/// Upload random values, download them, and compare with their wrapped form.
pub fn check_bigint_transfer<T: Transport>(
    gateway: &mut Gateway<T>,
    size: usize,
    seed: Option<u64>,
    max_bits: MaxBits,
) -> Result<TransferReport, GatewayError> {
    let values = random_bigints(&mut seeded(seed), size);
    let expected = wrap_values(&values, max_bits);
    let handle = gateway.upload_bigint(&values, max_bits)?;
    let actual = gateway.download_bigint(&handle)?;

    let mut mismatches = expected.len().abs_diff(actual.len());
    let mut first_mismatch = (mismatches > 0).then(|| expected.len().min(actual.len()));
    for (index, (want, got)) in expected.iter().zip(&actual).enumerate() {
        if want != got {
            mismatches += 1;
            first_mismatch = Some(first_mismatch.map_or(index, |first| first.min(index)));
        }
    }
    debug!("bigint transfer check: {size} values, {mismatches} mismatches");
    Ok(TransferReport {
        size,
        max_bits,
        mismatches,
        first_mismatch,
    })
}

/// Time `trials` upload/download cycles of `size` random values.
pub fn time_bigint_transfer<T: Transport>(
    gateway: &mut Gateway<T>,
    size: usize,
    trials: usize,
    seed: Option<u64>,
    max_bits: MaxBits,
) -> Result<TimingReport, GatewayError> {
    let values = random_bigints(&mut seeded(seed), size);
    let chunks = encode(&values, max_bits);
    let payload_bytes = chunks.len() * chunks.declared_limbs() * 8;

    let mut upload = Duration::ZERO;
    let mut download = Duration::ZERO;
    for trial in 0..trials {
        let start = Instant::now();
        let handle = gateway.upload_bigint(&values, max_bits)?;
        let up = start.elapsed();

        let start = Instant::now();
        gateway.download_bigint(&handle)?;
        let down = start.elapsed();
        debug!("trial {trial}: upload {up:?}, download {down:?}");
        upload += up;
        download += down;
    }
    let divisor = u32::try_from(trials.max(1)).unwrap_or(u32::MAX);
    Ok(TimingReport {
        size,
        trials,
        payload_bytes,
        avg_upload: upload / divisor,
        avg_download: download / divisor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_draws_same_values() {
        let a = random_bigints(&mut StdRng::seed_from_u64(7), 32);
        let b = random_bigints(&mut StdRng::seed_from_u64(7), 32);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| v.magnitude().len() <= MAX_RANDOM_LIMBS));
        assert!(a.iter().any(BigInteger::is_negative));
    }

    #[test]
    fn rate_handles_zero_duration() {
        assert_eq!(rate(1 << 30, Duration::ZERO), 0.0);
        assert!((rate(1 << 30, Duration::from_secs(2)) - 0.5).abs() < 1e-12);
    }
}
