// Author: Lukas Bower
// Purpose: Bigint upload/download through the gateway, including wraparound and corruption.

mod common;

use std::str::FromStr;

use array_gateway::{
    check_bigint_transfer, time_bigint_transfer, BigInteger, ElementKind, Gateway, GatewayError,
    MaxBits, Transport, TransportError,
};
use array_proto::{decode_reply, encode_reply, BigintPayload, Reply, ReplyPayload};
use array_server_mock::MockArrayServer;
use common::{calls, gateway};

fn big(text: &str) -> BigInteger {
    BigInteger::from_str(text).unwrap()
}

#[test]
fn unbounded_values_wider_than_a_limb_survive_exactly() {
    let mut gw = gateway();
    let values = vec![
        big("340282366920938463463374607431768211457"),
        big("-18446744073709551617"),
        BigInteger::zero(),
        big("12345"),
    ];
    let handle = gw.upload_bigint(&values, MaxBits::UNBOUNDED).unwrap();
    assert_eq!(handle.kind(), ElementKind::BigInt);
    assert_eq!(handle.size(), 4);
    assert_eq!(handle.max_bits(), Some(MaxBits::UNBOUNDED));
    assert_eq!(gw.download_bigint(&handle).unwrap(), values);
}

#[test]
fn bounded_upload_wraps_modulo_power_of_two() {
    let mut gw = gateway();
    let values = vec![big("-1"), BigInteger::pow2(128), big("18446744073709551621")];
    let handle = gw.upload_bigint(&values, MaxBits::bounded(64)).unwrap();
    assert_eq!(handle.max_bits(), Some(MaxBits::bounded(64)));
    assert_eq!(
        gw.download_bigint(&handle).unwrap(),
        vec![BigInteger::from(u64::MAX), BigInteger::zero(), BigInteger::from(5u64)]
    );
}

#[test]
fn fixed_width_download_rejects_bigint_handles() {
    let mut gw = gateway();
    let handle = gw
        .upload_bigint(&[BigInteger::from(3u64)], MaxBits::UNBOUNDED)
        .unwrap();
    let before = calls(&gw);
    assert!(matches!(
        gw.download(&handle),
        Err(GatewayError::Constraint { .. })
    ));
    assert_eq!(calls(&gw), before);
}

#[test]
fn correctness_check_passes_for_bounded_and_unbounded() {
    let mut gw = gateway();
    for max_bits in [MaxBits::UNBOUNDED, MaxBits::bounded(64), MaxBits::bounded(100), MaxBits::bounded(0)] {
        let report = check_bigint_transfer(&mut gw, 200, Some(11), max_bits).unwrap();
        assert!(report.passed(), "{max_bits}: {report:?}");
        assert_eq!(report.size, 200);
        assert_eq!(report.first_mismatch, None);
    }
}

#[test]
fn timing_reports_average_over_trials() {
    let mut gw = gateway();
    let report = time_bigint_transfer(&mut gw, 64, 3, Some(5), MaxBits::bounded(128)).unwrap();
    assert_eq!(report.trials, 3);
    assert_eq!(report.payload_bytes, 64 * 2 * 8);
    assert_eq!(calls(&gw), 6);
}

/// Forwards to the mock server and tampers with bigint replies.
struct Tampering {
    server: MockArrayServer,
    mutate: fn(&mut BigintPayload),
}

impl Transport for Tampering {
    fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let raw = self.server.handle_bytes(request);
        let Ok(Reply::Result(ReplyPayload::Bigint(mut payload))) = decode_reply(&raw) else {
            return Ok(raw);
        };
        (self.mutate)(&mut payload);
        Ok(encode_reply(&Reply::Result(ReplyPayload::Bigint(payload))).unwrap())
    }
}

fn tampered(mutate: fn(&mut BigintPayload)) -> Result<Vec<BigInteger>, GatewayError> {
    let mut gw = Gateway::new(Tampering {
        server: MockArrayServer::new(),
        mutate,
    });
    let handle = gw
        .upload_bigint(&[BigInteger::pow2(90), BigInteger::from(7u64)], MaxBits::UNBOUNDED)
        .unwrap();
    gw.download_bigint(&handle)
}

#[test]
fn digest_mismatch_is_corruption() {
    let result = tampered(|payload| {
        let mut hash = payload.bytes_hash.clone().into_bytes();
        let last = hash.len() - 1;
        hash[last] = if hash[last] == b'0' { b'1' } else { b'0' };
        payload.bytes_hash = String::from_utf8(hash).unwrap();
    });
    assert!(matches!(result, Err(GatewayError::Corruption(_))));
}

#[test]
fn short_payload_is_corruption_not_partial_output() {
    let result = tampered(|payload| {
        *payload = BigintPayload::from_values(&[BigInteger::from(1u64)], MaxBits::UNBOUNDED).unwrap();
    });
    assert!(matches!(result, Err(GatewayError::Corruption(_))));
}
