// Author: Lukas Bower
// Purpose: Connect a configured gateway to the mock server over TCP.

use std::io::Write;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use array_gateway::{
    check_bigint_transfer, GatewayConfig, GatewayError, HostArray, MaxBits, Operation,
    TcpTransport, Transport, TransportError, Violation,
};
use array_proto::frame::{read_frame, write_frame};
use array_server_mock::{spawn, MockArrayServer};
use tempfile::NamedTempFile;

fn write_config(port: u16, extra: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[server]\nhost = \"127.0.0.1\"\nport = {port}\nio_timeout_ms = 5000\n{extra}"
    )
    .unwrap();
    file
}

#[test]
fn configured_gateway_runs_operations_over_tcp() {
    let server = Arc::new(MockArrayServer::new());
    let (addr, _thread) = spawn("127.0.0.1:0", Arc::clone(&server)).unwrap();
    let file = write_config(addr.port(), "");

    let config = GatewayConfig::load(file.path()).unwrap();
    assert_eq!(config.server.io_timeout(), Some(Duration::from_secs(5)));
    let mut gw = config.connect().unwrap();

    let input = gw
        .upload(&HostArray::UInt64(vec![9, 8, 3, 6, 2, 0, 3, 9, 1, 9]))
        .unwrap();
    let staged = gw.to_device(&input).unwrap();
    let scanned = gw.scan(&staged).unwrap();
    assert_eq!(
        gw.download(&scanned).unwrap(),
        HostArray::UInt64(vec![0, 9, 17, 20, 26, 28, 28, 31, 40, 41])
    );

    let report = check_bigint_transfer(&mut gw, 50, Some(3), MaxBits::bounded(96)).unwrap();
    assert!(report.passed(), "{report:?}");
    assert!(server.requests_served() >= 6);
}

#[test]
fn configured_rules_replace_the_standard_table() {
    let server = Arc::new(MockArrayServer::new());
    let (addr, _thread) = spawn("127.0.0.1:0", server).unwrap();
    let file = write_config(
        addr.port(),
        "[operations.sort]\nkinds = [\"uint64\"]\nresidency = \"device\"\non_empty = \"short-circuit\"\n",
    );
    let mut gw = GatewayConfig::load(file.path()).unwrap().connect().unwrap();
    let host = gw.upload(&HostArray::UInt64(vec![2, 1])).unwrap();
    let err = gw.sort(&host).unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Constraint {
            operation: Operation::Sort,
            violation: Violation::Residency { .. }
        }
    ));
}

#[test]
fn refused_connection_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let err = TcpTransport::connect("127.0.0.1", port, None).unwrap_err();
    assert!(matches!(err, TransportError::Connect { .. }));
}

#[test]
fn late_reply_is_never_handed_to_the_next_request() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        if read_frame(&mut stream).unwrap().is_some() {
            thread::sleep(Duration::from_millis(300));
            let _ = write_frame(&mut stream, b"reply-to-first");
        }
        if let Ok(Some(_)) = read_frame(&mut stream) {
            let _ = write_frame(&mut stream, b"reply-to-second");
        }
    });

    let mut transport =
        TcpTransport::connect("127.0.0.1", port, Some(Duration::from_millis(100))).unwrap();
    let first = transport.send(b"first");
    assert!(matches!(first, Err(TransportError::Io(_))), "{first:?}");
    assert!(transport.is_broken());

    thread::sleep(Duration::from_millis(400));
    let second = transport.send(b"second");
    assert!(matches!(second, Err(TransportError::Closed)), "{second:?}");
    server.join().unwrap();
}

#[test]
fn missing_config_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gateway.toml");
    let err = GatewayConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("gateway.toml"));
}
