//! Tests for the TCP transport against a real loopback socket.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use groduino_link::{
    ByteStream, ConnectionState, FrameCodec, LinkConfig, LinkConnection, ACK, ENQ,
};
use groduino_runner::{Controller, ModuleConfig, RunnerConfig, TcpByteStream};
use serial_test::serial;

/// Helper to open a connected (controller, host) pair on loopback.
fn socket_pair() -> (TcpByteStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let host = thread::spawn(move || TcpStream::connect(addr).expect("host connect"));
    let device = TcpByteStream::accept(&listener).expect("accept host");
    (device, host.join().expect("host thread"))
}

fn fast_link() -> LinkConfig {
    LinkConfig {
        establish_timeout: Duration::from_millis(500),
        receive_timeout: Duration::from_millis(500),
        ..LinkConfig::default()
    }
}

// ============================================================================
// TcpByteStream
// ============================================================================

#[test]
#[serial]
fn test_read_byte_respects_deadline() {
    let (mut device, _host) = socket_pair();

    let start = Instant::now();
    let byte = device
        .read_byte(start + Duration::from_millis(50))
        .expect("read should not fail");

    assert_eq!(byte, None);
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
#[serial]
fn test_bytes_available_and_read() {
    let (mut device, mut host) = socket_pair();
    assert!(!device.bytes_available().expect("available"));

    host.write_all(b"ok").expect("host write");
    thread::sleep(Duration::from_millis(50));
    let deadline = Instant::now() + Duration::from_secs(1);
    assert_eq!(device.read_byte(deadline).expect("read"), Some(b'o'));
    assert!(device.bytes_available().expect("available"));
    assert_eq!(device.read_byte(deadline).expect("read"), Some(b'k'));
}

#[test]
#[serial]
fn test_host_hangup_is_eof() {
    let (mut device, host) = socket_pair();
    drop(host);

    let err = device
        .read_byte(Instant::now() + Duration::from_secs(1))
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
}

// ============================================================================
// Controller Over TCP
// ============================================================================

#[test]
#[serial]
fn test_controller_handshake_and_instruction_over_tcp() {
    let (device, mut host) = socket_pair();
    host.set_read_timeout(Some(Duration::from_secs(2)))
        .expect("host timeout");

    let config = RunnerConfig {
        modules: vec![ModuleConfig::relay("ALPN", 2, None)],
        ..RunnerConfig::default()
    };
    let link = LinkConnection::new(device, fast_link());
    let router = config.build_router().expect("router");
    let mut controller = Controller::new(link, router, Duration::from_secs(60));

    let host_side = thread::spawn(move || {
        let mut byte = [0u8; 1];
        host.read_exact(&mut byte).expect("ENQ");
        assert_eq!(byte[0], ENQ);
        host.write_all(&[ACK]).expect("send ACK");
        host.read_exact(&mut byte).expect("ACK echo");
        assert_eq!(byte[0], ACK);
        host
    });

    assert_eq!(controller.start().expect("start"), ConnectionState::Established);
    let mut host = host_side.join().expect("host thread");

    host.write_all(&FrameCodec::encode("ALPN 2 1"))
        .expect("send instruction");
    thread::sleep(Duration::from_millis(50));
    let report = controller.run_cycle(Instant::now()).expect("cycle");
    assert_eq!(report.responses, 1);

    let mut codec = FrameCodec::new();
    let mut bodies = Vec::new();
    let mut chunk = [0u8; 256];
    while bodies.len() < 2 {
        let n = host.read(&mut chunk).expect("host read");
        assert!(n > 0, "controller closed the connection");
        codec.push(&chunk[..n]);
        while let Some(body) = codec.decode_next() {
            bodies.push(body.expect("valid frame"));
        }
    }

    assert_eq!(
        bodies,
        vec![
            "{\"GTYP\":\"Response\",\"ALPN 2\":1,\"GEND\":0},".to_string(),
            "{\"GTYP\":\"Stream\",\"ALPN 2\":1,\"GEND\":0},".to_string(),
        ]
    );
}
