//! Scenario tests for the link driven through its public API only.

use std::time::Duration;

use groduino_link::{
    checksum, ByteStream, ConnectionState, FrameCodec, FrameError, LinkConfig, LinkConnection,
    LinkError, MockStream, ACK, CONNECTION_FAILURE_NOTICE, ENQ, EOT, SOH,
};

fn fast_config() -> LinkConfig {
    LinkConfig {
        establish_timeout: Duration::from_millis(20),
        receive_timeout: Duration::from_millis(20),
        ..LinkConfig::default()
    }
}

// ============================================================================
// Checksum
// ============================================================================

#[test]
fn test_checksum_reference_values() {
    assert_eq!(checksum(b""), 0);
    assert_eq!(checksum(&[0x01]), 0x5E);
    assert_eq!(checksum(b"123456789"), 0xA1);
}

// ============================================================================
// Handshake
// ============================================================================

#[test]
fn test_host_accepts_then_framed_exchange() {
    let mut stream = MockStream::new();
    stream.inject_rx_data(&[ACK]);
    let mut link = LinkConnection::new(stream, fast_config());

    assert_eq!(link.establish().expect("handshake"), ConnectionState::Established);
    assert_eq!(link.get_mut().take_tx(), vec![ENQ, ACK]);

    link.get_mut().inject_rx_data(&FrameCodec::encode("ALPN 2 1"));
    assert_eq!(link.receive().expect("frame"), "ALPN 2 1");

    link.send("\"GTYP\":\"Response\",\"ALPN 2\":1,\"GEND\":0")
        .expect("send");
    let tx = link.get_mut().take_tx();
    assert_eq!(tx.first(), Some(&SOH));
    assert_eq!(tx.last(), Some(&EOT));
    assert_eq!(
        FrameCodec::decode(&tx).expect("valid frame"),
        "{\"GTYP\":\"Response\",\"ALPN 2\":1,\"GEND\":0},"
    );
}

#[test]
fn test_silent_host_falls_back_to_lines() {
    let mut link = LinkConnection::new(MockStream::new(), fast_config());

    let err = link.establish().unwrap_err();
    assert!(matches!(err, LinkError::HandshakeTimeout));
    assert!(!err.is_fatal());
    assert_eq!(link.state(), ConnectionState::Unestablished);

    let tx = link.get_mut().take_tx();
    let notice = format!("{}\r\n", CONNECTION_FAILURE_NOTICE);
    assert_eq!(&tx[1..], notice.as_bytes());

    // Outbound traffic is plain text from now on.
    link.send("\"GTYP\":\"Stream\",\"GEND\":0").expect("send");
    assert_eq!(
        link.get_mut().take_tx(),
        b"{\"GTYP\":\"Stream\",\"GEND\":0},\r\n".to_vec()
    );

    // Inbound traffic ends at the line feed.
    link.get_mut().inject_rx_data(b"AAHE 1 1\n");
    assert_eq!(link.receive().expect("line"), "AAHE 1 1");
}

#[test]
fn test_fallback_is_permanent() {
    let mut link = LinkConnection::new(MockStream::new(), fast_config());
    let _ = link.establish();

    link.get_mut().inject_rx_data(&[ACK]);
    assert_eq!(link.establish().expect("no-op"), ConnectionState::Unestablished);
    assert!(!link.is_established());
}

// ============================================================================
// Receive
// ============================================================================

#[test]
fn test_corrupted_frame_is_reported_then_link_recovers() {
    let mut stream = MockStream::new();
    stream.inject_rx_data(&[ACK]);
    let mut link = LinkConnection::new(stream, fast_config());
    link.establish().expect("handshake");

    let mut corrupted = FrameCodec::encode("AAHE 1 1");
    // Flip a body byte; the length still matches.
    corrupted[4] = b'B';
    link.get_mut().inject_rx_data(&corrupted);
    link.get_mut().inject_rx_data(&FrameCodec::encode("AAHE 1 0"));

    assert!(matches!(
        link.receive(),
        Err(LinkError::Frame(FrameError::ChecksumMismatch { .. }))
    ));
    assert_eq!(link.receive().expect("second frame"), "AAHE 1 0");
}

#[test]
fn test_available_reflects_pending_bytes() {
    let mut link = LinkConnection::new(MockStream::new(), fast_config());
    let _ = link.establish();

    assert!(!link.available().expect("available"));
    link.get_mut().inject_rx_data(b"x");
    assert!(link.available().expect("available"));
    assert!(link.get_mut().bytes_available().expect("stream"));
}

#[test]
fn test_peer_hangup_is_fatal() {
    let mut link = LinkConnection::new(MockStream::new(), fast_config());
    let _ = link.establish();
    link.get_mut().close();

    let err = link.receive().unwrap_err();
    assert!(matches!(err, LinkError::Closed));
    assert!(err.is_fatal());
}
