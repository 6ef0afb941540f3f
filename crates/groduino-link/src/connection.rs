//! Link connection state machine.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐   ACK within establish timeout   ┌─────────────┐
//! │ Unestablished │─────────────────────────────────>│ Established │
//! └───────────────┘                                  └─────────────┘
//!         │ timeout
//!         ↓
//!   stays Unestablished (unframed fallback) for the process lifetime
//! ```
//!
//! The handshake is attempted once. There is no path back from Established
//! and a lost host is not detected afterwards.
//!
//! # Modes
//!
//! - **Established**: messages are framed with [`FrameCodec`]; `receive`
//!   reads up to `EOT` and validates the frame.
//! - **Unestablished**: messages are plain text; `send` appends a line ending
//!   and `receive` reads up to `'\n'`.
//!
//! In both modes `send` wraps the payload as `{payload},` first.

use std::time::{Duration, Instant};

use bytes::BytesMut;
use groduino_metrics::metric_defs::{
    LINK_DECODE_FAILURES, LINK_ESTABLISHED, LINK_FRAMES_SENT, LINK_HANDSHAKES, LINK_LINES_SENT,
    LINK_PAYLOADS_RECEIVED, LINK_RECEIVE_TIMEOUTS,
};
use groduino_metrics::metrics;

use crate::constants::{
    is_sentinel, ACK, CONNECTION_FAILURE_NOTICE, DEFAULT_BAUD_RATE, DEFAULT_ESTABLISH_TIMEOUT,
    DEFAULT_RECEIVE_TIMEOUT, ENQ, EOT, LINE_ENDING, LINE_FEED, MAX_MESSAGE_SIZE, MESSAGE_CLOSE,
    MESSAGE_OPEN,
};
use crate::error::{LinkError, LinkResult};
use crate::frame::FrameCodec;
use crate::stream::ByteStream;

/// Link timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// How long to wait for the host's `ACK` after sending `ENQ`.
    pub establish_timeout: Duration,
    /// How long a single `receive` may block.
    pub receive_timeout: Duration,
    /// Line rate a serial transport is opened at. Streams with no notion of
    /// baud rate ignore it.
    pub baud_rate: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            establish_timeout: DEFAULT_ESTABLISH_TIMEOUT,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Handshake state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No handshake completed; traffic is unframed.
    Unestablished,
    /// Handshake completed; traffic is framed and checksummed.
    Established,
}

/// The device end of the serial link.
///
/// Owns the byte stream exclusively for its whole lifetime.
#[derive(Debug)]
pub struct LinkConnection<S> {
    stream: S,
    config: LinkConfig,
    state: ConnectionState,
    handshake_attempted: bool,
    codec: FrameCodec,
    /// Set while the rest of an oversized unframed line is being dropped.
    discarding_line: bool,
}

impl<S: ByteStream> LinkConnection<S> {
    /// Create a link over `stream`. No bytes are exchanged until
    /// [`establish`](Self::establish) is called.
    pub fn new(stream: S, config: LinkConfig) -> Self {
        LinkConnection {
            stream,
            config,
            state: ConnectionState::Unestablished,
            handshake_attempted: false,
            codec: FrameCodec::new(),
            discarding_line: false,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns true once the handshake has succeeded.
    pub fn is_established(&self) -> bool {
        self.state == ConnectionState::Established
    }

    /// Link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    ///
    /// Writing to the stream directly bypasses framing.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the link and return the stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Run the three-way handshake: send `ENQ`, wait for `ACK`, answer `ACK`.
    ///
    /// Bytes other than `ACK` received while waiting are discarded. On
    /// timeout the link writes a one-line notice, stays unframed for good and
    /// returns [`LinkError::HandshakeTimeout`], which callers should treat as
    /// non-fatal. Calling this again after the first attempt is a no-op.
    pub fn establish(&mut self) -> LinkResult<ConnectionState> {
        if self.handshake_attempted {
            return Ok(self.state);
        }
        self.handshake_attempted = true;

        self.stream.write_all(&[ENQ])?;
        let deadline = Instant::now() + self.config.establish_timeout;

        loop {
            match self.read_byte(deadline)? {
                Some(ACK) => {
                    self.stream.write_all(&[ACK])?;
                    self.state = ConnectionState::Established;
                    log::info!("link established; framing enabled");
                    metrics::counter!(LINK_HANDSHAKES.name, "outcome" => "established").increment(1);
                    metrics::gauge!(LINK_ESTABLISHED.name).set(1.0);
                    return Ok(self.state);
                }
                Some(other) => {
                    log::trace!("ignoring byte 0x{:02X} while awaiting ACK", other);
                    if Instant::now() >= deadline {
                        break;
                    }
                }
                None => break,
            }
        }

        log::warn!(
            "host did not acknowledge within {:?}; continuing unframed",
            self.config.establish_timeout
        );
        metrics::counter!(LINK_HANDSHAKES.name, "outcome" => "timeout").increment(1);
        metrics::gauge!(LINK_ESTABLISHED.name).set(0.0);
        self.write_line(CONNECTION_FAILURE_NOTICE)?;
        Err(LinkError::HandshakeTimeout)
    }

    /// Send one message, wrapped as `{payload},`.
    ///
    /// The payload must not contain protocol control characters; this is
    /// logged but not prevented.
    pub fn send(&mut self, payload: &str) -> LinkResult<()> {
        let message = format!("{MESSAGE_OPEN}{payload}{MESSAGE_CLOSE}");

        match self.state {
            ConnectionState::Established => {
                if message.bytes().any(is_sentinel) {
                    log::warn!("payload contains control characters; frame will be corrupt");
                }
                let frame = FrameCodec::encode(&message);
                log::trace!("tx frame ({} bytes)", frame.len());
                self.stream.write_all(&frame)?;
                metrics::counter!(LINK_FRAMES_SENT.name).increment(1);
            }
            ConnectionState::Unestablished => {
                self.write_line(&message)?;
                metrics::counter!(LINK_LINES_SENT.name).increment(1);
            }
        }
        Ok(())
    }

    /// Returns true if inbound bytes are waiting.
    pub fn available(&mut self) -> LinkResult<bool> {
        self.stream.bytes_available().map_err(map_stream_error)
    }

    /// Receive one message, blocking for at most the receive timeout.
    ///
    /// Established links return the validated frame body; unframed links
    /// return the line without its terminator. A timeout discards whatever
    /// was partially received.
    pub fn receive(&mut self) -> LinkResult<String> {
        let deadline = Instant::now() + self.config.receive_timeout;
        let result = match self.state {
            ConnectionState::Established => self.receive_frame(deadline),
            ConnectionState::Unestablished => self.receive_line(deadline),
        };

        match &result {
            Ok(_) => metrics::counter!(LINK_PAYLOADS_RECEIVED.name).increment(1),
            Err(LinkError::ReceiveTimeout) => {
                log::debug!("receive timed out after {:?}", self.config.receive_timeout);
                metrics::counter!(LINK_RECEIVE_TIMEOUTS.name).increment(1);
            }
            Err(LinkError::Frame(err)) => {
                log::debug!("discarding frame: {}", err);
                metrics::counter!(LINK_DECODE_FAILURES.name, "reason" => err.reason()).increment(1);
            }
            Err(_) => {}
        }
        result
    }

    fn receive_frame(&mut self, deadline: Instant) -> LinkResult<String> {
        loop {
            let Some(byte) = self.read_byte(deadline)? else {
                self.codec.clear();
                return Err(LinkError::ReceiveTimeout);
            };

            self.codec.push(&[byte]);
            if byte == EOT {
                if let Some(decoded) = self.codec.decode_next() {
                    return decoded.map_err(LinkError::from);
                }
            }
            if self.codec.buffered_len() > MAX_MESSAGE_SIZE {
                self.codec.clear();
                return Err(LinkError::Overflow {
                    max: MAX_MESSAGE_SIZE,
                });
            }
        }
    }

    fn receive_line(&mut self, deadline: Instant) -> LinkResult<String> {
        if self.discarding_line && !self.skip_line(deadline)? {
            return Err(LinkError::ReceiveTimeout);
        }

        let mut line = BytesMut::new();
        loop {
            let Some(byte) = self.read_byte(deadline)? else {
                return Err(LinkError::ReceiveTimeout);
            };

            if byte == LINE_FEED {
                let text = line.strip_suffix(b"\r").unwrap_or(&line[..]);
                return String::from_utf8(text.to_vec()).map_err(|_| LinkError::InvalidUtf8);
            }
            if line.len() >= MAX_MESSAGE_SIZE {
                log::debug!("line exceeds {} bytes; dropping it", MAX_MESSAGE_SIZE);
                self.discarding_line = true;
                self.skip_line(deadline)?;
                return Err(LinkError::Overflow {
                    max: MAX_MESSAGE_SIZE,
                });
            }
            line.extend_from_slice(&[byte]);
        }
    }

    /// Drop bytes through the next line feed.
    ///
    /// Returns false if the deadline passed first; the line is then still
    /// being dropped on the next receive.
    fn skip_line(&mut self, deadline: Instant) -> LinkResult<bool> {
        while let Some(byte) = self.read_byte(deadline)? {
            if byte == LINE_FEED {
                self.discarding_line = false;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn write_line(&mut self, text: &str) -> LinkResult<()> {
        self.stream.write_all(text.as_bytes())?;
        self.stream.write_all(LINE_ENDING.as_bytes())?;
        Ok(())
    }

    fn read_byte(&mut self, deadline: Instant) -> LinkResult<Option<u8>> {
        self.stream.read_byte(deadline).map_err(map_stream_error)
    }
}

fn map_stream_error(err: std::io::Error) -> LinkError {
    match err.kind() {
        std::io::ErrorKind::UnexpectedEof => LinkError::Closed,
        _ => LinkError::Io(err),
    }
}
