//! Byte stream abstraction the link is driven over.
//!
//! The link owns exactly one stream for the life of the process. Reads are
//! blocking but bounded by an explicit deadline, so the link can enforce its
//! handshake and receive timeouts without a scheduler.

use std::collections::VecDeque;
use std::io;
use std::time::Instant;

/// A bidirectional serial byte stream.
///
/// # Invariants
///
/// - Only the [`LinkConnection`](crate::LinkConnection) that owns the stream
///   reads from or writes to it.
/// - Modules attached to the controller never share this stream.
pub trait ByteStream {
    /// Write all of `data` to the stream.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read one byte, blocking no later than `deadline`.
    ///
    /// Returns `Ok(None)` when the deadline passes with nothing received.
    /// A closed stream is reported as [`io::ErrorKind::UnexpectedEof`].
    fn read_byte(&mut self, deadline: Instant) -> io::Result<Option<u8>>;

    /// Returns true if at least one byte can be read without blocking.
    ///
    /// A closed stream with nothing left to read is reported as
    /// [`io::ErrorKind::UnexpectedEof`].
    fn bytes_available(&mut self) -> io::Result<bool>;
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn read_byte(&mut self, deadline: Instant) -> io::Result<Option<u8>> {
        (**self).read_byte(deadline)
    }

    fn bytes_available(&mut self) -> io::Result<bool> {
        (**self).bytes_available()
    }
}

/// In-memory byte stream for tests and loopback use.
///
/// Reading from an empty receive buffer behaves exactly like the deadline
/// elapsing, so timeout paths run instantly.
///
/// # Example
///
/// ```
/// use groduino_link::{ByteStream, MockStream};
/// use std::time::Instant;
///
/// let mut stream = MockStream::new();
/// stream.inject_rx_data(b"A");
/// assert_eq!(stream.read_byte(Instant::now()).unwrap(), Some(b'A'));
/// assert_eq!(stream.read_byte(Instant::now()).unwrap(), None);
///
/// stream.write_all(b"hi").unwrap();
/// assert_eq!(stream.tx_buffer(), b"hi");
/// ```
#[derive(Debug, Default)]
pub struct MockStream {
    rx_buffer: VecDeque<u8>,
    tx_buffer: Vec<u8>,
    closed: bool,
}

impl MockStream {
    /// Create an empty mock stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the link to read.
    pub fn inject_rx_data(&mut self, data: &[u8]) {
        self.rx_buffer.extend(data);
    }

    /// Everything written so far.
    pub fn tx_buffer(&self) -> &[u8] {
        &self.tx_buffer
    }

    /// Take everything written so far, leaving the buffer empty.
    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx_buffer)
    }

    /// Number of injected bytes not yet read.
    pub fn rx_pending(&self) -> usize {
        self.rx_buffer.len()
    }

    /// Simulate the peer hanging up once the receive buffer drains.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl ByteStream for MockStream {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.tx_buffer.extend_from_slice(data);
        Ok(())
    }

    fn read_byte(&mut self, _deadline: Instant) -> io::Result<Option<u8>> {
        match self.rx_buffer.pop_front() {
            Some(byte) => Ok(Some(byte)),
            None if self.closed => Err(io::ErrorKind::UnexpectedEof.into()),
            None => Ok(None),
        }
    }

    fn bytes_available(&mut self) -> io::Result<bool> {
        if self.rx_buffer.is_empty() && self.closed {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(!self.rx_buffer.is_empty())
    }
}
