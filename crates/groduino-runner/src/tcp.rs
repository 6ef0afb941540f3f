//! TCP transport for the serial link.
//!
//! Stands in for the physical UART: the host process connects to (or is
//! connected from) the controller over one TCP stream carrying the same bytes
//! the serial line would.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Instant;

use groduino_link::ByteStream;
use tracing::{debug, info};

const READ_CHUNK: usize = 256;

/// A [`ByteStream`] over a blocking TCP connection.
#[derive(Debug)]
pub struct TcpByteStream {
    stream: TcpStream,
    peer: SocketAddr,
    pending: VecDeque<u8>,
}

impl TcpByteStream {
    /// Wrap an already connected stream.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok(TcpByteStream {
            stream,
            peer,
            pending: VecDeque::new(),
        })
    }

    /// Accept exactly one host connection on `listener`.
    pub fn accept(listener: &TcpListener) -> io::Result<Self> {
        info!("Waiting for host on {}", listener.local_addr()?);
        let (stream, peer) = listener.accept()?;
        info!("Host connected from {}", peer);
        Self::new(stream)
    }

    /// Bind `addr` and accept exactly one host connection.
    pub fn listen(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Self::accept(&listener)
    }

    /// Connect out to a listening host.
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        info!("Connected to host at {}", stream.peer_addr()?);
        Self::new(stream)
    }

    /// Address of the host end.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Move whatever one `read` returns into the pending queue.
    ///
    /// Returns `Ok(false)` if the read timed out or would block.
    fn fill(&mut self) -> io::Result<bool> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.stream.read(&mut chunk) {
            Ok(0) => {
                debug!("Host {} closed the connection", self.peer);
                Err(io::ErrorKind::UnexpectedEof.into())
            }
            Ok(n) => {
                self.pending.extend(&chunk[..n]);
                Ok(true)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

impl ByteStream for TcpByteStream {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn read_byte(&mut self, deadline: Instant) -> io::Result<Option<u8>> {
        loop {
            if let Some(byte) = self.pending.pop_front() {
                return Ok(Some(byte));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            self.stream.set_read_timeout(Some(deadline - now))?;
            self.fill()?;
        }
    }

    fn bytes_available(&mut self) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }

        self.stream.set_nonblocking(true)?;
        let filled = self.fill();
        self.stream.set_nonblocking(false)?;
        filled
    }
}
