//! Serial port transport for the link.
//!
//! Opens the UART the host is attached to at the configured baud rate. Reads
//! are bounded by the link's deadlines through the port timeout.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use groduino_link::ByteStream;
use serialport::SerialPort;
use tracing::{debug, info};

const READ_CHUNK: usize = 256;

/// Port timeout used until the first deadline-bounded read.
const OPEN_TIMEOUT: Duration = Duration::from_millis(100);

/// A [`ByteStream`] over a serial port.
pub struct SerialByteStream {
    port: Box<dyn SerialPort>,
    name: String,
    pending: VecDeque<u8>,
}

impl SerialByteStream {
    /// Open `path` at `baud_rate`.
    pub fn open(path: &str, baud_rate: u32) -> serialport::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(OPEN_TIMEOUT)
            .open()?;
        info!("Opened serial port {} at {} baud", path, baud_rate);
        Ok(Self::new(port))
    }

    /// Wrap an already opened port.
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        let name = port.name().unwrap_or_else(|| "<unnamed>".to_string());
        SerialByteStream {
            port,
            name,
            pending: VecDeque::new(),
        }
    }

    /// Device name of the port.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line rate the port is running at.
    pub fn baud_rate(&self) -> io::Result<u32> {
        Ok(self.port.baud_rate()?)
    }

    /// Move whatever one `read` returns into the pending queue.
    ///
    /// Returns `Ok(false)` if the read timed out.
    fn fill(&mut self) -> io::Result<bool> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.port.read(&mut chunk) {
            Ok(0) => {
                debug!("Serial port {} hung up", self.name);
                Err(io::ErrorKind::UnexpectedEof.into())
            }
            Ok(n) => {
                self.pending.extend(&chunk[..n]);
                Ok(true)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

impl fmt::Debug for SerialByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialByteStream")
            .field("name", &self.name)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl ByteStream for SerialByteStream {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.port, data)?;
        self.port.flush()
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
            self.port.set_timeout(deadline - now)?;
            self.fill()?;
        }
    }

    fn bytes_available(&mut self) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        Ok(self.port.bytes_to_read()? > 0)
    }
}
