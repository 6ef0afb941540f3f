//! Link error types.

use thiserror::Error;

/// Reasons a received byte sequence is not a valid frame.
///
/// Validation is staged; the first failing stage determines the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// First byte is not `SOH`.
    #[error("frame does not start with SOH")]
    NoHeader,

    /// Length field is missing or not a non-negative decimal integer.
    #[error("frame length field is missing or not a decimal integer")]
    BadLength,

    /// No `ETX` follows the `STX`, or the body between them is empty.
    #[error("frame body is missing or unterminated")]
    BadBody,

    /// Body length differs from the declared length.
    #[error("frame length mismatch: declared {declared}, body has {actual} bytes")]
    LengthMismatch {
        /// Length announced in the header.
        declared: usize,
        /// Length of the extracted body.
        actual: usize,
    },

    /// Checksum token does not match the body.
    #[error("frame checksum mismatch: computed {expected}, received {actual:?}")]
    ChecksumMismatch {
        /// Checksum computed over the received body.
        expected: u8,
        /// Checksum token as received.
        actual: String,
    },

    /// Body is not valid UTF-8 text.
    #[error("frame body is not valid UTF-8")]
    InvalidUtf8,
}

impl FrameError {
    /// Short stable name, used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            FrameError::NoHeader => "no_header",
            FrameError::BadLength => "bad_length",
            FrameError::BadBody => "bad_body",
            FrameError::LengthMismatch { .. } => "length_mismatch",
            FrameError::ChecksumMismatch { .. } => "checksum_mismatch",
            FrameError::InvalidUtf8 => "invalid_utf8",
        }
    }
}

/// Errors surfaced by [`LinkConnection`](crate::LinkConnection).
///
/// Only [`LinkError::Io`] and [`LinkError::Closed`] mean the byte stream itself
/// is unusable. Everything else is a per-message condition the caller should
/// treat as "nothing received this cycle".
#[derive(Error, Debug)]
pub enum LinkError {
    /// The host did not acknowledge within the establish timeout.
    #[error("handshake timed out; continuing unframed")]
    HandshakeTimeout,

    /// No complete message arrived within the receive timeout.
    #[error("timed out waiting for a complete message")]
    ReceiveTimeout,

    /// A framed message failed validation.
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),

    /// An unframed line was not valid UTF-8.
    #[error("received line is not valid UTF-8")]
    InvalidUtf8,

    /// An inbound message exceeded the receive buffer.
    #[error("message too long: maximum {max} bytes")]
    Overflow {
        /// Maximum accepted message size.
        max: usize,
    },

    /// The peer closed the byte stream.
    #[error("byte stream closed by peer")]
    Closed,

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Returns true if the link can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::Io(_) | LinkError::Closed)
    }
}

/// Result type alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
