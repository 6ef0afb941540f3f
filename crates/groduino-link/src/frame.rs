//! Frame encoding/decoding utilities.
//!
//! Established-mode messages are wrapped in a character frame whose numeric
//! fields are written as ASCII decimal:
//!
//! ```text
//! +-----+--------+-----+-----------------+-----+----------+-----+
//! | SOH | length | STX | body[0..length] | ETX | checksum | EOT |
//! +-----+--------+-----+-----------------+-----+----------+-----+
//! ```
//!
//! The body must not contain any of the control characters; the codec does
//! not escape them.

use bytes::{Buf, BufMut, BytesMut};

use crate::checksum::checksum;
use crate::constants::{EOT, ETX, MAX_MESSAGE_SIZE, SOH, STX};
use crate::error::FrameError;

/// A codec for reading and writing character frames.
///
/// Encoding and decoding of complete frames are associated functions. An
/// instance additionally accumulates received bytes and splits them on `EOT`.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(MAX_MESSAGE_SIZE),
        }
    }

    /// Wrap `payload` in a complete frame, `SOH` through `EOT`.
    pub fn encode(payload: &str) -> Vec<u8> {
        let body = payload.as_bytes();
        let length = body.len().to_string();
        let crc = checksum(body).to_string();

        let mut buf = Vec::with_capacity(body.len() + length.len() + crc.len() + 4);
        buf.put_u8(SOH);
        buf.put_slice(length.as_bytes());
        buf.put_u8(STX);
        buf.put_slice(body);
        buf.put_u8(ETX);
        buf.put_slice(crc.as_bytes());
        buf.put_u8(EOT);
        buf
    }

    /// Validate a received frame and extract its body.
    ///
    /// `frame` may include or omit the trailing `EOT`. Validation stops at the
    /// first failing stage.
    pub fn decode(frame: &[u8]) -> Result<String, FrameError> {
        let frame = frame.strip_suffix(&[EOT]).unwrap_or(frame);

        if frame.first() != Some(&SOH) {
            return Err(FrameError::NoHeader);
        }

        let stx = position(frame, STX).ok_or(FrameError::BadLength)?;
        let declared = parse_decimal(&frame[1..stx]).ok_or(FrameError::BadLength)?;

        let body_start = stx + 1;
        let etx = match position(frame, ETX) {
            Some(etx) if etx > body_start => etx,
            _ => return Err(FrameError::BadBody),
        };
        let body = &frame[body_start..etx];

        if body.len() != declared {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: body.len(),
            });
        }

        let token = &frame[etx + 1..];
        let expected = checksum(body);
        if token != expected.to_string().as_bytes() {
            return Err(FrameError::ChecksumMismatch {
                expected,
                actual: String::from_utf8_lossy(token).into_owned(),
            });
        }

        String::from_utf8(body.to_vec()).map_err(|_| FrameError::InvalidUtf8)
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to take the next complete frame from the buffer.
    ///
    /// Returns `None` until an `EOT` has been buffered. The frame is consumed
    /// whether or not it validates.
    pub fn decode_next(&mut self) -> Option<Result<String, FrameError>> {
        let eot = position(&self.buffer, EOT)?;
        let frame = self.buffer.split_to(eot);
        self.buffer.advance(1);
        Some(Self::decode(&frame))
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn position(data: &[u8], byte: u8) -> Option<usize> {
    data.iter().position(|&b| b == byte)
}

fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let encoded = FrameCodec::encode("abc");
        let crc = checksum(b"abc").to_string();

        let mut expected = vec![SOH, b'3', STX, b'a', b'b', b'c', ETX];
        expected.extend_from_slice(crc.as_bytes());
        expected.push(EOT);
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_decode() {
        for payload in ["x", "AAHE 1 1", "{\"GTYP\":\"Stream\",\"GEND\":0},", "ünïcode"] {
            let encoded = FrameCodec::encode(payload);
            assert_eq!(FrameCodec::decode(&encoded).as_deref(), Ok(payload));
        }
    }

    #[test]
    fn test_decode_without_eot() {
        let encoded = FrameCodec::encode("hello");
        let trimmed = &encoded[..encoded.len() - 1];
        assert_eq!(FrameCodec::decode(trimmed).as_deref(), Ok("hello"));
    }

    #[test]
    fn test_decode_no_header() {
        assert_eq!(FrameCodec::decode(b""), Err(FrameError::NoHeader));
        let mut encoded = FrameCodec::encode("hello");
        encoded[0] = b'#';
        assert_eq!(FrameCodec::decode(&encoded), Err(FrameError::NoHeader));
    }

    #[test]
    fn test_decode_bad_length() {
        assert_eq!(FrameCodec::decode(&[SOH, b'5']), Err(FrameError::BadLength));
        assert_eq!(
            FrameCodec::decode(&[SOH, STX, b'a', ETX, b'0']),
            Err(FrameError::BadLength)
        );
        assert_eq!(
            FrameCodec::decode(&[SOH, b'-', b'1', STX, b'a', ETX, b'0']),
            Err(FrameError::BadLength)
        );
    }

    #[test]
    fn test_decode_bad_body() {
        // No ETX at all.
        assert_eq!(
            FrameCodec::decode(&[SOH, b'2', STX, b'a', b'b']),
            Err(FrameError::BadBody)
        );
        // Empty body.
        assert_eq!(
            FrameCodec::decode(&[SOH, b'0', STX, ETX, b'0']),
            Err(FrameError::BadBody)
        );
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut frame = vec![SOH, b'4', STX];
        frame.extend_from_slice(b"abc");
        frame.push(ETX);
        frame.extend_from_slice(checksum(b"abc").to_string().as_bytes());
        assert_eq!(
            FrameCodec::decode(&frame),
            Err(FrameError::LengthMismatch { declared: 4, actual: 3 })
        );
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let encoded = FrameCodec::encode("hello");
        let etx = encoded.iter().position(|&b| b == ETX).unwrap();
        for i in etx + 1..encoded.len() - 1 {
            let mut corrupted = encoded.clone();
            corrupted[i] = if corrupted[i] == b'9' { b'0' } else { corrupted[i] + 1 };
            assert!(
                matches!(FrameCodec::decode(&corrupted), Err(FrameError::ChecksumMismatch { .. })),
                "corrupting checksum byte {i} was not detected"
            );
        }
    }

    #[test]
    fn test_decode_missing_checksum() {
        let mut frame = vec![SOH, b'1', STX, b'a', ETX];
        frame.push(EOT);
        assert!(matches!(
            FrameCodec::decode(&frame),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_truncation_never_accepted() {
        let encoded = FrameCodec::encode("\"ALPN 2\":1,");
        let etx = encoded.iter().position(|&b| b == ETX).unwrap();
        for cut in 1..=etx {
            let result = FrameCodec::decode(&encoded[..cut]);
            assert!(
                matches!(
                    result,
                    Err(FrameError::BadBody) | Err(FrameError::LengthMismatch { .. }) | Err(FrameError::BadLength)
                ),
                "truncation at {cut} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_decode_next_partial() {
        let mut codec = FrameCodec::new();
        let encoded = FrameCodec::encode("Test data");

        codec.push(&encoded[..4]);
        assert!(codec.decode_next().is_none());

        codec.push(&encoded[4..]);
        assert_eq!(codec.decode_next(), Some(Ok("Test data".to_string())));
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_decode_next_multiple() {
        let mut codec = FrameCodec::new();
        codec.push(&FrameCodec::encode("First"));
        codec.push(&FrameCodec::encode("Second"));

        assert_eq!(codec.decode_next(), Some(Ok("First".to_string())));
        assert_eq!(codec.decode_next(), Some(Ok("Second".to_string())));
        assert!(codec.decode_next().is_none());
    }

    #[test]
    fn test_decode_next_consumes_invalid_frame() {
        let mut codec = FrameCodec::new();
        codec.push(b"garbage");
        codec.push(&[EOT]);
        codec.push(&FrameCodec::encode("ok"));

        assert_eq!(codec.decode_next(), Some(Err(FrameError::NoHeader)));
        assert_eq!(codec.decode_next(), Some(Ok("ok".to_string())));
    }
}
