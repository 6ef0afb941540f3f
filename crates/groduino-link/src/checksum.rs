//! 8-bit CRC used to detect line noise in framed payloads.
//!
//! This is the reflected Dallas/Maxim polynomial (`0x8C`), processed least
//! significant bit first with a zero seed. It guards against transmission
//! errors only; it offers no protection against deliberate tampering.

/// Reflected form of the x^8 + x^5 + x^4 + 1 polynomial.
pub const CRC8_POLYNOMIAL: u8 = 0x8C;

/// Computes the checksum of `data`.
///
/// # Example
///
/// ```rust
/// use groduino_link::checksum;
///
/// assert_eq!(checksum(b""), 0);
/// assert_eq!(checksum(b"AAHE 1 1"), checksum(b"AAHE 1 1"));
/// ```
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |crc, &byte| crc8_step(crc, byte))
}

fn crc8_step(mut crc: u8, mut byte: u8) -> u8 {
    for _ in 0..8 {
        let mix = (crc ^ byte) & 0x01;
        crc >>= 1;
        if mix != 0 {
            crc ^= CRC8_POLYNOMIAL;
        }
        byte >>= 1;
    }
    crc
}
