//! Protocol constants
//!
//! Control characters, message delimiters and default timing values used by
//! the Groduino serial link. None of these are negotiated at runtime.

use std::time::Duration;

// ============================================================================
// Control Characters
// ============================================================================

/// Start of header; first byte of every frame.
pub const SOH: u8 = 0x01;
/// Start of text; ends the length field and opens the body.
pub const STX: u8 = 0x02;
/// End of text; closes the body and opens the checksum field.
pub const ETX: u8 = 0x03;
/// End of transmission; last byte of every frame.
pub const EOT: u8 = 0x04;
/// Enquiry; sent by the device to offer a connection.
pub const ENQ: u8 = 0x05;
/// Acknowledge; sent by the host to accept and echoed by the device to confirm.
pub const ACK: u8 = 0x06;

/// All sentinel bytes that must never appear inside a payload.
pub const SENTINELS: [u8; 6] = [SOH, STX, ETX, EOT, ENQ, ACK];

// ============================================================================
// Unframed Mode
// ============================================================================

/// Terminator of an inbound line in unframed mode.
pub const LINE_FEED: u8 = b'\n';
/// Terminator appended to outbound lines in unframed mode.
pub const LINE_ENDING: &str = "\r\n";
/// Line written once on handshake failure, before fallback operation begins.
pub const CONNECTION_FAILURE_NOTICE: &str = "Did not establish connection with host";

// ============================================================================
// Message Boundary
// ============================================================================

/// Opens every outbound message, framed or not.
pub const MESSAGE_OPEN: &str = "{";
/// Closes every outbound message, framed or not.
pub const MESSAGE_CLOSE: &str = "},";

// ============================================================================
// Defaults
// ============================================================================

/// Serial line rate of the stock board.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// How long `establish` waits for the host's acknowledgement.
pub const DEFAULT_ESTABLISH_TIMEOUT: Duration = Duration::from_millis(2000);
/// How long `receive` waits for a complete message.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Largest inbound message the link will buffer before giving up on it.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Returns true if `byte` is one of the protocol's control characters.
pub fn is_sentinel(byte: u8) -> bool {
    SENTINELS.contains(&byte)
}
