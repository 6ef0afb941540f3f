//! Groduino Serial Link Protocol
//!
//! This crate implements the device side of the character-oriented serial
//! protocol spoken between the Groduino controller and its host process.
//!
//! # Protocol Overview
//!
//! After power-up the device offers a three-way handshake:
//!
//! - **Device → host**: `ENQ`
//! - **Host → device**: `ACK` (within the establish timeout)
//! - **Device → host**: `ACK`
//!
//! Once established, every message travels inside a checksummed frame:
//!
//! ```text
//! SOH <length as decimal> STX <body> ETX <checksum as decimal> EOT
//! ```
//!
//! If the host never acknowledges, the link falls back to plain
//! newline-terminated text for the rest of the process lifetime.
//!
//! # Example
//!
//! ```rust,ignore
//! use groduino_link::{LinkConfig, LinkConnection, MockStream};
//!
//! let mut link = LinkConnection::new(MockStream::new(), LinkConfig::default());
//! link.establish();
//! link.send("\"GTYP\":\"Stream\",\"GEND\":0")?;
//! ```

mod checksum;
mod connection;
mod constants;
mod error;
mod frame;
mod stream;

pub use checksum::*;
pub use connection::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use stream::*;
