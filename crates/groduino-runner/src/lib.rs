//! Groduino controller runner.
//!
//! Wires a [`groduino_link::LinkConnection`] to a [`groduino_router::Router`]
//! and drives both from a single-threaded loop. The `groduino` binary adds
//! configuration loading, serial and TCP transports and signal handling.

pub mod config;
pub mod controller;
pub mod error;
pub mod serial;
pub mod tcp;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use serial::SerialByteStream;
pub use tcp::TcpByteStream;
