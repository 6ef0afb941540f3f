//! Groduino Instruction Router
//!
//! Turns instruction lines received from the host into calls on the
//! controller's hardware modules, and collects their state into telemetry.
//!
//! # Instruction Lines
//!
//! ```text
//! <CODE> <ID> <PARAMETER>
//! ```
//!
//! `CODE` is a fixed four character module code, `ID` a decimal module id and
//! `PARAMETER` free text up to the end of the line, e.g. `ALPN 2 1`.
//!
//! # Routing
//!
//! Every instruction is broadcast to every registered [`Module`]. Each module
//! compares the `(code, id)` pair against its own address and either acts and
//! answers with a fragment, or answers with nothing. Fragments look like
//! `"ALPN 2":1,` and are concatenated into one message:
//!
//! ```text
//! "GTYP":"Response","ALPN 2":1,"GEND":0
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use groduino_router::{MemoryPin, Relay, Router};
//!
//! let mut router = Router::builder()
//!     .module(Relay::new("ALPN", 2, MemoryPin::new()))
//!     .build()?;
//! router.begin_all();
//! let reply = router.route_line("ALPN 2 1");
//! ```

mod error;
mod instruction;
mod message;
mod module;
mod modules;
mod pin;
mod router;

pub use error::*;
pub use instruction::*;
pub use message::*;
pub use module::*;
pub use modules::*;
pub use pin::*;
pub use router::*;
