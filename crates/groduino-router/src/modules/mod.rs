//! Built-in module drivers.

mod contact_switch;
mod relay;

pub use contact_switch::*;
pub use relay::*;
