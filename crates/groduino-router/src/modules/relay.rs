//! Active-low single-pole relay.

use tracing::{debug, trace};

use crate::module::{Module, ModuleAddress};
use crate::pin::OutputPin;

/// Parameter that switches a relay on.
pub const RELAY_ON: &str = "1";
/// Parameter that switches a relay off.
pub const RELAY_OFF: &str = "0";

/// An active-low relay addressed by `(code, id)`.
///
/// Driving the pin low energises the coil. [`begin`](Module::begin) leaves
/// the relay off.
pub struct Relay {
    address: ModuleAddress,
    pin: Box<dyn OutputPin>,
    on: bool,
}

impl Relay {
    /// Create a relay driving `pin`.
    pub fn new(code: impl Into<String>, id: u32, pin: impl OutputPin + 'static) -> Self {
        Self {
            address: ModuleAddress::new(code, id),
            pin: Box::new(pin),
            on: false,
        }
    }

    /// Address this relay answers to.
    pub fn address(&self) -> &ModuleAddress {
        &self.address
    }

    /// Returns true while the relay is energised.
    pub fn is_on(&self) -> bool {
        self.on
    }

    fn turn_on(&mut self) {
        self.pin.set_low();
        self.on = true;
    }

    fn turn_off(&mut self) {
        self.pin.set_high();
        self.on = false;
    }

    fn state_fragment(&self) -> String {
        self.address.fragment(u8::from(self.on))
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("address", &self.address)
            .field("on", &self.on)
            .finish_non_exhaustive()
    }
}

impl Module for Relay {
    fn kind(&self) -> &'static str {
        "relay"
    }

    fn begin(&mut self) {
        self.turn_off();
    }

    fn get(&mut self) -> String {
        self.state_fragment()
    }

    fn set(&mut self, code: &str, id: u32, parameter: &str) -> String {
        if !self.address.matches(code, id) {
            return String::new();
        }

        match parameter.trim() {
            RELAY_ON => self.turn_on(),
            RELAY_OFF => self.turn_off(),
            other => {
                debug!("Relay[{}]: ignoring parameter {:?}", self.address, other);
                return String::new();
            }
        }
        trace!("Relay[{}]: now {}", self.address, if self.on { "on" } else { "off" });
        self.state_fragment()
    }

    fn addresses(&self) -> Vec<ModuleAddress> {
        vec![self.address.clone()]
    }
}
