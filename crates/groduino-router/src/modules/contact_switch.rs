//! Sensors that behave like a contact switch (door, water level float).

use crate::module::{Module, ModuleAddress};
use crate::pin::InputPin;

/// A read-only switch input addressed by `(code, id)`.
///
/// Reports the raw pin level: `1` when the input reads high.
pub struct ContactSwitch {
    address: ModuleAddress,
    pin: Box<dyn InputPin>,
}

impl ContactSwitch {
    /// Create a switch reading `pin`.
    pub fn new(code: impl Into<String>, id: u32, pin: impl InputPin + 'static) -> Self {
        Self {
            address: ModuleAddress::new(code, id),
            pin: Box::new(pin),
        }
    }

    /// Returns true if the input reads high.
    pub fn is_high(&self) -> bool {
        self.pin.is_high()
    }
}

impl std::fmt::Debug for ContactSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactSwitch")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Module for ContactSwitch {
    fn kind(&self) -> &'static str {
        "contact_switch"
    }

    fn get(&mut self) -> String {
        self.address.fragment(u8::from(self.is_high()))
    }

    fn set(&mut self, _code: &str, _id: u32, _parameter: &str) -> String {
        String::new()
    }

    fn addresses(&self) -> Vec<ModuleAddress> {
        vec![self.address.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::MemoryPin;

    #[test]
    fn test_get_follows_pin() {
        let pin = MemoryPin::new();
        let mut switch = ContactSwitch::new("SGSO", 1, pin.clone());

        assert_eq!(switch.get(), "\"SGSO 1\":0,");
        pin.set_level(true);
        assert_eq!(switch.get(), "\"SGSO 1\":1,");
    }

    #[test]
    fn test_set_never_answers() {
        let mut switch = ContactSwitch::new("SGSO", 1, MemoryPin::with_level(true));
        assert_eq!(switch.set("SGSO", 1, "1"), "");
        assert!(switch.is_high());
    }
}
