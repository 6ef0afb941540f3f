//! Digital pin seam for module drivers.
//!
//! Modules take their pins as trait objects so the same relay or switch code
//! runs against real hardware or an in-memory [`MemoryPin`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A digital output.
///
/// # Invariants
///
/// - Only one module owns a given output pin.
pub trait OutputPin {
    /// Drive the pin to logic level 1.
    fn set_high(&mut self);

    /// Drive the pin to logic level 0.
    fn set_low(&mut self);
}

/// A digital input.
pub trait InputPin {
    /// Returns `true` if the pin reads logic level 1.
    fn is_high(&self) -> bool;
}

/// An in-memory pin usable as input or output.
///
/// Clones share one level, so a test can keep a handle to observe what a
/// relay drives or to flip what a switch reads.
#[derive(Debug, Clone, Default)]
pub struct MemoryPin {
    level: Arc<AtomicBool>,
}

impl MemoryPin {
    /// Create a pin reading low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pin at the given level.
    pub fn with_level(high: bool) -> Self {
        let pin = Self::new();
        pin.set_level(high);
        pin
    }

    /// Current level.
    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Force the level, as external wiring would.
    pub fn set_level(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
    }
}

impl OutputPin for MemoryPin {
    fn set_high(&mut self) {
        self.set_level(true);
    }

    fn set_low(&mut self) {
        self.set_level(false);
    }
}

impl InputPin for MemoryPin {
    fn is_high(&self) -> bool {
        self.level()
    }
}
