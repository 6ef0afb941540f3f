//! The module capability every sensor and actuator exposes to the router.

use std::fmt;

/// The `(code, id)` pair a module answers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleAddress {
    /// Four character module code; several modules may share one.
    pub code: String,
    /// Id distinguishing modules with the same code.
    pub id: u32,
}

impl ModuleAddress {
    /// Create an address.
    pub fn new(code: impl Into<String>, id: u32) -> Self {
        Self {
            code: code.into(),
            id,
        }
    }

    /// Returns true if an instruction for `(code, id)` is meant for this address.
    pub fn matches(&self, code: &str, id: u32) -> bool {
        self.code == code && self.id == id
    }

    /// Format one report fragment: `"<CODE> <ID>":<value>,`.
    pub fn fragment(&self, value: impl fmt::Display) -> String {
        format!("\"{} {}\":{},", self.code, self.id, value)
    }
}

impl fmt::Display for ModuleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.id)
    }
}

/// A sensor or actuator attached to the controller.
///
/// The router never inspects a module's state. It calls [`get`](Module::get)
/// once per telemetry pass and [`set`](Module::set) once per instruction, on
/// every module, and concatenates what comes back.
///
/// # Invariants
///
/// - Returned fragments are complete on their own, trailing comma included.
/// - A module must not use the byte stream the link runs over.
pub trait Module {
    /// Short kind name used in logs, e.g. `"relay"`.
    fn kind(&self) -> &'static str;

    /// One-time hardware setup, called before any `get` or `set`.
    fn begin(&mut self) {}

    /// Report current state as zero or more fragments.
    fn get(&mut self) -> String;

    /// Offer an instruction to the module.
    ///
    /// Modules not addressed by `(code, id)` must return an empty string and
    /// leave their state alone.
    fn set(&mut self, code: &str, id: u32, parameter: &str) -> String;

    /// Addresses this module answers to, used for collision checks.
    fn addresses(&self) -> Vec<ModuleAddress> {
        Vec::new()
    }
}

/// Human readable label for a module, e.g. `relay[ALPN 2]`.
pub fn module_label(module: &dyn Module) -> String {
    let addresses = module
        .addresses()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}[{}]", module.kind(), addresses)
}
