//! Module registry and broadcast routing.
//!
//! The registry is fixed once built. Both passes call modules strictly in
//! registration order:
//!
//! - **Telemetry**: `get()` on every module, results concatenated verbatim.
//! - **Instruction**: `set()` on every module, non-empty answers concatenated.
//!
//! Instructions are broadcast, not dispatched: each module filters on its own
//! address, so the cost per instruction is linear in the number of modules.
//! If two modules share an address both act on the same instruction; the
//! [`CollisionPolicy`] decides whether that is tolerated.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use groduino_metrics::metric_defs::{
    ROUTER_INSTRUCTIONS, ROUTER_MODULE_RESPONSES, ROUTER_TELEMETRY_BYTES, ROUTER_TELEMETRY_PASSES,
};
use groduino_metrics::metrics;
use tracing::{debug, trace, warn};

use crate::error::{ParseError, RegistryError};
use crate::instruction::Instruction;
use crate::module::{module_label, Module, ModuleAddress};

/// What to do when two modules answer to the same address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Log each collision and keep broadcasting to every module.
    #[default]
    Warn,
    /// Refuse to build the registry.
    Reject,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(CollisionPolicy::Warn),
            "reject" => Ok(CollisionPolicy::Reject),
            other => Err(format!("unknown collision policy '{other}' (expected warn or reject)")),
        }
    }
}

/// An address claimed by more than one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// The shared address.
    pub address: ModuleAddress,
    /// Labels of the modules claiming it, in registration order.
    pub modules: Vec<String>,
}

/// Builder for a [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    modules: Vec<Box<dyn Module>>,
    defaults: Vec<Instruction>,
    policy: CollisionPolicy,
}

impl RouterBuilder {
    /// Register a module. Registration order is call order.
    pub fn module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Register an already boxed module.
    pub fn boxed(mut self, module: Box<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Add an instruction applied once at startup by
    /// [`Router::apply_defaults`].
    pub fn default_instruction(mut self, instruction: Instruction) -> Self {
        self.defaults.push(instruction);
        self
    }

    /// Set the collision policy.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Check addresses and build the router.
    pub fn build(self) -> Result<Router, RegistryError> {
        let collisions = find_collisions(&self.modules);

        for collision in &collisions {
            match self.policy {
                CollisionPolicy::Warn => warn!(
                    "Router: address {} is shared by {}; all of them will act on it",
                    collision.address,
                    collision.modules.join(", ")
                ),
                CollisionPolicy::Reject => {
                    return Err(RegistryError::AddressCollision {
                        address: collision.address.clone(),
                        modules: collision.modules.clone(),
                    })
                }
            }
        }

        debug!("Router: registered {} modules", self.modules.len());
        Ok(Router {
            modules: self.modules,
            defaults: self.defaults,
            collisions,
        })
    }
}

fn find_collisions(modules: &[Box<dyn Module>]) -> Vec<Collision> {
    let mut claims: BTreeMap<ModuleAddress, Vec<String>> = BTreeMap::new();
    for module in modules {
        let label = module_label(&**module);
        for address in module.addresses() {
            claims.entry(address).or_default().push(label.clone());
        }
    }

    claims
        .into_iter()
        .filter(|(_, modules)| modules.len() > 1)
        .map(|(address, modules)| Collision { address, modules })
        .collect()
}

/// The ordered module registry and its two routing passes.
pub struct Router {
    modules: Vec<Box<dyn Module>>,
    defaults: Vec<Instruction>,
    collisions: Vec<Collision>,
}

impl Router {
    /// Start building a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if no modules are registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Addresses shared by more than one module.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Startup instructions, in the order they are applied.
    pub fn defaults(&self) -> &[Instruction] {
        &self.defaults
    }

    /// Call `begin()` on every module.
    pub fn begin_all(&mut self) {
        for module in &mut self.modules {
            trace!("Router: begin {}", module_label(&**module));
            module.begin();
        }
    }

    /// Route every startup instruction through the normal broadcast path.
    ///
    /// Module answers are discarded; nothing is sent to the host.
    pub fn apply_defaults(&mut self) {
        let defaults = std::mem::take(&mut self.defaults);
        for instruction in &defaults {
            debug!("Router: applying default '{}'", instruction);
            self.route_instruction(instruction);
        }
        self.defaults = defaults;
    }

    /// Concatenate `get()` from every module in registration order.
    pub fn route_telemetry(&mut self) -> String {
        let mut telemetry = String::new();
        for module in &mut self.modules {
            telemetry.push_str(&module.get());
        }

        metrics::counter!(ROUTER_TELEMETRY_PASSES.name).increment(1);
        metrics::histogram!(ROUTER_TELEMETRY_BYTES.name).record(telemetry.len() as f64);
        trace!("Router: telemetry pass produced {} bytes", telemetry.len());
        telemetry
    }

    /// Offer `instruction` to every module and concatenate the non-empty
    /// answers.
    pub fn route_instruction(&mut self, instruction: &Instruction) -> String {
        let mut response = String::new();
        for module in &mut self.modules {
            let answer = module.set(&instruction.code, instruction.id, &instruction.parameter);
            if !answer.is_empty() {
                metrics::counter!(ROUTER_MODULE_RESPONSES.name, "code" => instruction.code.clone())
                    .increment(1);
                response.push_str(&answer);
            }
        }

        if response.is_empty() {
            debug!("Router: no module answered '{}'", instruction);
        }
        response
    }

    /// Parse one instruction line and route it.
    ///
    /// A line that does not parse reaches no module.
    pub fn route_line(&mut self, line: &str) -> Result<String, ParseError> {
        match Instruction::parse(line) {
            Ok(instruction) => {
                metrics::counter!(ROUTER_INSTRUCTIONS.name, "outcome" => "routed").increment(1);
                Ok(self.route_instruction(&instruction))
            }
            Err(err) => {
                metrics::counter!(ROUTER_INSTRUCTIONS.name, "outcome" => "invalid").increment(1);
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self
            .modules
            .iter()
            .map(|module| module_label(&**module))
            .collect();
        f.debug_struct("Router")
            .field("modules", &labels)
            .field("defaults", &self.defaults)
            .field("collisions", &self.collisions)
            .finish()
    }
}
