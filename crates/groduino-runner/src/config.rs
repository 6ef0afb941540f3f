//! Controller configuration.
//!
//! Loaded from YAML. Every field is optional; an empty file yields the
//! stock board layout with the stock link timings.
//!
//! ```yaml
//! link:
//!   establish_timeout_ms: 2000
//!   receive_timeout_ms: 5000
//! telemetry_interval_ms: 1000
//! collision_policy: warn
//! modules:
//!   - { kind: relay, code: AACR, id: 1, default: on }
//!   - { kind: contact_switch, code: SGSO, id: 1 }
//! ```

use std::path::Path;
use std::time::Duration;

use groduino_link::{
    LinkConfig, DEFAULT_BAUD_RATE, DEFAULT_ESTABLISH_TIMEOUT, DEFAULT_RECEIVE_TIMEOUT,
};
use groduino_router::{
    CollisionPolicy, ContactSwitch, Instruction, MemoryPin, Relay, Router, CODE_LEN, RELAY_OFF,
    RELAY_ON,
};
use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

/// Default period between telemetry passes.
pub const DEFAULT_TELEMETRY_INTERVAL_MS: u64 = 1000;
/// Default sleep between controller cycles.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Top-level runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Serial link timings.
    pub link: LinkSettings,
    /// Period between telemetry passes (milliseconds).
    pub telemetry_interval_ms: u64,
    /// Sleep between controller cycles (milliseconds).
    pub poll_interval_ms: u64,
    /// How to treat modules sharing a `(code, id)` address.
    pub collision_policy: CollisionPolicySetting,
    /// Modules in registration order.
    pub modules: Vec<ModuleConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            link: LinkSettings::default(),
            telemetry_interval_ms: DEFAULT_TELEMETRY_INTERVAL_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            collision_policy: CollisionPolicySetting::default(),
            modules: stock_modules(),
        }
    }
}

/// Switch, relay and default-state layout of the stock growing chamber.
fn stock_modules() -> Vec<ModuleConfig> {
    use DefaultState::On;
    vec![
        ModuleConfig::contact_switch("SGSO", 1),
        ModuleConfig::contact_switch("SGWO", 1),
        ModuleConfig::relay("AAHE", 1, None),
        ModuleConfig::relay("AAHU", 1, None),
        ModuleConfig::relay("AAVE", 1, Some(On)),
        ModuleConfig::relay("AACR", 1, Some(On)),
        ModuleConfig::relay("ALPN", 1, None),
        ModuleConfig::relay("ALPN", 2, None),
        ModuleConfig::relay("ALMI", 1, Some(On)),
    ]
}

impl RunnerConfig {
    /// Load and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    /// Parse and validate YAML configuration text.
    pub fn from_yaml(text: &str) -> RunnerResult<Self> {
        // An empty document deserializes as unit, not as an empty map.
        let config: RunnerConfig = if text.trim().is_empty() {
            RunnerConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> RunnerResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.telemetry_interval_ms == 0 {
            return Err(RunnerError::ConfigError(
                "telemetry_interval_ms must be positive".to_string(),
            ));
        }
        if self.link.establish_timeout_ms == 0 || self.link.receive_timeout_ms == 0 {
            return Err(RunnerError::ConfigError(
                "link timeouts must be positive".to_string(),
            ));
        }
        for module in &self.modules {
            module.validate()?;
        }
        Ok(())
    }

    /// Period between telemetry passes.
    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }

    /// Sleep between controller cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Build the module registry described by this configuration.
    ///
    /// Every module gets an in-memory pin; contact switches start reading
    /// high, as an open switch on a pulled-up input does.
    pub fn build_router(&self) -> RunnerResult<Router> {
        let mut builder = Router::builder().collision_policy(self.collision_policy.into());

        for module in &self.modules {
            builder = match module.kind {
                ModuleKind::Relay => {
                    builder.module(Relay::new(module.code.clone(), module.id, MemoryPin::new()))
                }
                ModuleKind::ContactSwitch => builder.module(ContactSwitch::new(
                    module.code.clone(),
                    module.id,
                    MemoryPin::with_level(true),
                )),
            };
            if let Some(instruction) = module.default_instruction() {
                builder = builder.default_instruction(instruction);
            }
        }

        Ok(builder.build()?)
    }
}

/// Serial link timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkSettings {
    /// How long to wait for the host's acknowledgement (milliseconds).
    pub establish_timeout_ms: u64,
    /// How long one receive may block (milliseconds).
    pub receive_timeout_ms: u64,
    /// Serial line rate used when opening `--serial`; unused over TCP.
    pub baud_rate: u32,
}

impl Default for LinkSettings {
    fn default() -> Self {
        LinkSettings {
            establish_timeout_ms: DEFAULT_ESTABLISH_TIMEOUT.as_millis() as u64,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT.as_millis() as u64,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl From<&LinkSettings> for LinkConfig {
    fn from(settings: &LinkSettings) -> Self {
        LinkConfig {
            establish_timeout: Duration::from_millis(settings.establish_timeout_ms),
            receive_timeout: Duration::from_millis(settings.receive_timeout_ms),
            baud_rate: settings.baud_rate,
        }
    }
}

/// Serializable form of [`CollisionPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicySetting {
    /// Log shared addresses and let every module act.
    #[default]
    Warn,
    /// Refuse to build the router.
    Reject,
}

impl From<CollisionPolicySetting> for CollisionPolicy {
    fn from(setting: CollisionPolicySetting) -> Self {
        match setting {
            CollisionPolicySetting::Warn => CollisionPolicy::Warn,
            CollisionPolicySetting::Reject => CollisionPolicy::Reject,
        }
    }
}

/// Module driver to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Active-low relay output.
    Relay,
    /// Read-only contact switch input.
    ContactSwitch,
}

/// State a relay is switched to at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultState {
    /// Switch the relay on (`1`).
    On,
    /// Switch the relay off (`0`).
    Off,
}

/// One registered module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Driver kind.
    pub kind: ModuleKind,
    /// Four character module code.
    pub code: String,
    /// Module id within the code.
    pub id: u32,
    /// Startup state (relays only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultState>,
}

impl ModuleConfig {
    /// A relay entry.
    pub fn relay(code: &str, id: u32, default: Option<DefaultState>) -> Self {
        ModuleConfig {
            kind: ModuleKind::Relay,
            code: code.to_string(),
            id,
            default,
        }
    }

    /// A contact switch entry.
    pub fn contact_switch(code: &str, id: u32) -> Self {
        ModuleConfig {
            kind: ModuleKind::ContactSwitch,
            code: code.to_string(),
            id,
            default: None,
        }
    }

    fn validate(&self) -> RunnerResult<()> {
        let well_formed = self.code.len() == CODE_LEN
            && self.code.bytes().all(|b| b.is_ascii_graphic());
        if !well_formed {
            return Err(RunnerError::ConfigError(format!(
                "module code {:?} must be {} printable ASCII characters",
                self.code, CODE_LEN
            )));
        }
        if self.kind == ModuleKind::ContactSwitch && self.default.is_some() {
            return Err(RunnerError::ConfigError(format!(
                "contact switch {} {} cannot have a default state",
                self.code, self.id
            )));
        }
        Ok(())
    }

    /// The startup instruction for this module, if any.
    pub fn default_instruction(&self) -> Option<Instruction> {
        let parameter = match self.default? {
            DefaultState::On => RELAY_ON,
            DefaultState::Off => RELAY_OFF,
        };
        Some(Instruction::new(self.code.clone(), self.id, parameter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_stock_board() {
        let config = RunnerConfig::default();
        config.validate().unwrap();

        assert_eq!(config.modules.len(), 9);
        let defaults: Vec<String> = config
            .modules
            .iter()
            .filter_map(ModuleConfig::default_instruction)
            .map(|i| i.to_string())
            .collect();
        assert_eq!(defaults, vec!["AAVE 1 1", "AACR 1 1", "ALMI 1 1"]);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(RunnerConfig::from_yaml("").unwrap(), RunnerConfig::default());
        assert_eq!(RunnerConfig::from_yaml("{}").unwrap(), RunnerConfig::default());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
link:
  establish_timeout_ms: 500
telemetry_interval_ms: 250
collision_policy: reject
modules:
  - { kind: relay, code: AAHE, id: 1, default: off }
  - { kind: contact_switch, code: SGSO, id: 3 }
"#;
        let config = RunnerConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.link.establish_timeout_ms, 500);
        assert_eq!(config.link.receive_timeout_ms, 5000);
        assert_eq!(config.telemetry_interval(), Duration::from_millis(250));
        assert_eq!(config.collision_policy, CollisionPolicySetting::Reject);
        assert_eq!(
            config.modules,
            vec![
                ModuleConfig::relay("AAHE", 1, Some(DefaultState::Off)),
                ModuleConfig::contact_switch("SGSO", 3),
            ]
        );
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = RunnerConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(RunnerConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            RunnerConfig::from_yaml("telemetry_every: 5"),
            Err(RunnerError::YamlError(_))
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            "telemetry_interval_ms: 0",
            "link: { receive_timeout_ms: 0 }",
            "modules: [ { kind: relay, code: AAH, id: 1 } ]",
            "modules: [ { kind: relay, code: 'AA E', id: 1 } ]",
            "modules: [ { kind: contact_switch, code: SGSO, id: 1, default: on } ]",
        ];
        for yaml in bad {
            assert!(
                matches!(RunnerConfig::from_yaml(yaml), Err(RunnerError::ConfigError(_))),
                "{yaml} should be rejected"
            );
        }
    }

    #[test]
    fn test_link_config_conversion() {
        let config = LinkConfig::from(&LinkSettings::default());
        assert_eq!(config, LinkConfig::default());
    }

    #[test]
    fn test_build_router_applies_policy() {
        let mut config = RunnerConfig::default();
        config.modules.push(ModuleConfig::relay("AAHE", 1, None));
        assert_eq!(config.build_router().unwrap().collisions().len(), 1);

        config.collision_policy = CollisionPolicySetting::Reject;
        assert!(matches!(
            config.build_router(),
            Err(RunnerError::RegistryError(_))
        ));
    }
}
