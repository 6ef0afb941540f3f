//! Runner error types.

use groduino_link::LinkError;
use groduino_router::RegistryError;
use thiserror::Error;

/// Errors that stop the controller from starting or keep it from running.
///
/// Per-message problems (timeouts, corrupt frames, unparseable lines) are
/// logged inside the loop and never surface here.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Module registry error: {0}")]
    RegistryError(#[from] RegistryError),

    #[error("Link error: {0}")]
    LinkError(#[from] LinkError),

    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),

    #[error("Signal handler error: {0}")]
    SignalError(#[from] ctrlc::Error),
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
