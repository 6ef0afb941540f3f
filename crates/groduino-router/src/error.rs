//! Error types for instruction parsing and module registration.

use thiserror::Error;

use crate::module::ModuleAddress;

/// Reasons an instruction line could not be parsed.
///
/// A line that fails to parse is never routed to any module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No space separates the code from the id, or the line starts or ends
    /// with that space.
    #[error("missing space between code and id")]
    MissingIdDelimiter,

    /// No space separates the id from the parameter, or the parameter is empty.
    #[error("missing parameter")]
    MissingParameter,

    /// The first four characters of the line cannot be taken as a code.
    #[error("code must be the first four characters of the line")]
    InvalidCode,

    /// The id field is not a non-negative decimal integer.
    #[error("invalid module id: {0:?}")]
    InvalidId(String),
}

impl ParseError {
    /// Short stable name, used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::MissingIdDelimiter => "missing_id_delimiter",
            ParseError::MissingParameter => "missing_parameter",
            ParseError::InvalidCode => "invalid_code",
            ParseError::InvalidId(_) => "invalid_id",
        }
    }
}

/// Errors raised while assembling a [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two or more modules answer to the same address and the registry was
    /// built with [`CollisionPolicy::Reject`](crate::CollisionPolicy::Reject).
    #[error("modules share address {address}: {}", .modules.join(", "))]
    AddressCollision {
        /// The shared address.
        address: ModuleAddress,
        /// Names of every module claiming it, in registration order.
        modules: Vec<String>,
    },
}
