//! Instruction line parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Width of the code field at the start of every instruction line.
pub const CODE_LEN: usize = 4;

/// One structured command received from the host.
///
/// Built fresh for every received line and dropped once routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Module code, always [`CODE_LEN`] characters.
    pub code: String,
    /// Module id, unique within a code.
    pub id: u32,
    /// Everything after the space that follows the id.
    pub parameter: String,
}

impl Instruction {
    /// Create an instruction directly, bypassing the line syntax.
    pub fn new(code: impl Into<String>, id: u32, parameter: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            id,
            parameter: parameter.into(),
        }
    }

    /// Parse one instruction line of the form `CODE ID PARAMETER`.
    ///
    /// The code is always the first four characters, wherever the first
    /// space falls. The id is the text between the first and second spaces,
    /// trimmed. The parameter runs from after the second space to the end of
    /// the line and must not be empty.
    pub fn parse(line: &str) -> Result<Instruction, ParseError> {
        let first = match line.find(' ') {
            Some(pos) if pos > 0 && pos + 1 < line.len() => pos,
            _ => return Err(ParseError::MissingIdDelimiter),
        };

        let second = match line[first + 1..].find(' ') {
            Some(offset) if first + 1 + offset + 1 < line.len() => first + 1 + offset,
            _ => return Err(ParseError::MissingParameter),
        };

        let code = line.get(..CODE_LEN).ok_or(ParseError::InvalidCode)?;

        let id_text = line[first..second].trim();
        let id = id_text
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidId(id_text.to_string()))?;

        Ok(Instruction {
            code: code.to_string(),
            id,
            parameter: line[second + 1..].to_string(),
        })
    }
}

impl FromStr for Instruction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instruction::parse(s)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.code, self.id, self.parameter)
    }
}
