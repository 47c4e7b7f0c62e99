//! Error types for command interpretation.

use thiserror::Error;

/// Result type alias for command parsing.
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors produced while parsing an MT-SICS command line.
///
/// Both variants are reported to the client on the wire rather than
/// propagated: see [`CommandError::wire_code`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The line does not match any supported command.
    #[error("Unrecognized command: {0}")]
    Unrecognized(String),

    /// The command is known but its argument could not be used.
    #[error("Invalid argument for {command}: {argument}")]
    InvalidArgument { command: String, argument: String },
}

impl CommandError {
    /// MT-SICS error code sent back to the client.
    ///
    /// `ES` is a syntax error, `EL` a logical error.
    pub fn wire_code(&self) -> &'static str {
        match self {
            CommandError::Unrecognized(_) => "ES",
            CommandError::InvalidArgument { .. } => "EL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(CommandError::Unrecognized("FOO".into()).wire_code(), "ES");
        assert_eq!(
            CommandError::InvalidArgument {
                command: "TA".into(),
                argument: "ABC".into()
            }
            .wire_code(),
            "EL"
        );
    }
}
