use std::fmt;
use thiserror::Error;

/// Request field that must be present and non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Password,
    CipherMode,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Password => f.write_str("password"),
            Param::CipherMode => f.write_str("cipher_mode"),
        }
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("missing parameter: {0}")]
    MissingParameter(Param),

    /// The primitive could not be run, exited nonzero, or timed out.
    #[error("{message}")]
    ExternalTool {
        message: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("unexpected output from key primitive: {0}")]
    UnexpectedOutput(String),
}

impl KeyError {
    pub(crate) fn tool(message: impl Into<String>) -> Self {
        KeyError::ExternalTool {
            message: message.into(),
            status: None,
            stderr: String::new(),
        }
    }
}
