//! Controller Errors

use std::fmt;

/// Everything a controller operation can report back to the screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Required or unparsable fields, in schema order. Never sent to the backend.
    Validation(Vec<&'static str>),
    /// Credentials rejected and the fixture fallback is disabled
    Authentication(Option<String>),
    /// Any other backend failure; the draft stays open for retry
    Transport(String),
    /// Another mutation is already in flight for this form or dialog
    Busy,
    /// Delete confirmation token does not match
    Locked,
    /// Delete dialog was already closed
    Closed,
    UnknownField(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Validation(fields) => write!(f, "Missing or invalid fields: {}", fields.join(", ")),
            ControllerError::Authentication(Some(msg)) => write!(f, "Authentication failed: {}", msg),
            ControllerError::Authentication(None) => f.write_str("Authentication failed"),
            ControllerError::Transport(msg) => f.write_str(msg),
            ControllerError::Busy => f.write_str("A request is already in progress"),
            ControllerError::Locked => f.write_str("Deletion not confirmed"),
            ControllerError::Closed => f.write_str("Dialog already closed"),
            ControllerError::UnknownField(name) => write!(f, "Unknown field: {}", name),
        }
    }
}

impl std::error::Error for ControllerError {}
