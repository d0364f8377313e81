//! Error types for the command protocol.

use thiserror::Error;

/// Protocol-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Text is not one of the outbound command literals
    #[error("unknown command literal: {0:?}")]
    UnknownCommand(String),
}
