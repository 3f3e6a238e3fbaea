//! Error types for session management.

use medbridge_core::{MedBridgeError, SessionStatus};

/// Errors from connection lifecycle and protocol handling.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidTransition(SessionStatus, SessionStatus),
    #[error("Token fetch failed: {0}")]
    Token(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<SessionError> for MedBridgeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Protocol(msg) => MedBridgeError::Protocol(msg),
            other => MedBridgeError::Connection(other.to_string()),
        }
    }
}
