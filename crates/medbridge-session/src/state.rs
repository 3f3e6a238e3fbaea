//! Session status state machine with thread-safe transitions.
//!
//! Enforces valid transitions for the connection lifecycle:
//! - Idle -> Connecting (connect requested)
//! - Connecting -> Connected (transport established)
//! - any non-terminal -> Error (connection-level failure)
//! - any state except Disconnected -> Disconnected (teardown)

use std::sync::{Arc, Mutex};

use medbridge_core::SessionStatus;

use crate::error::SessionError;

/// Returns whether a transition between two statuses is valid.
pub fn valid_transition(from: SessionStatus, to: SessionStatus) -> bool {
    use SessionStatus::*;
    matches!(
        (from, to),
        (Idle, Connecting)
            | (Connecting, Connected)
            | (Idle, Error)
            | (Connecting, Error)
            | (Connected, Error)
            | (Idle, Disconnected)
            | (Connecting, Disconnected)
            | (Connected, Disconnected)
            | (Error, Disconnected)
    )
}

/// Thread-safe state machine for session status transitions.
///
/// Clones share the underlying state, so the event pump task and the
/// owning connection observe the same status.
#[derive(Debug, Clone)]
pub struct StateMachine {
    status: Arc<Mutex<SessionStatus>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            status: Arc::new(Mutex::new(SessionStatus::Idle)),
        }
    }

    /// Returns the current status.
    pub fn current(&self) -> SessionStatus {
        *self.status.lock().expect("status mutex poisoned")
    }

    /// Attempt to transition to the target status.
    pub fn transition(&self, target: SessionStatus) -> Result<(), SessionError> {
        let mut status = self.status.lock().expect("status mutex poisoned");
        if valid_transition(*status, target) {
            tracing::debug!("Session status: {} -> {}", *status, target);
            *status = target;
            Ok(())
        } else {
            Err(SessionError::InvalidTransition(*status, target))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(valid_transition(SessionStatus::Idle, SessionStatus::Connecting));
        assert!(valid_transition(
            SessionStatus::Connecting,
            SessionStatus::Connected
        ));
        assert!(valid_transition(
            SessionStatus::Connected,
            SessionStatus::Disconnected
        ));
    }

    #[test]
    fn test_error_reachable_from_non_terminal_states() {
        assert!(valid_transition(SessionStatus::Idle, SessionStatus::Error));
        assert!(valid_transition(SessionStatus::Connecting, SessionStatus::Error));
        assert!(valid_transition(SessionStatus::Connected, SessionStatus::Error));
        assert!(!valid_transition(SessionStatus::Error, SessionStatus::Error));
        assert!(!valid_transition(
            SessionStatus::Disconnected,
            SessionStatus::Error
        ));
    }

    #[test]
    fn test_disconnected_reachable_from_all_other_states() {
        for from in [
            SessionStatus::Idle,
            SessionStatus::Connecting,
            SessionStatus::Connected,
            SessionStatus::Error,
        ] {
            assert!(valid_transition(from, SessionStatus::Disconnected));
        }
        assert!(!valid_transition(
            SessionStatus::Disconnected,
            SessionStatus::Disconnected
        ));
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot skip connecting
        assert!(!valid_transition(SessionStatus::Idle, SessionStatus::Connected));
        // No reconnect from terminal states
        assert!(!valid_transition(
            SessionStatus::Disconnected,
            SessionStatus::Connecting
        ));
        assert!(!valid_transition(SessionStatus::Error, SessionStatus::Connecting));
        // No self transitions
        assert!(!valid_transition(SessionStatus::Idle, SessionStatus::Idle));
    }

    #[test]
    fn test_state_machine_happy_path() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), SessionStatus::Idle);

        sm.transition(SessionStatus::Connecting).unwrap();
        sm.transition(SessionStatus::Connected).unwrap();
        sm.transition(SessionStatus::Disconnected).unwrap();
        assert_eq!(sm.current(), SessionStatus::Disconnected);
    }

    #[test]
    fn test_state_machine_rejects_invalid_transition() {
        let sm = StateMachine::new();
        let result = sm.transition(SessionStatus::Connected);
        assert!(matches!(
            result,
            Err(SessionError::InvalidTransition(
                SessionStatus::Idle,
                SessionStatus::Connected
            ))
        ));
        assert_eq!(sm.current(), SessionStatus::Idle);
    }

    #[test]
    fn test_state_machine_clone_is_shared() {
        let sm1 = StateMachine::new();
        let sm2 = sm1.clone();
        sm1.transition(SessionStatus::Connecting).unwrap();
        assert_eq!(sm2.current(), SessionStatus::Connecting);
    }

    #[test]
    fn test_second_connect_attempt_rejected() {
        let sm = StateMachine::new();
        sm.transition(SessionStatus::Connecting).unwrap();
        // A second connect attempt while already connecting must fail
        assert!(sm.transition(SessionStatus::Connecting).is_err());
    }
}
