//! Grammar session state machine with thread-safe transitions.
//!
//! A session exists only while its grammar is somewhere between load and
//! unload; `Unloaded` is the terminal state reached just before the session
//! is dropped. Valid transitions:
//! - Loading -> Loaded (engine accepted the grammar)
//! - Loading -> Unloaded (engine rejected the grammar; session rolls back)
//! - Loaded -> Unloading (unload started)
//! - Unloading -> Unloaded (engine handle released)

use std::fmt;
use std::sync::Mutex;

use crate::error::GrammarError;

/// Lifecycle state of a grammar session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Grammar bytes submitted; waiting for the engine handle.
    Loading,
    /// Engine handle held; rules may be activated.
    Loaded,
    /// Unload in progress; the engine handle is being released.
    Unloading,
    /// Terminal. A new load creates a new session.
    Unloaded,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Loading => write!(f, "Loading"),
            SessionState::Loaded => write!(f, "Loaded"),
            SessionState::Unloading => write!(f, "Unloading"),
            SessionState::Unloaded => write!(f, "Unloaded"),
        }
    }
}

impl SessionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Loading, SessionState::Loaded)
                | (SessionState::Loading, SessionState::Unloaded)
                | (SessionState::Loaded, SessionState::Unloading)
                | (SessionState::Unloading, SessionState::Unloaded)
        )
    }
}

/// Thread-safe state machine for one grammar session.
///
/// All transitions are validated before being applied, returning an error if
/// the requested transition is not permitted from the current state.
#[derive(Debug)]
pub struct SessionStateMachine {
    state: Mutex<SessionState>,
}

impl SessionStateMachine {
    /// Create a state machine for a freshly registered session (`Loading`).
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Loading),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> SessionState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    pub fn transition(&self, target: SessionState) -> Result<(), GrammarError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Session state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(GrammarError::InvalidState(format!(
                "invalid state transition: {} -> {}",
                *state, target
            )))
        }
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Loading.to_string(), "Loading");
        assert_eq!(SessionState::Loaded.to_string(), "Loaded");
        assert_eq!(SessionState::Unloading.to_string(), "Unloading");
        assert_eq!(SessionState::Unloaded.to_string(), "Unloaded");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(SessionState::Loading.can_transition_to(&SessionState::Loaded));
        assert!(SessionState::Loading.can_transition_to(&SessionState::Unloaded));
        assert!(SessionState::Loaded.can_transition_to(&SessionState::Unloading));
        assert!(SessionState::Unloading.can_transition_to(&SessionState::Unloaded));
    }

    #[test]
    fn test_invalid_transitions() {
        // Unloaded is terminal.
        assert!(!SessionState::Unloaded.can_transition_to(&SessionState::Loading));
        assert!(!SessionState::Unloaded.can_transition_to(&SessionState::Loaded));

        // Cannot skip states.
        assert!(!SessionState::Loading.can_transition_to(&SessionState::Unloading));
        assert!(!SessionState::Loaded.can_transition_to(&SessionState::Unloaded));

        // Cannot go backwards.
        assert!(!SessionState::Loaded.can_transition_to(&SessionState::Loading));
        assert!(!SessionState::Unloading.can_transition_to(&SessionState::Loaded));

        // Cannot transition to self.
        assert!(!SessionState::Loading.can_transition_to(&SessionState::Loading));
        assert!(!SessionState::Loaded.can_transition_to(&SessionState::Loaded));
    }

    #[test]
    fn test_machine_happy_path() {
        let sm = SessionStateMachine::new();
        assert_eq!(sm.current(), SessionState::Loading);

        sm.transition(SessionState::Loaded).unwrap();
        sm.transition(SessionState::Unloading).unwrap();
        sm.transition(SessionState::Unloaded).unwrap();
        assert_eq!(sm.current(), SessionState::Unloaded);
    }

    #[test]
    fn test_machine_rollback_path() {
        let sm = SessionStateMachine::new();
        sm.transition(SessionState::Unloaded).unwrap();
        assert_eq!(sm.current(), SessionState::Unloaded);
    }

    #[test]
    fn test_machine_rejects_invalid_transition() {
        let sm = SessionStateMachine::new();
        let err = sm.transition(SessionState::Unloading).unwrap_err();
        assert!(matches!(err, GrammarError::InvalidState(_)));
        assert_eq!(sm.current(), SessionState::Loading);
    }

    #[test]
    fn test_transition_error_names_both_states() {
        let sm = SessionStateMachine::new();
        match sm.transition(SessionState::Unloading) {
            Err(GrammarError::InvalidState(msg)) => {
                assert!(msg.contains("Loading"));
                assert!(msg.contains("Unloading"));
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }
}
