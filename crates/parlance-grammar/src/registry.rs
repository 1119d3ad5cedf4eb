//! Grammar-identity to session mapping.
//!
//! At most one session may exist per grammar identity at any time; this is
//! the mutual-exclusion invariant protecting the engine from duplicate
//! loads. All operations are keyed by identity, never by grammar content.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use parlance_core::types::GrammarId;

use crate::error::GrammarError;
use crate::session::GrammarSession;

/// Shared handle to one session; per-session operations serialize on its
/// lock.
pub type SessionHandle = Arc<Mutex<GrammarSession>>;

/// Registry of live grammar sessions.
#[derive(Default)]
pub struct GrammarRegistry {
    sessions: Mutex<HashMap<GrammarId, SessionHandle>>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a session for `grammar_id`.
    ///
    /// Fails with [`GrammarError::AlreadyLoaded`] if a session already
    /// exists for that identity.
    pub fn register(&self, grammar_id: GrammarId) -> Result<SessionHandle, GrammarError> {
        let mut sessions = self.sessions.lock().expect("registry mutex poisoned");
        if sessions.contains_key(&grammar_id) {
            return Err(GrammarError::AlreadyLoaded(grammar_id));
        }
        let session = Arc::new(Mutex::new(GrammarSession::new(grammar_id)));
        sessions.insert(grammar_id, Arc::clone(&session));
        Ok(session)
    }

    /// Remove and return the session for `grammar_id`.
    pub fn unregister(&self, grammar_id: GrammarId) -> Result<SessionHandle, GrammarError> {
        let mut sessions = self.sessions.lock().expect("registry mutex poisoned");
        sessions
            .remove(&grammar_id)
            .ok_or(GrammarError::NotLoaded(grammar_id))
    }

    /// The session for `grammar_id`, if one is registered.
    pub fn lookup(&self, grammar_id: GrammarId) -> Result<SessionHandle, GrammarError> {
        let sessions = self.sessions.lock().expect("registry mutex poisoned");
        sessions
            .get(&grammar_id)
            .cloned()
            .ok_or(GrammarError::NotLoaded(grammar_id))
    }

    /// Whether a session is registered for `grammar_id`. Used as the
    /// liveness check on the notification path.
    pub fn contains(&self, grammar_id: GrammarId) -> bool {
        self.sessions
            .lock()
            .expect("registry mutex poisoned")
            .contains_key(&grammar_id)
    }

    /// Identities of all registered grammars.
    pub fn grammar_ids(&self) -> Vec<GrammarId> {
        self.sessions
            .lock()
            .expect("registry mutex poisoned")
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
