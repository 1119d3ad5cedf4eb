//! Runtime state for one loaded grammar.

use std::sync::Arc;

use uuid::Uuid;

use parlance_core::types::GrammarId;
use parlance_engine::GrammarChannel;

use crate::error::GrammarError;
use crate::rules::ActiveRuleSet;
use crate::state::{SessionState, SessionStateMachine};

/// The per-grammar session created at load and destroyed at unload.
///
/// Owns the engine-side grammar handle (the command channel) and the active
/// rule set. The handle is set exactly once, when the engine accepts the
/// grammar, and cleared exactly once, on unload; dropping the last reference
/// releases it engine-side.
pub struct GrammarSession {
    grammar_id: GrammarId,
    session_id: Uuid,
    state: SessionStateMachine,
    channel: Option<Arc<dyn GrammarChannel>>,
    /// Rules currently active for this session. Guarded by the session's
    /// outer lock, like the rest of the struct.
    pub(crate) active_rules: ActiveRuleSet,
}

impl GrammarSession {
    /// Create a session in the `Loading` state, before the engine has
    /// answered.
    pub fn new(grammar_id: GrammarId) -> Self {
        Self {
            grammar_id,
            session_id: Uuid::new_v4(),
            state: SessionStateMachine::new(),
            channel: None,
            active_rules: ActiveRuleSet::new(),
        }
    }

    pub fn grammar_id(&self) -> GrammarId {
        self.grammar_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Store the engine handle returned by a successful load and move to
    /// `Loaded`. Fails if a handle was already set.
    pub fn attach_channel(&mut self, channel: Arc<dyn GrammarChannel>) -> Result<(), GrammarError> {
        if self.channel.is_some() {
            return Err(GrammarError::InvalidState(
                "engine handle is already set".to_string(),
            ));
        }
        self.state.transition(SessionState::Loaded)?;
        self.channel = Some(channel);
        Ok(())
    }

    /// The engine handle, required for any rule operation.
    pub fn channel(&self) -> Result<Arc<dyn GrammarChannel>, GrammarError> {
        self.channel.clone().ok_or_else(|| {
            GrammarError::InvalidState("engine handle is not set".to_string())
        })
    }

    /// Roll the session back after the engine rejected the load.
    pub fn abort_load(&mut self) -> Result<(), GrammarError> {
        self.state.transition(SessionState::Unloaded)
    }

    /// Start tearing the session down.
    pub fn begin_unload(&mut self) -> Result<(), GrammarError> {
        self.state.transition(SessionState::Unloading)
    }

    /// Release the engine handle and finish the teardown. Any rules still
    /// active are implicitly dropped and returned for logging.
    pub fn release_channel(&mut self) -> Result<Vec<String>, GrammarError> {
        let channel = self.channel.take().ok_or_else(|| {
            GrammarError::InvalidState("engine handle is not set".to_string())
        })?;
        let dropped_rules = self.active_rules.drain();
        drop(channel);
        self.state.transition(SessionState::Unloaded)?;
        Ok(dropped_rules)
    }
}
