//! Grammar service - the host-facing API over the engine connection.
//!
//! One service instance owns the session registry and the engine capability
//! handles for the lifetime of the connection. Every operation is keyed by
//! grammar identity; per-session work serializes on the session lock while
//! the registry lock is held only for the map lookup itself.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use parlance_core::config::ParlanceConfig;
use parlance_core::events::GrammarEvent;
use parlance_core::types::{GrammarId, RecognitionResult, WindowHandle};
use parlance_engine::{
    EngineConnection, GrammarFormat, Recognizer, WindowSystem,
};

use crate::error::{
    classify_activation_error, classify_deactivation_error, classify_grammar_op_error,
    classify_load_error, GrammarError,
};
use crate::registry::GrammarRegistry;
use crate::sink::{EngineNotifySink, PhraseSink};

/// Host-facing grammar session manager.
pub struct GrammarService {
    recognizer: Arc<dyn Recognizer>,
    windows: Arc<dyn WindowSystem>,
    registry: Arc<GrammarRegistry>,
    format: GrammarFormat,
    result_capacity: usize,
    events: broadcast::Sender<GrammarEvent>,
}

impl GrammarService {
    /// Build a service over an established engine connection and install the
    /// engine-level notification sink.
    pub fn new(
        connection: &EngineConnection,
        windows: Arc<dyn WindowSystem>,
        config: &ParlanceConfig,
    ) -> Result<Self, GrammarError> {
        let format = GrammarFormat::from_name(&config.engine.grammar_format).ok_or_else(|| {
            GrammarError::InvalidArgument(format!(
                "unknown grammar format: {:?}",
                config.engine.grammar_format
            ))
        })?;

        let (events, _) = broadcast::channel(config.notify.event_buffer.max(1));

        let engine_sink = Arc::new(EngineNotifySink::new(
            Arc::clone(&connection.control),
            events.clone(),
        ));
        connection
            .recognizer
            .register_engine_sink(engine_sink)
            .map_err(classify_grammar_op_error)?;

        info!(format = ?format, "Grammar service started");

        Ok(Self {
            recognizer: Arc::clone(&connection.recognizer),
            windows,
            registry: Arc::new(GrammarRegistry::new()),
            format,
            result_capacity: config.notify.effective_result_capacity(),
            events,
        })
    }

    /// Load serialized grammar bytes into the engine under `grammar_id`.
    ///
    /// On success the grammar's session is registered and the returned
    /// receiver yields its decoded recognition results. On engine rejection
    /// the session is fully rolled back; the identity can be reused
    /// immediately.
    pub fn load_grammar(
        &self,
        grammar_id: GrammarId,
        bytes: &[u8],
    ) -> Result<mpsc::Receiver<RecognitionResult>, GrammarError> {
        if bytes.is_empty() {
            return Err(GrammarError::InvalidArgument(
                "grammar bytes are empty".to_string(),
            ));
        }

        let session = self.registry.register(grammar_id)?;

        let (results_tx, results_rx) = mpsc::channel(self.result_capacity);
        let sink = Arc::new(PhraseSink::new(
            grammar_id,
            Arc::downgrade(&self.registry),
            results_tx,
            self.events.clone(),
        ));

        match self.recognizer.grammar_load(self.format, bytes, sink) {
            Ok(channel) => {
                let session_id = {
                    let mut guard = session.lock().expect("session mutex poisoned");
                    guard.attach_channel(channel)?;
                    guard.session_id()
                };

                info!(%grammar_id, %session_id, byte_len = bytes.len(), "Grammar loaded");
                let _ = self.events.send(GrammarEvent::GrammarLoaded {
                    grammar_id,
                    byte_len: bytes.len(),
                    timestamp: chrono::Utc::now(),
                });
                Ok(results_rx)
            }
            Err(e) => {
                // Roll back so the identity is immediately reusable.
                if let Err(rollback) = session
                    .lock()
                    .expect("session mutex poisoned")
                    .abort_load()
                {
                    warn!(%grammar_id, error = %rollback, "Load rollback failed");
                }
                let _ = self.registry.unregister(grammar_id);

                let classified = classify_load_error(e);
                warn!(%grammar_id, error = %classified, "Grammar load rejected");
                Err(classified)
            }
        }
    }

    /// Tear down the session for `grammar_id` and release its engine handle.
    ///
    /// The session leaves the registry before the handle is released, so a
    /// notification racing the unload finds no live session and is dropped.
    pub fn unload_grammar(&self, grammar_id: GrammarId) -> Result<(), GrammarError> {
        let session = self.registry.lookup(grammar_id)?;

        {
            let guard = session.lock().expect("session mutex poisoned");
            if !guard.has_channel() {
                return Err(GrammarError::InvalidState(format!(
                    "grammar {grammar_id} is still loading"
                )));
            }
        }

        self.registry.unregister(grammar_id)?;

        let (session_id, dropped_rules) = {
            let mut guard = session.lock().expect("session mutex poisoned");
            guard.begin_unload()?;
            (guard.session_id(), guard.release_channel()?)
        };

        if !dropped_rules.is_empty() {
            warn!(
                %grammar_id,
                rules = ?dropped_rules,
                "Rules still active at unload; dropped with the grammar"
            );
        }

        info!(%grammar_id, %session_id, "Grammar unloaded");
        let _ = self.events.send(GrammarEvent::GrammarUnloaded {
            grammar_id,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Activate `rule`, optionally scoped to a host window.
    ///
    /// Activation targeting a window that no longer exists is dropped
    /// silently: the window closed between the caller deciding and us
    /// acting, which is routine, not an error. Re-activating an already
    /// active rule is a no-op; the engine is not called again.
    pub fn activate_rule(
        &self,
        grammar_id: GrammarId,
        window: Option<WindowHandle>,
        rule: &str,
    ) -> Result<(), GrammarError> {
        if rule.is_empty() {
            return Err(GrammarError::InvalidArgument(
                "rule name is empty".to_string(),
            ));
        }

        let session = self.registry.lookup(grammar_id)?;

        if let Some(handle) = window {
            if !self.windows.is_window_valid(handle) {
                debug!(%grammar_id, rule, window = handle.0, "Target window gone; activation dropped");
                return Ok(());
            }
        }

        {
            let mut guard = session.lock().expect("session mutex poisoned");
            if guard.active_rules.contains(rule) {
                debug!(%grammar_id, rule, "Rule already active; nothing to do");
                return Ok(());
            }

            let channel = guard.channel()?;
            channel
                .activate(window, false, rule)
                .map_err(|e| classify_activation_error(rule, e))?;
            guard.active_rules.insert(rule);
        }

        debug!(%grammar_id, rule, "Rule activated");
        let _ = self.events.send(GrammarEvent::RuleActivated {
            grammar_id,
            rule: rule.to_string(),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Deactivate `rule`.
    ///
    /// A rule this service never activated fails locally; the engine is not
    /// asked to deactivate something it was never told about.
    pub fn deactivate_rule(&self, grammar_id: GrammarId, rule: &str) -> Result<(), GrammarError> {
        let session = self.registry.lookup(grammar_id)?;

        {
            let mut guard = session.lock().expect("session mutex poisoned");
            if !guard.active_rules.contains(rule) {
                return Err(GrammarError::RuleNotActive {
                    rule: rule.to_string(),
                    code: None,
                });
            }

            let channel = guard.channel()?;
            channel
                .deactivate(rule)
                .map_err(|e| classify_deactivation_error(rule, e))?;
            guard.active_rules.remove(rule);
        }

        debug!(%grammar_id, rule, "Rule deactivated");
        let _ = self.events.send(GrammarEvent::RuleDeactivated {
            grammar_id,
            rule: rule.to_string(),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Set the grammar's engine-side exclusivity flag. While set, the engine
    /// suppresses recognition against other grammars.
    pub fn set_exclusive_grammar(
        &self,
        grammar_id: GrammarId,
        exclusive: bool,
    ) -> Result<(), GrammarError> {
        let session = self.registry.lookup(grammar_id)?;

        {
            let guard = session.lock().expect("session mutex poisoned");
            let channel = guard.channel()?;
            channel
                .set_special(exclusive)
                .map_err(classify_grammar_op_error)?;
        }

        info!(%grammar_id, exclusive, "Exclusivity changed");
        let _ = self.events.send(GrammarEvent::ExclusiveChanged {
            grammar_id,
            exclusive,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Identities of every currently loaded grammar.
    pub fn loaded_grammars(&self) -> Vec<GrammarId> {
        self.registry.grammar_ids()
    }

    /// Subscribe to the service's domain events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GrammarEvent> {
        self.events.subscribe()
    }

    /// Unload every loaded grammar, logging failures instead of stopping.
    /// Used at host shutdown.
    pub fn unload_all(&self) {
        for grammar_id in self.registry.grammar_ids() {
            if let Err(e) = self.unload_grammar(grammar_id) {
                warn!(%grammar_id, error = %e, "Unload failed during shutdown");
            }
        }
    }
}

// ===== Tests =====
