//! Notification sinks installed with the engine.
//!
//! The engine calls these on its own threads. Nothing here may panic or
//! block; every failure is logged and contained, and the native result
//! handle is released on every path by dropping the owned graph.

use std::sync::{Arc, Weak};

use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

use parlance_core::events::GrammarEvent;
use parlance_core::types::{GrammarId, RecognitionResult};
use parlance_engine::{EngineControl, EngineSink, GrammarSink, PhraseFlags, ResultGraph};

use crate::decode::decode_best_path;
use crate::registry::GrammarRegistry;

/// Per-grammar recognition sink.
///
/// Decodes phrase-finish notifications and pushes the result onto the
/// session's bounded channel. Holds the registry weakly: once the grammar's
/// session is gone (or the whole registry is), arriving results are dropped
/// silently, which is what makes unload safe against in-flight
/// notifications.
pub struct PhraseSink {
    grammar_id: GrammarId,
    registry: Weak<GrammarRegistry>,
    results: mpsc::Sender<RecognitionResult>,
    events: broadcast::Sender<GrammarEvent>,
}

impl PhraseSink {
    pub fn new(
        grammar_id: GrammarId,
        registry: Weak<GrammarRegistry>,
        results: mpsc::Sender<RecognitionResult>,
        events: broadcast::Sender<GrammarEvent>,
    ) -> Self {
        Self {
            grammar_id,
            registry,
            results,
            events,
        }
    }
}

impl GrammarSink for PhraseSink {
    fn phrase_finish(&self, flags: PhraseFlags, result: Option<Box<dyn ResultGraph>>) {
        trace!(grammar_id = %self.grammar_id, flags = ?flags, "Phrase finish");

        // Completion without a result object is a valid signal, not an error.
        let Some(graph) = result else {
            debug!(grammar_id = %self.grammar_id, "Phrase finish without result");
            return;
        };

        // Liveness check: the grammar may have been unloaded between the
        // engine producing this notification and us receiving it.
        let Some(registry) = self.registry.upgrade() else {
            debug!(grammar_id = %self.grammar_id, "Registry gone; dropping result");
            return;
        };
        if !registry.contains(self.grammar_id) {
            debug!(grammar_id = %self.grammar_id, "Grammar unloaded; dropping result");
            return;
        }

        let phrase = match decode_best_path(graph.as_ref()) {
            Ok(phrase) => phrase,
            Err(e) => {
                warn!(grammar_id = %self.grammar_id, error = %e, "Result decode failed");
                return;
            }
        };

        let word_count = phrase.words.len();
        let rule_tag = phrase.rule_tag;
        let recognition = RecognitionResult {
            grammar_id: self.grammar_id,
            rule_tag,
            words: phrase.words,
        };

        match self.results.try_send(recognition) {
            Ok(()) => {
                let _ = self.events.send(GrammarEvent::PhraseRecognized {
                    grammar_id: self.grammar_id,
                    rule_tag,
                    word_count,
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(TrySendError::Full(_)) => {
                warn!(grammar_id = %self.grammar_id, "Result channel full; dropping recognition");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(grammar_id = %self.grammar_id, "Result receiver dropped; dropping recognition");
            }
        }
        // `graph` drops here on every path, releasing the native handle.
    }
}

/// Guard for the engine's pause cookie.
///
/// The engine stays suspended until it sees the cookie back; dropping the
/// guard resumes, so the obligation holds on every path out of the pause
/// handler.
pub struct ResumeGuard {
    control: Arc<dyn EngineControl>,
    cookie: u64,
    resumed: bool,
}

impl ResumeGuard {
    pub fn new(control: Arc<dyn EngineControl>, cookie: u64) -> Self {
        Self {
            control,
            cookie,
            resumed: false,
        }
    }

    /// Resume explicitly. Resuming through the guard more than once is a
    /// no-op.
    pub fn resume(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if self.resumed {
            return;
        }
        self.resumed = true;
        if let Err(e) = self.control.resume(self.cookie) {
            warn!(cookie = self.cookie, error = %e, "Engine resume failed");
        }
    }
}

impl Drop for ResumeGuard {
    fn drop(&mut self) {
        self.fire();
    }
}

/// Engine-level sink handling pause coordination.
///
/// On pause the engine hands the host a window to perform grammar changes;
/// rule activation issued by the host runs through its own calls already, so
/// the only obligation here is to resume with the same cookie.
pub struct EngineNotifySink {
    control: Arc<dyn EngineControl>,
    events: broadcast::Sender<GrammarEvent>,
}

impl EngineNotifySink {
    pub fn new(control: Arc<dyn EngineControl>, events: broadcast::Sender<GrammarEvent>) -> Self {
        Self { control, events }
    }
}

impl EngineSink for EngineNotifySink {
    fn paused(&self, cookie: u64) {
        debug!(cookie, "Engine paused for grammar processing");
        let _ = self.events.send(GrammarEvent::EnginePaused {
            cookie,
            timestamp: chrono::Utc::now(),
        });

        let guard = ResumeGuard::new(Arc::clone(&self.control), cookie);
        // No pending activation work in this host; resume immediately.
        guard.resume();

        let _ = self.events.send(GrammarEvent::EngineResumed {
            cookie,
            timestamp: chrono::Utc::now(),
        });
        debug!(cookie, "Engine resumed");
    }
}
