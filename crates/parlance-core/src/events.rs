use serde::{Deserialize, Serialize};

use crate::types::{GrammarId, Timestamp};

/// Domain events emitted by the grammar service.
///
/// Events are broadcast after state changes and consumed by telemetry and UI
/// observers. They are advisory; dropping them never affects grammar state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GrammarEvent {
    /// A grammar was loaded into the engine and its session registered.
    GrammarLoaded {
        grammar_id: GrammarId,
        byte_len: usize,
        timestamp: Timestamp,
    },

    /// A grammar session was torn down and its engine handle released.
    GrammarUnloaded {
        grammar_id: GrammarId,
        timestamp: Timestamp,
    },

    /// A rule was activated with the engine.
    RuleActivated {
        grammar_id: GrammarId,
        rule: String,
        timestamp: Timestamp,
    },

    /// A rule was deactivated with the engine.
    RuleDeactivated {
        grammar_id: GrammarId,
        rule: String,
        timestamp: Timestamp,
    },

    /// The grammar's engine-side exclusivity flag was changed.
    ExclusiveChanged {
        grammar_id: GrammarId,
        exclusive: bool,
        timestamp: Timestamp,
    },

    /// A phrase-finish notification was decoded and delivered.
    PhraseRecognized {
        grammar_id: GrammarId,
        rule_tag: Option<u32>,
        word_count: usize,
        timestamp: Timestamp,
    },

    /// The engine paused recognition and handed control to the host.
    EnginePaused { cookie: u64, timestamp: Timestamp },

    /// The host resumed the engine's recognition pipeline.
    EngineResumed { cookie: u64, timestamp: Timestamp },
}
