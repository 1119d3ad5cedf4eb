//! Notification sink contracts.
//!
//! The engine pushes notifications on its own threads. Sinks adapt that push
//! contract: a [`GrammarSink`] is installed per loaded grammar, an
//! [`EngineSink`] once per connection. Hook methods default to no-ops and
//! must never panic into the engine's callback thread.

use std::ops::BitOr;

use crate::result::ResultGraph;

/// Notification categories a grammar sink asks the engine to deliver.
///
/// Declared up front via [`GrammarSink::sink_flags`]; categories not
/// requested are never delivered, which keeps callback volume down and
/// avoids handling speculative results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkFlags(pub u32);

impl SinkFlags {
    /// Completed recognitions for this grammar.
    pub const PHRASE_FINISH: SinkFlags = SinkFlags(0x1);
    /// Partial/speculative hypotheses while a phrase is in flight.
    pub const PHRASE_HYPOTHESIS: SinkFlags = SinkFlags(0x2);
    /// Recognitions that matched some other grammar.
    pub const FOREIGN_FINISH: SinkFlags = SinkFlags(0x4);

    pub const fn contains(self, other: SinkFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SinkFlags {
    type Output = SinkFlags;

    fn bitor(self, rhs: SinkFlags) -> SinkFlags {
        SinkFlags(self.0 | rhs.0)
    }
}

/// Flags delivered with a phrase notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseFlags(pub u32);

impl PhraseFlags {
    /// The phrase was recognized (as opposed to rejected).
    pub const RECOGNIZED: PhraseFlags = PhraseFlags(0x1);
    /// The phrase matched the grammar this sink is installed for.
    pub const THIS_GRAMMAR: PhraseFlags = PhraseFlags(0x2);

    pub const fn contains(self, other: PhraseFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PhraseFlags {
    type Output = PhraseFlags;

    fn bitor(self, rhs: PhraseFlags) -> PhraseFlags {
        PhraseFlags(self.0 | rhs.0)
    }
}

/// Per-grammar notification sink, installed at grammar load.
///
/// `phrase_finish` is the one notification the core consumes; the remaining
/// methods are hook points for future extension and default to doing
/// nothing.
pub trait GrammarSink: Send + Sync {
    /// A recognition pass completed. `result` is `None` when the engine
    /// signaled completion without producing a result; that is not an error.
    /// The sink owns the result graph and releases it by dropping it.
    fn phrase_finish(&self, flags: PhraseFlags, result: Option<Box<dyn ResultGraph>>);

    /// The engine started recognizing a phrase.
    fn phrase_start(&self) {}

    /// A speculative partial recognition.
    fn phrase_hypothesis(&self, _flags: PhraseFlags) {}

    /// A bookmark previously planted in the audio stream was reached.
    fn bookmark(&self, _mark: u32) {}

    /// A training pass touched this grammar.
    fn training(&self, _flags: u32) {}

    /// The engine asked for a result to be re-evaluated.
    fn reevaluate(&self) {}

    /// A previously archived result was restored.
    fn unarchive(&self) {}

    /// Recognition against this grammar was paused.
    fn paused(&self) {}

    /// Which notification categories this sink wants delivered.
    fn sink_flags(&self) -> SinkFlags {
        SinkFlags::PHRASE_FINISH
    }
}

/// Notification categories an engine-level sink asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSinkFlags(pub u32);

impl EngineSinkFlags {
    /// Pause notifications (grammar-change windows).
    pub const PAUSED: EngineSinkFlags = EngineSinkFlags(0x1);
    /// Engine attribute changes.
    pub const ATTRIB: EngineSinkFlags = EngineSinkFlags(0x2);
    /// Engine-reported errors.
    pub const ERROR: EngineSinkFlags = EngineSinkFlags(0x4);

    pub const fn contains(self, other: EngineSinkFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EngineSinkFlags {
    type Output = EngineSinkFlags;

    fn bitor(self, rhs: EngineSinkFlags) -> EngineSinkFlags {
        EngineSinkFlags(self.0 | rhs.0)
    }
}

/// Engine-level notification sink, registered once per connection.
pub trait EngineSink: Send + Sync {
    /// The engine suspended recognition and expects the host to perform any
    /// grammar changes, then resume with the same cookie. Failing to resume
    /// deadlocks the recognition pipeline; this is a hard obligation, not
    /// best-effort.
    fn paused(&self, cookie: u64);

    /// An engine attribute changed.
    fn attrib_changed(&self, _attrib: u32) {}

    /// The engine reported an internal error.
    fn error_happened(&self) {}

    /// Noise or cross-talk interfered with recognition.
    fn interference(&self) {}

    /// An utterance began.
    fn utterance_begin(&self) {}

    /// An utterance ended.
    fn utterance_end(&self) {}

    /// Which notification categories this sink wants delivered.
    fn sink_flags(&self) -> EngineSinkFlags {
        EngineSinkFlags::PAUSED | EngineSinkFlags::ATTRIB | EngineSinkFlags::ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_flags_bitor_and_contains() {
        let flags = SinkFlags::PHRASE_FINISH | SinkFlags::PHRASE_HYPOTHESIS;
        assert!(flags.contains(SinkFlags::PHRASE_FINISH));
        assert!(flags.contains(SinkFlags::PHRASE_HYPOTHESIS));
        assert!(!flags.contains(SinkFlags::FOREIGN_FINISH));
    }

    #[test]
    fn test_phrase_flags_contains() {
        let flags = PhraseFlags::RECOGNIZED | PhraseFlags::THIS_GRAMMAR;
        assert!(flags.contains(PhraseFlags::RECOGNIZED));
        assert!(!PhraseFlags::RECOGNIZED.contains(PhraseFlags::THIS_GRAMMAR));
    }

    #[test]
    fn test_default_grammar_sink_requests_phrase_finish_only() {
        struct Sink;
        impl GrammarSink for Sink {
            fn phrase_finish(
                &self,
                _flags: PhraseFlags,
                _result: Option<Box<dyn crate::result::ResultGraph>>,
            ) {
            }
        }

        let flags = Sink.sink_flags();
        assert!(flags.contains(SinkFlags::PHRASE_FINISH));
        assert!(!flags.contains(SinkFlags::PHRASE_HYPOTHESIS));
        assert!(!flags.contains(SinkFlags::FOREIGN_FINISH));
    }

    #[test]
    fn test_default_engine_sink_requests_paused() {
        struct Sink;
        impl EngineSink for Sink {
            fn paused(&self, _cookie: u64) {}
        }

        assert!(Sink.sink_flags().contains(EngineSinkFlags::PAUSED));
    }
}
