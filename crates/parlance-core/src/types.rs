//! Shared identity and recognition types.
//!
//! Grammars are keyed by opaque identity: two `GrammarId`s are equal only if
//! they are the same id, never because two grammars have the same content.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp used on all domain events.
pub type Timestamp = DateTime<Utc>;

/// Opaque identity of a grammar owned by the host application.
///
/// The host mints an id per grammar instance and uses it for every call into
/// the grammar service. Identity equality, not content equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrammarId(Uuid);

impl GrammarId {
    /// Mint a fresh grammar identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GrammarId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GrammarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque handle to a host window, used as an activation context.
///
/// The grammar service never interprets the value; it only asks the host's
/// window system whether the handle still refers to a live window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// One recognized word from the engine's best recognition path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedWord {
    /// Engine-assigned numeric word id.
    pub id: u32,
    /// Display text of the word.
    pub text: String,
    /// Parse tag identifying the grammar rule this word matched, if the
    /// engine reported one.
    pub parse_tag: Option<u32>,
}

/// A decoded phrase-finish notification: the ordered best-path word sequence.
///
/// Word order is spoken order. Results are transient; they are delivered on
/// the session's channel and not persisted anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Grammar the result belongs to.
    pub grammar_id: GrammarId,
    /// Parse tag of the matched rule, if the path carried one.
    pub rule_tag: Option<u32>,
    /// Recognized words in spoken order.
    pub words: Vec<RecognizedWord>,
}

impl RecognitionResult {
    /// The recognized phrase as a single space-joined string.
    pub fn phrase(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_id_identity_equality() {
        let a = GrammarId::new();
        let b = GrammarId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_grammar_id_usable_as_map_key() {
        use std::collections::HashMap;

        let id = GrammarId::new();
        let mut map = HashMap::new();
        map.insert(id, "g1");
        assert_eq!(map.get(&id), Some(&"g1"));
        assert_eq!(map.get(&GrammarId::new()), None);
    }

    #[test]
    fn test_window_handle_display() {
        assert_eq!(WindowHandle(0xdead).to_string(), "0xdead");
    }

    #[test]
    fn test_recognition_result_phrase() {
        let result = RecognitionResult {
            grammar_id: GrammarId::new(),
            rule_tag: Some(3),
            words: vec![
                RecognizedWord {
                    id: 10,
                    text: "HELLO".to_string(),
                    parse_tag: Some(3),
                },
                RecognizedWord {
                    id: 11,
                    text: "WORLD".to_string(),
                    parse_tag: None,
                },
            ],
        };
        assert_eq!(result.phrase(), "HELLO WORLD");
    }

    #[test]
    fn test_recognition_result_serde_round_trip() {
        let result = RecognitionResult {
            grammar_id: GrammarId::new(),
            rule_tag: None,
            words: vec![RecognizedWord {
                id: 1,
                text: "go".to_string(),
                parse_tag: Some(7),
            }],
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: RecognitionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
