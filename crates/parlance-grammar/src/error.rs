//! Error taxonomy for grammar session management.
//!
//! Local invariant violations (registry and state errors) are detected
//! before any engine call. Engine-reported failures are classified by
//! diagnostic code against a known table; unrecognized codes degrade to a
//! catch-all variant without losing the original code.

use thiserror::Error;

use parlance_core::types::GrammarId;
use parlance_engine::{codes, EngineCallError, EngineCode};

/// Errors from grammar load, unload, and rule activation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GrammarError {
    /// Local validation failure; the engine was never called.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A session already exists for this grammar identity.
    #[error("Grammar already loaded: {0}")]
    AlreadyLoaded(GrammarId),

    /// No session exists for this grammar identity.
    #[error("Grammar not loaded: {0}")]
    NotLoaded(GrammarId),

    /// The session is not in a state that permits the operation.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// The engine rejected the grammar bytes as malformed.
    #[error("Grammar format rejected by engine ({code}): {message}")]
    GrammarFormat { code: EngineCode, message: String },

    /// The engine rejected the grammar's content.
    #[error("Grammar content rejected by engine ({code}): {message}")]
    GrammarContent { code: EngineCode, message: String },

    /// Activation named a rule the grammar does not define.
    #[error("Invalid rule: {rule} ({code})")]
    InvalidRule { rule: String, code: EngineCode },

    /// The grammar exceeds the engine's complexity limits.
    #[error("Grammar too complex ({code})")]
    GrammarTooComplex { code: EngineCode },

    /// The engine already considers the rule active.
    #[error("Rule already active: {rule} ({code})")]
    RuleAlreadyActive { rule: String, code: EngineCode },

    /// The rule is not active. Detected locally when possible; `code` is
    /// present when the engine reported it.
    #[error("Rule not active: {rule}")]
    RuleNotActive {
        rule: String,
        code: Option<EngineCode>,
    },

    /// A recognition result could not be decoded. Fatal for that
    /// notification only, never for the session.
    #[error("Invalid recognition result: {0}")]
    InvalidResult(String),

    /// Catch-all for unmapped engine failures during rule operations.
    #[error("Unexpected grammar error ({code}): {message}")]
    UnexpectedGrammar { code: EngineCode, message: String },

    /// Catch-all for unmapped engine failures during load.
    #[error("Engine error ({code}): {message}")]
    Engine { code: EngineCode, message: String },
}

/// Flatten an engine call error into its diagnostic code and message. A size
/// signal escaping a non-sized call is a protocol violation and folds into
/// code zero.
fn split(err: EngineCallError) -> (EngineCode, String) {
    match err {
        EngineCallError::Failed { code, message } => (code, message),
        e @ EngineCallError::BufferTooSmall { .. } => (EngineCode(0), e.to_string()),
    }
}

/// Classify an engine failure from `grammar_load`.
pub fn classify_load_error(err: EngineCallError) -> GrammarError {
    let (code, message) = split(err);
    if code == codes::INVALID_CHAR {
        GrammarError::GrammarFormat { code, message }
    } else if code == codes::GRAMMAR_ERROR {
        GrammarError::GrammarContent { code, message }
    } else {
        GrammarError::Engine { code, message }
    }
}

/// Classify an engine failure from rule activation.
pub fn classify_activation_error(rule: &str, err: EngineCallError) -> GrammarError {
    let (code, message) = split(err);
    if code == codes::INVALID_RULE {
        GrammarError::InvalidRule {
            rule: rule.to_string(),
            code,
        }
    } else if code == codes::GRAMMAR_TOO_COMPLEX {
        GrammarError::GrammarTooComplex { code }
    } else if code == codes::RULE_ALREADY_ACTIVE {
        GrammarError::RuleAlreadyActive {
            rule: rule.to_string(),
            code,
        }
    } else {
        GrammarError::UnexpectedGrammar { code, message }
    }
}

/// Classify an engine failure from rule deactivation.
pub fn classify_deactivation_error(rule: &str, err: EngineCallError) -> GrammarError {
    let (code, message) = split(err);
    if code == codes::RULE_NOT_ACTIVE {
        GrammarError::RuleNotActive {
            rule: rule.to_string(),
            code: Some(code),
        }
    } else {
        GrammarError::UnexpectedGrammar { code, message }
    }
}

/// Classify an engine failure from an advisory grammar operation.
pub fn classify_grammar_op_error(err: EngineCallError) -> GrammarError {
    let (code, message) = split(err);
    GrammarError::UnexpectedGrammar { code, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(code: EngineCode) -> EngineCallError {
        EngineCallError::failed(code, "engine said no")
    }

    #[test]
    fn test_load_classification() {
        assert!(matches!(
            classify_load_error(failed(codes::INVALID_CHAR)),
            GrammarError::GrammarFormat { .. }
        ));
        assert!(matches!(
            classify_load_error(failed(codes::GRAMMAR_ERROR)),
            GrammarError::GrammarContent { .. }
        ));
    }

    #[test]
    fn test_load_unknown_code_degrades_without_losing_code() {
        let unknown = EngineCode(0xDEAD_BEEF);
        match classify_load_error(failed(unknown)) {
            GrammarError::Engine { code, message } => {
                assert_eq!(code, unknown);
                assert_eq!(message, "engine said no");
            }
            other => panic!("expected Engine, got {other:?}"),
        }
    }

    #[test]
    fn test_activation_classification() {
        assert!(matches!(
            classify_activation_error("r", failed(codes::INVALID_RULE)),
            GrammarError::InvalidRule { .. }
        ));
        assert!(matches!(
            classify_activation_error("r", failed(codes::GRAMMAR_TOO_COMPLEX)),
            GrammarError::GrammarTooComplex { .. }
        ));
        assert!(matches!(
            classify_activation_error("r", failed(codes::RULE_ALREADY_ACTIVE)),
            GrammarError::RuleAlreadyActive { .. }
        ));
        assert!(matches!(
            classify_activation_error("r", failed(EngineCode(0x1))),
            GrammarError::UnexpectedGrammar { .. }
        ));
    }

    #[test]
    fn test_activation_error_keeps_rule_name() {
        match classify_activation_error("open_menu", failed(codes::INVALID_RULE)) {
            GrammarError::InvalidRule { rule, code } => {
                assert_eq!(rule, "open_menu");
                assert_eq!(code, codes::INVALID_RULE);
            }
            other => panic!("expected InvalidRule, got {other:?}"),
        }
    }

    #[test]
    fn test_deactivation_classification() {
        assert!(matches!(
            classify_deactivation_error("r", failed(codes::RULE_NOT_ACTIVE)),
            GrammarError::RuleNotActive { code: Some(_), .. }
        ));
        assert!(matches!(
            classify_deactivation_error("r", failed(EngineCode(0x2))),
            GrammarError::UnexpectedGrammar { .. }
        ));
    }

    #[test]
    fn test_size_signal_folds_into_catch_all() {
        let err = classify_load_error(EngineCallError::BufferTooSmall { needed: 4 });
        match err {
            GrammarError::Engine { code, message } => {
                assert_eq!(code, EngineCode(0));
                assert!(message.contains("4"));
            }
            other => panic!("expected Engine, got {other:?}"),
        }
    }

    #[test]
    fn test_display_carries_diagnostic_code() {
        let err = GrammarError::UnexpectedGrammar {
            code: EngineCode(0x8004_1234),
            message: "mystery".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("0x80041234"));
        assert!(text.contains("mystery"));
    }
}
