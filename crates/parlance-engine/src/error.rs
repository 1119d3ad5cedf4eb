use std::fmt;

use thiserror::Error;

/// Diagnostic code returned by the speech engine.
///
/// The engine reports failures as 32-bit status codes. A small table of
/// codes is meaningful to the grammar layer (see [`codes`]); everything else
/// is carried through unchanged so no diagnostic information is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineCode(pub u32);

impl fmt::Display for EngineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Engine diagnostic codes the grammar layer knows how to classify.
pub mod codes {
    use super::EngineCode;

    /// Grammar bytes contain a word or character the engine cannot accept.
    pub const INVALID_CHAR: EngineCode = EngineCode(0x8004_0310);
    /// Grammar bytes are structurally valid but the content is rejected.
    pub const GRAMMAR_ERROR: EngineCode = EngineCode(0x8004_0311);
    /// Activation names a rule the grammar does not define.
    pub const INVALID_RULE: EngineCode = EngineCode(0x8004_0312);
    /// The grammar exceeds the engine's complexity limits.
    pub const GRAMMAR_TOO_COMPLEX: EngineCode = EngineCode(0x8004_0313);
    /// The engine already considers the rule active.
    pub const RULE_ALREADY_ACTIVE: EngineCode = EngineCode(0x8004_0314);
    /// The engine does not consider the rule active.
    pub const RULE_NOT_ACTIVE: EngineCode = EngineCode(0x8004_0315);
    /// No speaker profile is currently selected.
    pub const NO_PROFILE_SELECTED: EngineCode = EngineCode(0x8004_0316);
}

/// A failed call into the speech engine.
#[derive(Debug, Error)]
pub enum EngineCallError {
    /// Sized query: the provided buffer cannot hold the answer. `needed` is
    /// the required entry count; nothing was written.
    #[error("Buffer too small: {needed} entries required")]
    BufferTooSmall { needed: usize },

    /// Any other engine failure, carrying the original diagnostic code.
    #[error("Engine call failed ({code}): {message}")]
    Failed { code: EngineCode, message: String },
}

impl EngineCallError {
    /// Construct a [`EngineCallError::Failed`] from a code and message.
    pub fn failed(code: EngineCode, message: impl Into<String>) -> Self {
        EngineCallError::Failed {
            code,
            message: message.into(),
        }
    }

    /// The diagnostic code, if this is an engine-reported failure.
    pub fn code(&self) -> Option<EngineCode> {
        match self {
            EngineCallError::Failed { code, .. } => Some(*code),
            EngineCallError::BufferTooSmall { .. } => None,
        }
    }
}

/// A specialized `Result` type for engine calls.
pub type EngineResult<T> = std::result::Result<T, EngineCallError>;
