//! Parlance grammar crate - grammar session management.
//!
//! Tracks which grammars are loaded into the speech engine and which rules
//! are active, and turns the engine's asynchronous phrase-finish
//! notifications into decoded [`parlance_core::types::RecognitionResult`]s
//! delivered on a bounded channel per session. The session lifecycle is a
//! strict state machine: Loading -> Loaded -> Unloading -> Unloaded.

pub mod decode;
pub mod error;
pub mod registry;
pub mod rules;
pub mod service;
pub mod session;
pub mod sink;
pub mod state;

pub use error::GrammarError;
pub use registry::GrammarRegistry;
pub use rules::ActiveRuleSet;
pub use service::GrammarService;
pub use session::GrammarSession;
pub use sink::{EngineNotifySink, PhraseSink, ResumeGuard};
pub use state::SessionState;
