//! Capability traits for the external speech engine.
//!
//! The engine presents many views of one underlying connection; Parlance
//! models each view as an independent trait rather than an inheritance
//! chain. Implementations are obtained through
//! [`crate::capability::EngineConnection`]. All calls are synchronous from
//! the caller's perspective; recognition results arrive later through the
//! sink registered at grammar load.

use std::fmt;
use std::sync::Arc;

use parlance_core::types::WindowHandle;

use crate::buffer::fetch_sized;
use crate::error::{codes, EngineCallError, EngineResult};
use crate::sink::{EngineSink, GrammarSink};

/// Serialization format of grammar bytes submitted to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarFormat {
    /// Pre-compiled binary grammar.
    Compiled,
    /// Textual grammar source, compiled by the engine on load.
    Text,
}

impl GrammarFormat {
    /// Parse a configuration name ("compiled" / "text").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "compiled" => Some(GrammarFormat::Compiled),
            "text" => Some(GrammarFormat::Text),
            _ => None,
        }
    }
}

/// The engine's grammar-loading capability.
pub trait Recognizer: Send + Sync {
    /// Submit serialized grammar bytes together with the notification sink
    /// that will receive this grammar's recognition events.
    ///
    /// On success the engine returns the per-grammar command channel. The
    /// channel is the engine-side handle for the grammar; dropping the last
    /// reference releases it.
    fn grammar_load(
        &self,
        format: GrammarFormat,
        bytes: &[u8],
        sink: Arc<dyn GrammarSink>,
    ) -> EngineResult<Arc<dyn GrammarChannel>>;

    /// Register the engine-level notification sink (pause coordination,
    /// attribute changes). At most one sink is registered per connection.
    fn register_engine_sink(&self, sink: Arc<dyn EngineSink>) -> EngineResult<()>;
}

/// Per-loaded-grammar command channel returned by [`Recognizer::grammar_load`].
///
/// Exactly one channel exists per loaded grammar. Dropping the last `Arc`
/// releases the engine-side handle.
pub trait GrammarChannel: Send + Sync {
    /// Activate a named rule, optionally scoped to a host window.
    fn activate(
        &self,
        window: Option<WindowHandle>,
        exclusive: bool,
        rule: &str,
    ) -> EngineResult<()>;

    /// Deactivate a named rule.
    fn deactivate(&self, rule: &str) -> EngineResult<()>;

    /// Advisory exclusivity flag: while set, the engine suppresses
    /// recognition against other grammars.
    fn set_special(&self, exclusive: bool) -> EngineResult<()>;
}

/// Engine version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Engine pause/resume and introspection capability.
pub trait EngineControl: Send + Sync {
    /// Resume recognition after a pause notification. The cookie must be the
    /// one delivered with the pause; the engine stays suspended until it
    /// sees it back.
    fn resume(&self, cookie: u64) -> EngineResult<()>;

    /// Engine version, for logging and compatibility checks.
    fn version(&self) -> EngineResult<EngineVersion>;
}

/// Speaker-profile queries.
pub trait SpeakerInfo: Send + Sync {
    /// Sized query for the current profile name as UTF-16 units. Fails with
    /// [`EngineCallError::BufferTooSmall`] when `buf` cannot hold the name,
    /// or with [`codes::NO_PROFILE_SELECTED`] when no profile is active.
    fn profile_name(&self, buf: &mut [u16]) -> EngineResult<usize>;
}

/// Fetch the current speaker profile name, if one is selected.
pub fn current_profile_name(speaker: &dyn SpeakerInfo) -> EngineResult<Option<String>> {
    let units = match fetch_sized(|buf| speaker.profile_name(buf)) {
        Ok(units) => units,
        Err(EngineCallError::Failed { code, .. }) if code == codes::NO_PROFILE_SELECTED => {
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if units.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf16_lossy(&units)))
}

/// Host-side probe for window liveness.
///
/// Rule activation targeting a window that no longer exists is silently
/// dropped; this trait is how the grammar service asks.
pub trait WindowSystem: Send + Sync {
    fn is_window_valid(&self, window: WindowHandle) -> bool;
}
