//! Parlance engine crate - the boundary to the external speech engine.
//!
//! Models the engine as a set of independent capability traits obtained from
//! a single connection object, plus the support types the grammar layer
//! needs to talk to it: diagnostic codes, the size-then-fill buffer helper,
//! notification sink contracts, and a scriptable mock engine for tests and
//! demos. Nothing in this crate holds grammar state; that lives in
//! `parlance-grammar`.

pub mod buffer;
pub mod capability;
pub mod error;
pub mod mock;
pub mod recognizer;
pub mod result;
pub mod sink;

pub use buffer::fetch_sized;
pub use capability::{CapabilityError, CapabilityHandle, CapabilityId, CapabilityProvider, EngineConnection};
pub use error::{codes, EngineCallError, EngineCode, EngineResult};
pub use recognizer::{
    current_profile_name, EngineControl, EngineVersion, GrammarChannel, GrammarFormat, Recognizer,
    SpeakerInfo, WindowSystem,
};
pub use result::{NodeId, ResultGraph, WordNodeMeta};
pub use sink::{EngineSink, EngineSinkFlags, GrammarSink, PhraseFlags, SinkFlags};
