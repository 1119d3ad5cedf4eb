//! Capability lookup against an engine provider.
//!
//! A provider hands out typed capability handles on request; the connection
//! object queries the capabilities the grammar layer needs once, up front,
//! and exposes them as independent trait objects. Lookup failures are
//! classified, never silent.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::recognizer::{EngineControl, Recognizer, SpeakerInfo};

/// The capabilities a provider can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityId {
    Recognizer,
    EngineControl,
    SpeakerInfo,
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityId::Recognizer => write!(f, "recognizer"),
            CapabilityId::EngineControl => write!(f, "engine-control"),
            CapabilityId::SpeakerInfo => write!(f, "speaker-info"),
        }
    }
}

/// A typed handle returned from a capability query.
#[derive(Clone)]
pub enum CapabilityHandle {
    Recognizer(Arc<dyn Recognizer>),
    EngineControl(Arc<dyn EngineControl>),
    SpeakerInfo(Arc<dyn SpeakerInfo>),
}

/// Classified capability-lookup failures.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Capability not supported by this engine: {0}")]
    Unsupported(CapabilityId),

    #[error("Provider returned a mismatched handle for capability: {0}")]
    WrongType(CapabilityId),
}

/// Source of capability handles; one provider per engine connection.
pub trait CapabilityProvider: Send + Sync {
    fn query(&self, id: CapabilityId) -> Result<CapabilityHandle, CapabilityError>;
}

/// Query the grammar-loading capability.
pub fn query_recognizer(
    provider: &dyn CapabilityProvider,
) -> Result<Arc<dyn Recognizer>, CapabilityError> {
    match provider.query(CapabilityId::Recognizer)? {
        CapabilityHandle::Recognizer(handle) => Ok(handle),
        _ => Err(CapabilityError::WrongType(CapabilityId::Recognizer)),
    }
}

/// Query the pause/resume and introspection capability.
pub fn query_engine_control(
    provider: &dyn CapabilityProvider,
) -> Result<Arc<dyn EngineControl>, CapabilityError> {
    match provider.query(CapabilityId::EngineControl)? {
        CapabilityHandle::EngineControl(handle) => Ok(handle),
        _ => Err(CapabilityError::WrongType(CapabilityId::EngineControl)),
    }
}

/// Query the speaker-profile capability.
pub fn query_speaker_info(
    provider: &dyn CapabilityProvider,
) -> Result<Arc<dyn SpeakerInfo>, CapabilityError> {
    match provider.query(CapabilityId::SpeakerInfo)? {
        CapabilityHandle::SpeakerInfo(handle) => Ok(handle),
        _ => Err(CapabilityError::WrongType(CapabilityId::SpeakerInfo)),
    }
}

/// The independent engine capabilities behind one connection.
#[derive(Clone)]
pub struct EngineConnection {
    pub recognizer: Arc<dyn Recognizer>,
    pub control: Arc<dyn EngineControl>,
    pub speaker: Arc<dyn SpeakerInfo>,
}

impl EngineConnection {
    /// Resolve every capability the grammar layer needs from `provider`.
    pub fn connect(provider: &dyn CapabilityProvider) -> Result<Self, CapabilityError> {
        let recognizer = query_recognizer(provider)?;
        let control = query_engine_control(provider)?;
        let speaker = query_speaker_info(provider)?;

        if let Ok(version) = control.version() {
            info!(%version, "Engine connection established");
        }

        Ok(Self {
            recognizer,
            control,
            speaker,
        })
    }
}
