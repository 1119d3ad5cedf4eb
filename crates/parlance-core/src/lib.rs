pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::ParlanceConfig;
pub use error::{CoreError, Result};
pub use events::GrammarEvent;
pub use types::*;
