//! Core types for zwsync.
//!
//! This crate holds what every other crate in the workspace shares: the
//! error type, configuration, node events and the event bus that carries
//! confirmed property changes to consumers.

pub mod config;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod logging;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use event::{EventMetadata, NodeEvent, PropertyValue};
pub use eventbus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventBusReceiver, FilteredReceiver};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::{SyncConfig, defaults, env_vars};
    pub use crate::error::{Error, Result};
    pub use crate::event::{EventMetadata, NodeEvent, PropertyValue};
    pub use crate::eventbus::EventBus;
}
