//! Node value synchronization.
//!
//! This crate keeps a cached view of each hardware node's raw values and
//! maps them onto named, typed properties.
//!
//! ## Architecture
//!
//! - **Node**: raw value store, command classes, metadata and the value
//!   added/changed/removed handlers for one endpoint
//! - **Property**: named view of one raw value, with deferred writes that
//!   complete when the hardware confirms the new value
//! - **NodeRegistry**: all nodes of a controller; routes driver notifications
//!   by endpoint id and renders the node table
//! - **Transport**: the calls made back into the hardware driver
//!
//! Confirmed property changes are published on the `zwsync_core::EventBus`.

pub mod mdl;
pub mod node;
pub mod parser;
pub mod property;
pub mod registry;
pub mod summary;
pub mod transport;

pub use mdl::{
    BASIC_TYPES, DefaultName, MetadataUpdate, NodeMetadata, NodeStatus, RawData, RawValue,
    ValueGenre, ValueKey, ValueKeyParseError, basic_type_name,
};
pub use node::{Node, NodeSnapshot};
pub use parser::ValueParser;
pub use property::{DeferredWrite, Property, PropertySnapshot};
pub use registry::NodeRegistry;
pub use transport::Transport;

pub use zwsync_core::{Error, EventBus, NodeEvent, PropertyValue, Result, SyncConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
