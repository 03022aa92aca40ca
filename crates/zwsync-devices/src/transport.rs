//! Interface to the hardware driver.
//!
//! The driver pushes value notifications into [`crate::NodeRegistry`]; this
//! trait covers the calls flowing the other way.

use zwsync_core::Result;

use crate::mdl::{RawData, ValueKey};

/// Queries and commands the synchronization layer issues to the driver.
pub trait Transport: Send + Sync {
    /// Basic device class code of an endpoint (1 = Controller ... 4 = RoutingSlave).
    fn basic_type(&self, endpoint_id: u8) -> u8;

    /// Issue a write. Completion is signalled later by a value-changed notification.
    fn set_value(&self, value_id: &ValueKey, value: RawData) -> Result<()>;
}
