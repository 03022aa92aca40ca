//! Logical properties and deferred writes.
//!
//! A property is the named, typed view of one raw value. Writes to a
//! property are only complete once the hardware reports the new value back,
//! so a write hands out a [`DeferredWrite`] that resolves on confirmation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use zwsync_core::{Error, PropertyValue, Result};

use crate::mdl::ValueKey;
use crate::parser::ValueParser;

/// A named property, optionally bound to a raw value.
#[derive(Debug)]
pub struct Property {
    name: String,
    value_id: Option<ValueKey>,
    value: PropertyValue,
    parser: ValueParser,
    deferred_set: Option<PendingWrite>,
}

impl Property {
    pub fn new(name: impl Into<String>, parser: ValueParser) -> Self {
        Self {
            name: name.into(),
            value_id: None,
            value: PropertyValue::Null,
            parser,
            deferred_set: None,
        }
    }

    /// Bind the property to a raw value at construction time.
    pub fn bound_to(mut self, value_id: ValueKey) -> Self {
        self.value_id = Some(value_id);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_id(&self) -> Option<ValueKey> {
        self.value_id
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn parser(&self) -> ValueParser {
        self.parser
    }

    /// Whether a write is awaiting confirmation and someone still waits on it.
    pub fn has_pending_write(&self) -> bool {
        self.live_write().is_some()
    }

    /// The value requested by the write that is still awaiting confirmation.
    pub fn pending_value(&self) -> Option<&PropertyValue> {
        self.live_write().map(|p| &p.requested)
    }

    // A handle whose receiver timed out or was dropped no longer counts.
    fn live_write(&self) -> Option<&PendingWrite> {
        self.deferred_set.as_ref().filter(|p| !p.tx.is_closed())
    }

    pub(crate) fn set_cached_value(&mut self, value: PropertyValue) {
        self.value = value;
    }

    pub(crate) fn bind(&mut self, value_id: ValueKey) {
        self.value_id = Some(value_id);
    }

    /// Drop the binding and cached value. A pending write is cancelled.
    pub(crate) fn unbind(&mut self) {
        self.value_id = None;
        self.value = PropertyValue::Null;
        self.deferred_set = None;
    }

    /// Register a pending write, replacing (and cancelling) any previous one.
    pub(crate) fn begin_write(&mut self, requested: PropertyValue, timeout: Duration) -> DeferredWrite {
        let (tx, rx) = oneshot::channel();
        let previous = self.deferred_set.replace(PendingWrite { tx, requested });
        if previous.is_some_and(|p| !p.tx.is_closed()) {
            tracing::debug!("property {}: previous pending write superseded", self.name);
        }
        DeferredWrite {
            property: self.name.clone(),
            rx,
            timeout,
        }
    }

    /// Resolve a pending write with the current cached value.
    ///
    /// Returns `true` if a live write was pending. The handle is cleared either
    /// way, so a later change never resolves it twice.
    pub(crate) fn resolve_deferred(&mut self) -> bool {
        match self.deferred_set.take() {
            Some(pending) if !pending.tx.is_closed() => {
                if pending.tx.send(self.value.clone()).is_err() {
                    tracing::debug!(
                        "property {}: write confirmed after the caller stopped waiting",
                        self.name
                    );
                }
                true
            }
            Some(_) => {
                tracing::debug!("property {}: dropping expired pending write", self.name);
                false
            }
            None => false,
        }
    }
}

/// Sending half of a write awaiting hardware confirmation.
#[derive(Debug)]
struct PendingWrite {
    tx: oneshot::Sender<PropertyValue>,
    requested: PropertyValue,
}

/// Handle returned to the caller of a property write.
#[derive(Debug)]
pub struct DeferredWrite {
    property: String,
    rx: oneshot::Receiver<PropertyValue>,
    timeout: Duration,
}

impl DeferredWrite {
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Wait for the hardware to confirm the write.
    ///
    /// Resolves with the confirmed value, `Error::Timeout` if nothing arrives
    /// within the configured window, or `Error::Cancelled` if the pending
    /// write was superseded or its property unbound.
    pub async fn wait(self) -> Result<PropertyValue> {
        match tokio::time::timeout(self.timeout, self.rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(Error::cancelled(format!(
                "write to {} dropped before confirmation",
                self.property
            ))),
            Err(_) => Err(Error::timeout(format!(
                "write to {} not confirmed within {}ms",
                self.property,
                self.timeout.as_millis()
            ))),
        }
    }
}

/// Serializable view of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub name: String,
    pub value_id: Option<ValueKey>,
    pub value: PropertyValue,
    pub pending_write: bool,
}

impl From<&Property> for PropertySnapshot {
    fn from(property: &Property) -> Self {
        Self {
            name: property.name.clone(),
            value_id: property.value_id,
            value: property.value.clone(),
            pending_write: property.has_pending_write(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_deferred_once() {
        let mut property = Property::new("on", ValueParser::OnOff).bound_to(ValueKey::new(2, 37, 1, 0));
        let write = property.begin_write(PropertyValue::Boolean(true), Duration::from_secs(1));
        assert!(property.has_pending_write());
        assert_eq!(property.pending_value(), Some(&PropertyValue::Boolean(true)));

        property.set_cached_value(PropertyValue::Boolean(true));
        assert!(property.resolve_deferred());
        assert!(!property.resolve_deferred());
        assert_eq!(write.wait().await.unwrap(), PropertyValue::Boolean(true));
    }

    #[tokio::test]
    async fn test_superseded_write_is_cancelled() {
        let mut property = Property::new("level", ValueParser::Level);
        let first = property.begin_write(PropertyValue::Integer(10), Duration::from_secs(1));
        let _second = property.begin_write(PropertyValue::Integer(20), Duration::from_secs(1));

        let err = first.wait().await.unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
        assert_eq!(property.pending_value(), Some(&PropertyValue::Integer(20)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_write_times_out() {
        let mut property = Property::new("level", ValueParser::Level);
        let write = property.begin_write(PropertyValue::Integer(10), Duration::from_millis(500));

        let err = write.wait().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(!property.has_pending_write());
        assert_eq!(property.pending_value(), None);
        assert!(!PropertySnapshot::from(&property).pending_write);
        assert!(!property.resolve_deferred());
    }

    #[test]
    fn test_dropped_handle_is_not_pending() {
        let mut property = Property::new("on", ValueParser::OnOff);
        drop(property.begin_write(PropertyValue::Boolean(true), Duration::from_secs(1)));
        assert!(!property.has_pending_write());
    }

    #[test]
    fn test_unbind_clears_value() {
        let mut property = Property::new("temp", ValueParser::Temperature).bound_to(ValueKey::new(3, 49, 1, 1));
        property.set_cached_value(PropertyValue::Float(20.0));
        property.unbind();
        assert_eq!(property.value_id(), None);
        assert!(property.value().is_null());

        let snapshot = PropertySnapshot::from(&property);
        assert_eq!(snapshot.name, "temp");
        assert!(!snapshot.pending_write);
    }
}
