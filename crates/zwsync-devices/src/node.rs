//! Node - raw value store and property synchronization for one endpoint
//!
//! A node keeps the last reported state of every raw value of one hardware
//! endpoint and mirrors the values that properties are bound to into the
//! properties' caches. Value handlers take `&mut self`; the driver delivers
//! notifications for a node one at a time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zwsync_core::{Error, EventBus, NodeEvent, PropertyValue, Result, SyncConfig};

use crate::mdl::{
    DefaultName, MetadataUpdate, NodeMetadata, NodeStatus, RawValue, ValueKey,
};
use crate::property::{DeferredWrite, Property, PropertySnapshot};
use crate::transport::Transport;

/// One controllable endpoint.
pub struct Node {
    id: String,
    controller_id: u32,
    endpoint_id: u8,
    name: Option<String>,
    default_name: DefaultName,
    ready: bool,
    status: NodeStatus,
    metadata: NodeMetadata,
    command_classes: Vec<u8>,
    raw_values: BTreeMap<ValueKey, RawValue>,
    properties: Vec<Property>,
    bus: EventBus,
    config: SyncConfig,
}

impl Node {
    /// Create a node for `endpoint_id` on the controller `controller_id`.
    ///
    /// The composite id is `{controller_id:x}-{endpoint_id}`.
    pub fn new(controller_id: u32, endpoint_id: u8, bus: EventBus, config: SyncConfig) -> Result<Self> {
        if endpoint_id == 0 {
            return Err(zwsync_core::validation_err!(
                "endpoint id must be in 1..=255"
            ));
        }
        Ok(Self {
            id: format!("{:x}-{}", controller_id, endpoint_id),
            controller_id,
            endpoint_id,
            name: None,
            default_name: DefaultName::Unclaimed,
            ready: false,
            status: NodeStatus::Constructed,
            metadata: NodeMetadata::default(),
            command_classes: Vec::new(),
            raw_values: BTreeMap::new(),
            properties: Vec::new(),
            bus,
            config,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn controller_id(&self) -> u32 {
        self.controller_id
    }

    pub fn endpoint_id(&self) -> u8 {
        self.endpoint_id
    }

    /// Display name, configured or derived from the first user value.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// Record a lifecycle marker reported by the driver (awake, dead, ...).
    pub fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn update_metadata(&mut self, update: MetadataUpdate) {
        self.metadata.apply(update);
    }

    /// Every command class seen on this node, in first-seen order.
    pub fn command_classes(&self) -> &[u8] {
        &self.command_classes
    }

    pub fn raw_value(&self, value_id: &ValueKey) -> Option<&RawValue> {
        self.raw_values.get(value_id)
    }

    pub fn raw_values(&self) -> impl Iterator<Item = &RawValue> {
        self.raw_values.values()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Register a property.
    ///
    /// Names are unique, and no two properties may be bound to the same value.
    pub fn add_property(&mut self, property: Property) -> Result<()> {
        if self.property(property.name()).is_some() {
            return Err(Error::already_exists(format!(
                "node{} property {}",
                self.id,
                property.name()
            )));
        }
        if let Some(value_id) = property.value_id() {
            self.ensure_unclaimed(&value_id)?;
        }
        tracing::debug!("node{} addProperty: {}", self.id, property.name());
        self.properties.push(property);
        Ok(())
    }

    /// Bind an existing (possibly unbound) property to a raw value.
    pub fn bind_property(&mut self, name: &str, value_id: ValueKey) -> Result<()> {
        if let Some(owner) = self.find_property_from_value_id(&value_id) {
            if owner.name() != name {
                return Err(Error::already_exists(format!(
                    "node{} value {} already bound to {}",
                    self.id,
                    value_id,
                    owner.name()
                )));
            }
        }
        let property = self.property_mut(name)?;
        property.bind(value_id);
        Ok(())
    }

    fn ensure_unclaimed(&self, value_id: &ValueKey) -> Result<()> {
        match self.find_property_from_value_id(value_id) {
            Some(owner) => Err(Error::already_exists(format!(
                "node{} value {} already bound to {}",
                self.id,
                value_id,
                owner.name()
            ))),
            None => Ok(()),
        }
    }

    fn property_mut(&mut self, name: &str) -> Result<&mut Property> {
        let id = &self.id;
        self.properties
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| Error::not_found(format!("node{} property {}", id, name)))
    }

    /// Store a raw value reported for `command_class`.
    ///
    /// The key must belong to this endpoint and class, or a later
    /// `value_removed` could never find it.
    fn record_value(&mut self, command_class: u8, raw: &RawValue) -> Result<()> {
        let key = raw.value_id;
        if key.node_id != self.endpoint_id || key.command_class != command_class {
            return Err(zwsync_core::validation_err!(
                "node{} value {} reported for class {}",
                self.id,
                key,
                command_class
            ));
        }
        if !self.command_classes.contains(&command_class) {
            self.command_classes.push(command_class);
        }
        self.raw_values.insert(key, raw.clone());
        Ok(())
    }

    /// Handle a value reported for the first time during the interview.
    ///
    /// The bound property's cache is updated but no change notification is
    /// sent. The first user value also gives an unnamed node its name.
    pub fn value_added(&mut self, command_class: u8, raw: RawValue) -> Result<()> {
        self.record_value(command_class, &raw)?;
        self.status = NodeStatus::ValueAdded;

        let units = raw.units_suffix();
        let mut matched = false;
        for property in self
            .properties
            .iter_mut()
            .filter(|p| p.value_id() == Some(raw.value_id))
        {
            matched = true;
            let (value, shown) = property.parser().parse(&raw)?;
            property.set_cached_value(value);
            tracing::info!(
                "node{} valueAdded: {}:{} property: {} = {}{}",
                self.id,
                raw.value_id,
                raw.label,
                property.name(),
                shown,
                units
            );
        }

        if !matched && (raw.is_user() || self.config.debug) {
            tracing::info!(
                "node{} valueAdded: {}:{} = {}{}",
                self.id,
                raw.value_id,
                raw.label,
                raw.value,
                units
            );
        }

        if raw.is_user() {
            self.claim_default_name(&raw.label);
        }
        Ok(())
    }

    fn claim_default_name(&mut self, label: &str) {
        let Some(name) = self.default_name.claim(format!("{}-{}", self.id, label)) else {
            return;
        };
        let name = name.to_string();
        if self.name.is_none() {
            self.name = Some(name.clone());
        }
        tracing::debug!("node{} defaultName: {}", self.id, name);
        self.bus.publish_with_source(
            NodeEvent::NodeNamed {
                node_id: self.id.clone(),
                name,
            },
            "node",
        );
    }

    /// Handle a value update from the hardware.
    ///
    /// Unlike [`Node::value_added`], a matched property is notified, which
    /// also completes any write waiting on it. Unmatched values are always
    /// logged.
    pub fn value_changed(&mut self, command_class: u8, raw: RawValue) -> Result<()> {
        self.record_value(command_class, &raw)?;
        self.status = NodeStatus::ValueChanged;

        let units = raw.units_suffix();
        let mut matched = false;
        for property in self
            .properties
            .iter_mut()
            .filter(|p| p.value_id() == Some(raw.value_id))
        {
            matched = true;
            let (value, shown) = property.parser().parse(&raw)?;
            property.set_cached_value(value);
            tracing::info!(
                "node{} valueChanged: {}:{} property: {} = {}{}",
                self.id,
                raw.value_id,
                raw.label,
                property.name(),
                shown,
                units
            );
            notify(&self.bus, &self.id, property);
        }

        if !matched {
            tracing::info!(
                "node{} valueChanged: {}:{} = {}{}",
                self.id,
                raw.value_id,
                raw.label,
                raw.value,
                units
            );
        }
        Ok(())
    }

    /// Handle removal of a value. Properties bound to it become unbound.
    ///
    /// Command classes are not pruned, even when the last value of a class
    /// goes away.
    pub fn value_removed(&mut self, command_class: u8, instance: u8, index: u16) {
        self.status = NodeStatus::ValueRemoved;
        let value_id = ValueKey::new(self.endpoint_id, command_class, instance, index);

        let Some(raw) = self.raw_values.remove(&value_id) else {
            tracing::info!("node{} valueRemoved: unknown valueId: {}", self.id, value_id);
            return;
        };

        let mut matched = false;
        for property in self
            .properties
            .iter_mut()
            .filter(|p| p.value_id() == Some(value_id))
        {
            matched = true;
            property.unbind();
            tracing::info!(
                "node{} valueRemoved: {}:{} property: {}",
                self.id,
                value_id,
                raw.label,
                property.name()
            );
        }

        if !matched {
            tracing::info!("node{} valueRemoved: {}:{}", self.id, value_id, raw.label);
        }
    }

    /// First value whose key matches the class and optional instance/index.
    ///
    /// Iteration follows key order; with several matches only the first is
    /// returned.
    pub fn find_value_id(
        &self,
        command_class: u8,
        instance: Option<u8>,
        index: Option<u16>,
    ) -> Option<ValueKey> {
        self.raw_values
            .keys()
            .find(|key| key.matches(command_class, instance, index))
            .copied()
    }

    /// First property bound to `value_id`, in registration order.
    pub fn find_property_from_value_id(&self, value_id: &ValueKey) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.value_id().as_ref() == Some(value_id))
    }

    /// Complete a pending write on the property with its cached value, then
    /// publish the change.
    pub fn notify_property_changed(&mut self, name: &str) -> Result<()> {
        let id = self.id.clone();
        let bus = self.bus.clone();
        let property = self.property_mut(name)?;
        notify(&bus, &id, property);
        Ok(())
    }

    /// Write a new value to the hardware.
    ///
    /// The returned handle resolves once a value-changed notification for the
    /// property's value arrives.
    pub fn set_property_value(
        &mut self,
        name: &str,
        value: PropertyValue,
        transport: &dyn Transport,
    ) -> Result<DeferredWrite> {
        let timeout = self.config.deferred_write_timeout;
        let id = self.id.clone();
        let property = self.property_mut(name)?;
        let value_id = property.value_id().ok_or_else(|| {
            zwsync_core::validation_err!("node{} property {} is not bound to a value", id, name)
        })?;
        let raw = property.parser().to_raw(&value)?;

        tracing::debug!("node{} setValue: {} = {} ({})", id, value_id, value, name);
        transport.set_value(&value_id, raw)?;
        Ok(property.begin_write(value, timeout))
    }

    /// Full read-only view of the node.
    pub fn as_dict(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            default_name: self.default_name.as_deref().map(str::to_string),
            ready: self.ready,
            properties: self.properties.iter().map(PropertySnapshot::from).collect(),
            status: self.status,
            metadata: self.metadata.clone(),
            command_classes: self.command_classes.clone(),
            raw_values: self.raw_values.values().cloned().collect(),
        }
    }
}

fn notify(bus: &EventBus, node_id: &str, property: &mut Property) {
    if property.resolve_deferred() {
        tracing::debug!("node{} deferred write on {} confirmed", node_id, property.name());
    }
    bus.publish_with_source(
        NodeEvent::PropertyChanged {
            node_id: node_id.to_string(),
            property: property.name().to_string(),
            value: property.value().clone(),
        },
        "node",
    );
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("command_classes", &self.command_classes)
            .field("raw_values", &self.raw_values.len())
            .field("properties", &self.properties.len())
            .finish()
    }
}

/// Serializable snapshot of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub name: Option<String>,
    pub default_name: Option<String>,
    pub ready: bool,
    pub properties: Vec<PropertySnapshot>,
    pub status: NodeStatus,
    pub metadata: NodeMetadata,
    pub command_classes: Vec<u8>,
    pub raw_values: Vec<RawValue>,
}
