//! Node Registry - all nodes attached to one controller
//!
//! The driver reports values by endpoint id; the registry routes each
//! notification to the addressed node. Nodes live in separate map entries,
//! so a handler running on one node never blocks or touches another.

use dashmap::DashMap;
use zwsync_core::{Error, EventBus, PropertyValue, Result, SyncConfig};

use crate::mdl::{MetadataUpdate, NodeStatus, RawValue, ValueKey};
use crate::node::{Node, NodeSnapshot};
use crate::property::{DeferredWrite, Property};
use crate::transport::Transport;

/// Registry of the nodes on one controller.
pub struct NodeRegistry {
    controller_id: u32,
    nodes: DashMap<u8, Node>,
    bus: EventBus,
    config: SyncConfig,
}

impl NodeRegistry {
    pub fn new(controller_id: u32, bus: EventBus, config: SyncConfig) -> Self {
        Self {
            controller_id,
            nodes: DashMap::new(),
            bus,
            config,
        }
    }

    pub fn controller_id(&self) -> u32 {
        self.controller_id
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Attach a node for `endpoint_id`.
    pub fn add_node(&self, endpoint_id: u8) -> Result<()> {
        if self.nodes.contains_key(&endpoint_id) {
            return Err(Error::already_exists(format!("node {}", endpoint_id)));
        }
        let node = Node::new(
            self.controller_id,
            endpoint_id,
            self.bus.clone(),
            self.config.clone(),
        )?;
        tracing::info!("node{} added", node.id());
        self.nodes.insert(endpoint_id, node);
        Ok(())
    }

    /// Detach a node. Pending writes on its properties are cancelled.
    pub fn remove_node(&self, endpoint_id: u8) -> Option<Node> {
        let (_, node) = self.nodes.remove(&endpoint_id)?;
        tracing::info!("node{} removed", node.id());
        Some(node)
    }

    pub fn contains(&self, endpoint_id: u8) -> bool {
        self.nodes.contains_key(&endpoint_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attached endpoint ids in ascending order.
    pub fn node_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.nodes.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Run `f` with shared access to a node.
    pub fn with_node<R>(&self, endpoint_id: u8, f: impl FnOnce(&Node) -> R) -> Result<R> {
        let node = self
            .nodes
            .get(&endpoint_id)
            .ok_or_else(|| unknown_node(endpoint_id))?;
        Ok(f(&node))
    }

    /// Run `f` with exclusive access to a node.
    pub fn with_node_mut<R>(&self, endpoint_id: u8, f: impl FnOnce(&mut Node) -> R) -> Result<R> {
        let mut node = self
            .nodes
            .get_mut(&endpoint_id)
            .ok_or_else(|| unknown_node(endpoint_id))?;
        Ok(f(&mut node))
    }

    pub fn add_property(&self, endpoint_id: u8, property: Property) -> Result<()> {
        self.with_node_mut(endpoint_id, |node| node.add_property(property))?
    }

    pub fn update_metadata(&self, endpoint_id: u8, update: MetadataUpdate) -> Result<()> {
        self.with_node_mut(endpoint_id, |node| node.update_metadata(update))
    }

    pub fn set_status(&self, endpoint_id: u8, status: NodeStatus) -> Result<()> {
        self.with_node_mut(endpoint_id, |node| node.set_status(status))
    }

    pub fn set_ready(&self, endpoint_id: u8, ready: bool) -> Result<()> {
        self.with_node_mut(endpoint_id, |node| node.set_ready(ready))
    }

    pub fn value_added(&self, endpoint_id: u8, command_class: u8, raw: RawValue) -> Result<()> {
        self.with_node_mut(endpoint_id, |node| node.value_added(command_class, raw))?
    }

    pub fn value_changed(&self, endpoint_id: u8, command_class: u8, raw: RawValue) -> Result<()> {
        self.with_node_mut(endpoint_id, |node| node.value_changed(command_class, raw))?
    }

    pub fn value_removed(
        &self,
        endpoint_id: u8,
        command_class: u8,
        instance: u8,
        index: u16,
    ) -> Result<()> {
        self.with_node_mut(endpoint_id, |node| {
            node.value_removed(command_class, instance, index)
        })
    }

    pub fn find_value_id(
        &self,
        endpoint_id: u8,
        command_class: u8,
        instance: Option<u8>,
        index: Option<u16>,
    ) -> Result<Option<ValueKey>> {
        self.with_node(endpoint_id, |node| {
            node.find_value_id(command_class, instance, index)
        })
    }

    pub fn set_property_value(
        &self,
        endpoint_id: u8,
        property: &str,
        value: PropertyValue,
        transport: &dyn Transport,
    ) -> Result<DeferredWrite> {
        self.with_node_mut(endpoint_id, |node| {
            node.set_property_value(property, value, transport)
        })?
    }

    pub fn snapshot(&self, endpoint_id: u8) -> Result<NodeSnapshot> {
        self.with_node(endpoint_id, Node::as_dict)
    }

    /// Header lines followed by one summary row per node, in endpoint order.
    pub fn dump(&self, transport: &dyn Transport) -> Vec<String> {
        let mut lines = vec![Node::one_line_header(0), Node::one_line_header(1)];
        for endpoint_id in self.node_ids() {
            if let Some(node) = self.nodes.get(&endpoint_id) {
                lines.push(node.one_line_summary(transport));
            }
        }
        lines
    }
}

fn unknown_node(endpoint_id: u8) -> Error {
    Error::not_found(format!("node {}", endpoint_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdl::{RawData, ValueGenre};

    fn registry() -> NodeRegistry {
        NodeRegistry::new(0xd1, EventBus::new(), SyncConfig::default())
    }

    #[test]
    fn test_add_and_remove_nodes() {
        let registry = registry();
        registry.add_node(3).unwrap();
        registry.add_node(1).unwrap();
        assert!(matches!(registry.add_node(3), Err(Error::AlreadyExists(_))));
        assert!(registry.add_node(0).is_err());

        assert_eq!(registry.node_ids(), vec![1, 3]);
        let removed = registry.remove_node(3).unwrap();
        assert_eq!(removed.id(), "d1-3");
        assert!(registry.remove_node(3).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_routing_by_endpoint() {
        let registry = registry();
        registry.add_node(1).unwrap();
        registry.add_node(2).unwrap();

        let raw = RawValue::new(ValueKey::new(2, 49, 1, 1), "Temperature", RawData::Decimal(20.5))
            .with_genre(ValueGenre::User);
        registry.value_added(2, 49, raw).unwrap();

        let node1 = registry.snapshot(1).unwrap();
        let node2 = registry.snapshot(2).unwrap();
        assert!(node1.raw_values.is_empty());
        assert_eq!(node2.raw_values.len(), 1);
        assert_eq!(node2.default_name.as_deref(), Some("d1-2-Temperature"));
    }

    #[test]
    fn test_unknown_endpoint() {
        let registry = registry();
        let err = registry.value_removed(9, 37, 1, 0).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(registry.find_value_id(9, 37, None, None).is_err());
    }
}
