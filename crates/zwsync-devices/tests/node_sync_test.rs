//! Tests for value ingestion and property lookup on a single node.

mod common;

use common::user_value;
use zwsync_devices::{
    EventBus, Node, NodeEvent, NodeStatus, Property, PropertyValue, RawData, RawValue,
    SyncConfig, ValueGenre, ValueKey, ValueParser,
};

const CONTROLLER: u32 = 0xe3a1_0042;

fn node_with_bus() -> (Node, EventBus) {
    let bus = EventBus::new();
    let node = Node::new(CONTROLLER, 4, bus.clone(), SyncConfig::default()).unwrap();
    (node, bus)
}

#[test]
fn test_orphan_values_leave_properties_untouched() {
    let (mut node, _bus) = node_with_bus();
    let bound = ValueKey::new(4, 37, 1, 0);
    node.add_property(Property::new("on", ValueParser::OnOff).bound_to(bound))
        .unwrap();

    let orphan = ValueKey::new(4, 50, 1, 8);
    node.value_added(50, user_value(orphan, "Power", RawData::Decimal(3.2)))
        .unwrap();
    node.value_changed(50, user_value(orphan, "Power", RawData::Decimal(4.0)))
        .unwrap();
    node.value_removed(50, 1, 8);

    assert_eq!(node.properties().len(), 1);
    let property = node.property("on").unwrap();
    assert_eq!(property.value_id(), Some(bound));
    assert!(property.value().is_null());
    assert_eq!(node.command_classes(), &[50]);
}

#[test]
fn test_value_changed_notifies_bound_property() {
    let (mut node, bus) = node_with_bus();
    let mut rx = bus.subscribe_filtered(NodeEvent::is_property_event);
    let key = ValueKey::new(4, 38, 1, 0);
    node.add_property(Property::new("level", ValueParser::Level).bound_to(key))
        .unwrap();

    node.value_added(38, user_value(key, "Level", RawData::Byte(0)))
        .unwrap();
    assert!(rx.try_recv().is_none());

    node.value_changed(38, user_value(key, "Level", RawData::Byte(99)))
        .unwrap();
    assert_eq!(node.status(), NodeStatus::ValueChanged);
    assert_eq!(node.property("level").unwrap().value(), &PropertyValue::Integer(100));

    let (event, meta) = rx.try_recv().expect("property change published");
    assert_eq!(meta.source, "node");
    assert_eq!(
        event,
        NodeEvent::PropertyChanged {
            node_id: "e3a10042-4".to_string(),
            property: "level".to_string(),
            value: PropertyValue::Integer(100),
        }
    );
}

#[test]
fn test_value_changed_does_not_claim_name() {
    let (mut node, _bus) = node_with_bus();
    let key = ValueKey::new(4, 37, 1, 0);
    node.value_changed(37, user_value(key, "Switch", RawData::Bool(true)))
        .unwrap();
    assert_eq!(node.default_name(), None);

    node.value_added(37, user_value(key, "Switch", RawData::Bool(true)))
        .unwrap();
    assert_eq!(node.default_name(), Some("e3a10042-4-Switch"));
}

#[test]
fn test_node_named_event_published_once() {
    let (mut node, bus) = node_with_bus();
    let mut rx = bus.subscribe();

    for (index, label) in [(0, "Switch"), (1, "Power")] {
        node.value_added(
            37,
            user_value(ValueKey::new(4, 37, 1, index), label, RawData::Bool(false)),
        )
        .unwrap();
    }

    let (event, _) = rx.try_recv().unwrap();
    assert_eq!(
        event,
        NodeEvent::NodeNamed {
            node_id: "e3a10042-4".to_string(),
            name: "e3a10042-4-Switch".to_string(),
        }
    );
    assert!(rx.try_recv().is_none());
}

#[test]
fn test_find_property_from_value_id() {
    let (mut node, _bus) = node_with_bus();
    let temp = ValueKey::new(4, 49, 1, 1);
    let humidity = ValueKey::new(4, 49, 1, 5);
    node.add_property(Property::new("temperature", ValueParser::Temperature).bound_to(temp))
        .unwrap();
    node.add_property(Property::new("humidity", ValueParser::Identity).bound_to(humidity))
        .unwrap();

    assert_eq!(
        node.find_property_from_value_id(&humidity).map(Property::name),
        Some("humidity")
    );
    assert!(node
        .find_property_from_value_id(&ValueKey::new(4, 49, 1, 2))
        .is_none());
}

#[test]
fn test_non_user_values_do_not_name_node() {
    let (mut node, _bus) = node_with_bus();
    let debug = SyncConfig::default().with_debug(true);
    let mut debug_node = Node::new(CONTROLLER, 5, EventBus::new(), debug).unwrap();

    for target in [&mut node, &mut debug_node] {
        let key = ValueKey::new(target.endpoint_id(), 134, 1, 0);
        let raw = RawValue::new(key, "Library Version", RawData::String("3".to_string()))
            .with_genre(ValueGenre::System)
            .read_only();
        target.value_added(134, raw).unwrap();
        assert_eq!(target.default_name(), None);
        assert_eq!(target.name(), None);
    }
}

#[test]
fn test_rebinding_after_remove() {
    let (mut node, _bus) = node_with_bus();
    let key = ValueKey::new(4, 37, 1, 0);
    node.add_property(Property::new("on", ValueParser::OnOff).bound_to(key))
        .unwrap();
    node.value_added(37, user_value(key, "Switch", RawData::Bool(true)))
        .unwrap();

    node.value_removed(37, 1, 0);
    assert!(node.find_property_from_value_id(&key).is_none());

    node.value_added(37, user_value(key, "Switch", RawData::Bool(false)))
        .unwrap();
    assert!(node.property("on").unwrap().value().is_null());

    node.bind_property("on", key).unwrap();
    node.value_changed(37, user_value(key, "Switch", RawData::Bool(false)))
        .unwrap();
    assert_eq!(node.property("on").unwrap().value(), &PropertyValue::Boolean(false));
}
