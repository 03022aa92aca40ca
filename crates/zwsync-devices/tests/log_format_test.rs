//! Tests for the value handler log lines consumed by log tooling.

mod common;

use common::{capture_logs, user_value};
use zwsync_devices::{
    EventBus, Node, Property, RawData, RawValue, SyncConfig, ValueGenre, ValueKey, ValueParser,
};

const CONTROLLER: u32 = 0xe3a1_0042;

fn node(config: SyncConfig) -> Node {
    Node::new(CONTROLLER, 4, EventBus::new(), config).unwrap()
}

fn library_version() -> RawValue {
    RawValue::new(ValueKey::new(4, 134, 1, 0), "Library Version", RawData::String("3".to_string()))
        .with_genre(ValueGenre::System)
        .read_only()
}

#[test]
fn test_bound_value_lines() {
    let mut node = node(SyncConfig::default());
    let key = ValueKey::new(4, 49, 1, 1);
    node.add_property(Property::new("temperature", ValueParser::Temperature).bound_to(key))
        .unwrap();

    let lines = capture_logs(|| {
        node.value_added(49, user_value(key, "Temperature", RawData::Decimal(21.46)).with_units("C"))
            .unwrap();
        node.value_changed(49, user_value(key, "Temperature", RawData::Decimal(22.0)).with_units("C"))
            .unwrap();
        node.value_removed(49, 1, 1);
    });

    assert_eq!(
        lines,
        vec![
            "nodee3a10042-4 valueAdded: 4-49-1-1:Temperature property: temperature = 21.5 C",
            "nodee3a10042-4 valueChanged: 4-49-1-1:Temperature property: temperature = 22.0 C",
            "nodee3a10042-4 valueRemoved: 4-49-1-1:Temperature property: temperature",
        ]
    );
}

#[test]
fn test_unbound_user_value_lines() {
    let mut node = node(SyncConfig::default());
    let key = ValueKey::new(4, 50, 1, 8);

    let lines = capture_logs(|| {
        node.value_added(50, user_value(key, "Power", RawData::Decimal(3.2)).with_units("W"))
            .unwrap();
        node.value_changed(50, user_value(key, "Power", RawData::Decimal(4.5)).with_units("W"))
            .unwrap();
        node.value_removed(50, 1, 8);
    });

    assert_eq!(
        lines,
        vec![
            "nodee3a10042-4 valueAdded: 4-50-1-8:Power = 3.2 W",
            "nodee3a10042-4 valueChanged: 4-50-1-8:Power = 4.5 W",
            "nodee3a10042-4 valueRemoved: 4-50-1-8:Power",
        ]
    );
}

#[test]
fn test_unbound_system_value_added_is_quiet_unless_debug() {
    let mut quiet = node(SyncConfig::default());
    let lines = capture_logs(|| {
        quiet.value_added(134, library_version()).unwrap();
        quiet.value_changed(134, library_version()).unwrap();
    });
    // valueChanged logs regardless of genre
    assert_eq!(
        lines,
        vec!["nodee3a10042-4 valueChanged: 4-134-1-0:Library Version = 3"]
    );

    let mut debug = node(SyncConfig::default().with_debug(true));
    let lines = capture_logs(|| debug.value_added(134, library_version()).unwrap());
    assert_eq!(
        lines,
        vec!["nodee3a10042-4 valueAdded: 4-134-1-0:Library Version = 3"]
    );
}

#[test]
fn test_unknown_value_removed_line() {
    let mut node = node(SyncConfig::default());
    let lines = capture_logs(|| node.value_removed(37, 1, 0));
    assert_eq!(
        lines,
        vec!["nodee3a10042-4 valueRemoved: unknown valueId: 4-37-1-0"]
    );
}
