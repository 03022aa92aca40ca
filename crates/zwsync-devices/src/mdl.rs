//! Node data model.
//!
//! Raw values as the transport reports them, the structured key that
//! addresses them, and the descriptive metadata a node accumulates while
//! the hardware is being interviewed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Address of one raw value: (node, command class, instance, index).
///
/// Serialized as `"{node}-{class}-{instance}-{index}"`, the same text used
/// in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ValueKey {
    pub node_id: u8,
    pub command_class: u8,
    pub instance: u8,
    pub index: u16,
}

impl ValueKey {
    pub const fn new(node_id: u8, command_class: u8, instance: u8, index: u16) -> Self {
        Self {
            node_id,
            command_class,
            instance,
            index,
        }
    }

    /// Whether this key matches a class and optional instance/index filter.
    pub fn matches(&self, command_class: u8, instance: Option<u8>, index: Option<u16>) -> bool {
        self.command_class == command_class
            && instance.is_none_or(|i| i == self.instance)
            && index.is_none_or(|i| i == self.index)
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.node_id, self.command_class, self.instance, self.index
        )
    }
}

/// Error returned when a value key string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value key {input:?}: {reason}")]
pub struct ValueKeyParseError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for ValueKey {
    type Err = ValueKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ValueKeyParseError {
            input: s.to_string(),
            reason,
        };
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 4 {
            return Err(err("expected node-class-instance-index"));
        }
        Ok(Self {
            node_id: parts[0].parse().map_err(|_| err("bad node id"))?,
            command_class: parts[1].parse().map_err(|_| err("bad command class"))?,
            instance: parts[2].parse().map_err(|_| err("bad instance"))?,
            index: parts[3].parse().map_err(|_| err("bad index"))?,
        })
    }
}

impl From<ValueKey> for String {
    fn from(key: ValueKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for ValueKey {
    type Error = ValueKeyParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Classification of a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueGenre {
    Basic,
    /// Values meant for end users (switch state, sensor readings).
    User,
    Config,
    #[default]
    System,
}

impl fmt::Display for ValueGenre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::User => write!(f, "user"),
            Self::Config => write!(f, "config"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Untyped payload of a raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RawData {
    Bool(bool),
    Byte(u8),
    Int(i32),
    Decimal(f64),
    String(String),
    /// Currently selected item of a list value
    List(String),
    Raw(Vec<u8>),
}

impl fmt::Display for RawData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::String(v) | Self::List(v) => write!(f, "{}", v),
            Self::Raw(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                write!(f, "{}", hex.join(" "))
            }
        }
    }
}

/// A value as last reported by the hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawValue {
    pub value_id: ValueKey,
    pub label: String,
    pub value: RawData,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub genre: ValueGenre,
    #[serde(default)]
    pub read_only: bool,
}

impl RawValue {
    pub fn new(value_id: ValueKey, label: impl Into<String>, value: RawData) -> Self {
        Self {
            value_id,
            label: label.into(),
            value,
            units: String::new(),
            genre: ValueGenre::default(),
            read_only: false,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_genre(mut self, genre: ValueGenre) -> Self {
        self.genre = genre;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn command_class(&self) -> u8 {
        self.value_id.command_class
    }

    pub fn instance(&self) -> u8 {
        self.value_id.instance
    }

    pub fn index(&self) -> u16 {
        self.value_id.index
    }

    pub fn is_user(&self) -> bool {
        self.genre == ValueGenre::User
    }

    /// Units formatted for appending to a log line (`" W"`, or empty).
    pub(crate) fn units_suffix(&self) -> String {
        if self.units.is_empty() {
            String::new()
        } else {
            format!(" {}", self.units)
        }
    }
}

/// Last mutation applied to a node, or a lifecycle marker set by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    #[default]
    Constructed,
    ValueAdded,
    ValueChanged,
    ValueRemoved,
    Ready,
    Alive,
    Dead,
    Awake,
    Sleeping,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::ValueAdded => "value-added",
            Self::ValueChanged => "value-changed",
            Self::ValueRemoved => "value-removed",
            Self::Ready => "ready",
            Self::Alive => "alive",
            Self::Dead => "dead",
            Self::Awake => "awake",
            Self::Sleeping => "sleeping",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive metadata discovered while interviewing the node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub location: String,
    pub manufacturer: String,
    pub manufacturer_id: String,
    pub product: String,
    pub product_id: String,
    pub product_type: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

/// Partial metadata update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub location: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturer_id: Option<String>,
    pub product: Option<String>,
    pub product_id: Option<String>,
    pub product_type: Option<String>,
    pub node_type: Option<String>,
}

impl NodeMetadata {
    /// Apply an update, last write wins per field.
    pub fn apply(&mut self, update: MetadataUpdate) {
        let fields = [
            (&mut self.location, update.location),
            (&mut self.manufacturer, update.manufacturer),
            (&mut self.manufacturer_id, update.manufacturer_id),
            (&mut self.product, update.product),
            (&mut self.product_id, update.product_id),
            (&mut self.product_type, update.product_type),
            (&mut self.node_type, update.node_type),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

/// Names for the basic device class codes; index 0 is unused.
pub const BASIC_TYPES: [&str; 5] = [
    "",
    "Controller",
    "StaticController",
    "Slave",
    "RoutingSlave",
];

/// Render a basic device class code, `??? {code} ???` when unknown.
pub fn basic_type_name(code: u8) -> String {
    match code {
        1..=4 => BASIC_TYPES[code as usize].to_string(),
        _ => format!("??? {} ???", code),
    }
}

/// Write-once name derived from the first user-facing value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefaultName {
    #[default]
    Unclaimed,
    Claimed(String),
}

impl DefaultName {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Unclaimed => None,
            Self::Claimed(name) => Some(name),
        }
    }

    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed(_))
    }

    /// Claim the name if still unclaimed. Returns the name when this call claimed it.
    pub fn claim(&mut self, name: String) -> Option<&str> {
        if self.is_claimed() {
            return None;
        }
        *self = Self::Claimed(name);
        self.as_deref()
    }
}
