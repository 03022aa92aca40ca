//! Event types published by nodes.
//!
//! The event bus is how external automation logic learns about confirmed
//! property changes; nodes never call back into consumers directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed value held in a property's cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PropertyValue {
    /// No value bound yet, or the backing raw value was removed
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// Events emitted by nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeEvent {
    /// A property's cached value was confirmed by the hardware.
    PropertyChanged {
        node_id: String,
        property: String,
        value: PropertyValue,
    },

    /// A node acquired its default name from its first user value.
    NodeNamed { node_id: String, name: String },
}

impl NodeEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::PropertyChanged { .. } => "PropertyChanged",
            Self::NodeNamed { .. } => "NodeNamed",
        }
    }

    /// Composite id of the node that emitted this event.
    pub fn node_id(&self) -> &str {
        match self {
            Self::PropertyChanged { node_id, .. } | Self::NodeNamed { node_id, .. } => node_id,
        }
    }

    pub fn is_property_event(&self) -> bool {
        matches!(self, Self::PropertyChanged { .. })
    }
}

/// Event metadata attached by the bus on publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event ID
    pub event_id: String,
    /// Event source (component that published)
    pub source: String,
    /// Event timestamp
    pub timestamp: i64,
}

impl EventMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
