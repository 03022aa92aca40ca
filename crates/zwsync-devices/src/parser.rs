//! Conversion between raw protocol payloads and typed property values.

use serde::{Deserialize, Serialize};
use zwsync_core::{Error, PropertyValue, Result};

use crate::mdl::{RawData, RawValue};

/// Highest level a multilevel value reports; it stands for 100%.
const LEVEL_MAX: u8 = 99;

/// How a property interprets the raw value it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueParser {
    /// Pass the payload through with its natural type.
    #[default]
    Identity,
    /// Binary state; any non-zero level is on.
    OnOff,
    /// Multilevel 0..=99 mapped to a percentage.
    Level,
    /// Numeric reading shown with one decimal.
    Temperature,
}

impl ValueParser {
    /// Parse a raw value into `(typed value, display string)`.
    pub fn parse(&self, raw: &RawValue) -> Result<(PropertyValue, String)> {
        let location = raw.value_id.to_string();
        match self {
            Self::Identity => {
                let value = match &raw.value {
                    RawData::Bool(v) => PropertyValue::Boolean(*v),
                    RawData::Byte(v) => PropertyValue::Integer(i64::from(*v)),
                    RawData::Int(v) => PropertyValue::Integer(i64::from(*v)),
                    RawData::Decimal(v) => PropertyValue::Float(*v),
                    RawData::String(v) | RawData::List(v) => PropertyValue::String(v.clone()),
                    RawData::Raw(_) => PropertyValue::String(raw.value.to_string()),
                };
                let display = value.to_string();
                Ok((value, display))
            }
            Self::OnOff => {
                let on = match &raw.value {
                    RawData::Bool(v) => *v,
                    RawData::Byte(v) => *v != 0,
                    RawData::Int(v) => *v != 0,
                    other => {
                        return Err(Error::parse(
                            location,
                            format!("on/off expects a bool or level, got {}", other),
                        ))
                    }
                };
                Ok((PropertyValue::Boolean(on), on_off_str(on).to_string()))
            }
            Self::Level => {
                let level = match &raw.value {
                    RawData::Byte(v) => i64::from(*v),
                    RawData::Int(v) => i64::from(*v),
                    other => {
                        return Err(Error::parse(
                            location,
                            format!("level expects an integer, got {}", other),
                        ))
                    }
                };
                if !(0..=i64::from(LEVEL_MAX)).contains(&level) {
                    return Err(Error::parse(
                        location,
                        format!("level {} outside 0..={}", level, LEVEL_MAX),
                    ));
                }
                let percent = if level == i64::from(LEVEL_MAX) { 100 } else { level };
                Ok((PropertyValue::Integer(percent), format!("{}%", percent)))
            }
            Self::Temperature => {
                let reading = match &raw.value {
                    RawData::Decimal(v) => *v,
                    RawData::Int(v) => f64::from(*v),
                    RawData::Byte(v) => f64::from(*v),
                    RawData::String(s) => s.trim().parse().map_err(|_| {
                        Error::parse(location.clone(), format!("not a number: {:?}", s))
                    })?,
                    other => {
                        return Err(Error::parse(
                            location,
                            format!("temperature expects a number, got {}", other),
                        ))
                    }
                };
                Ok((PropertyValue::Float(reading), format!("{:.1}", reading)))
            }
        }
    }

    /// Convert a typed value back into the payload written to the hardware.
    pub fn to_raw(&self, value: &PropertyValue) -> Result<RawData> {
        let mismatch = |expected: &str| {
            Error::validation(format!(
                "{:?} property expects {}, got {}",
                self,
                expected,
                value.type_name()
            ))
        };
        match self {
            Self::Identity => match value {
                PropertyValue::Boolean(v) => Ok(RawData::Bool(*v)),
                PropertyValue::Integer(v) => i32::try_from(*v)
                    .map(RawData::Int)
                    .map_err(|_| mismatch("a 32-bit integer")),
                PropertyValue::Float(v) => Ok(RawData::Decimal(*v)),
                PropertyValue::String(v) => Ok(RawData::String(v.clone())),
                PropertyValue::Null => Err(mismatch("a value")),
            },
            Self::OnOff => value.as_bool().map(RawData::Bool).ok_or_else(|| mismatch("a boolean")),
            Self::Level => {
                let percent = value.as_f64().ok_or_else(|| mismatch("a number"))?;
                let percent = percent.round().clamp(0.0, 100.0) as u8;
                Ok(RawData::Byte(percent.min(LEVEL_MAX)))
            }
            Self::Temperature => value
                .as_f64()
                .map(RawData::Decimal)
                .ok_or_else(|| mismatch("a number")),
        }
    }
}

fn on_off_str(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}
