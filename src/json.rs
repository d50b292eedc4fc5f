// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! JSON representation
//!
//! Flattened presentations are plain `serde_json` structures. Scalars map onto their JSON
//! counterparts with a few conventions:
//!
//! * both [`Value::Absent`] and [`Value::Null`] become `null`,
//! * bytes are base64 encoded,
//! * timestamps are RFC 3339 strings with millisecond precision,
//! * non-finite floats become `null`.
//!
//! Compound values (lists, mappings, models and presentations) are flattened by the
//! presentation engine, which knows how to wrap models; see
//! [`DataPresentation::as_structure`](crate::DataPresentation::as_structure).
use crate::{Fields, Value};

/// Converts a scalar [`Value`] to a [`serde_json::Value`].
///
/// Returns `None` for compound values.
pub(crate) fn scalar(value: &Value) -> Option<serde_json::Value> {
    Some(match value {
        Value::Absent | Value::Null => serde_json::Value::Null,
        Value::Bool(b) => (*b).into(),
        Value::Int(i) => (*i).into(),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => s.as_str().into(),
        Value::Bytes(b) => {
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b).into()
        }
        #[cfg(feature = "chrono")]
        Value::Timestamp(t) => t
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            .into(),
        Value::List(_) | Value::Map(_) | Value::Model(_) | Value::Presentation(_) => return None,
    })
}

/// Converts a [`serde_json::Value`] to a [`Value`].
///
/// Integers that fit an `i64` stay integers, every other number becomes a float. Objects
/// become [`Value::Map`], so reserved keys such as `_model` survive the conversion and are
/// honoured when the mapping is later presented.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Map(object.into_iter().collect()),
        }
    }
}

/// Converts a JSON object into [`Fields`], keeping key order.
impl From<serde_json::Map<String, serde_json::Value>> for Fields {
    fn from(object: serde_json::Map<String, serde_json::Value>) -> Self {
        object.into_iter().collect()
    }
}
