// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Raw and translated values.
//!
//! [`Value`] is the single currency of the presentation layer: sources hand out values,
//! rules and computed fields consume and produce them, and the translation stage may wrap
//! them into a [`Presentation`]. The shape of a value (scalar, sequence, mapping, model or
//! presentation) is explicit in its variant, so wrapping never needs to sniff keys beyond
//! the two reserved tags.
use crate::{ModelRef, Presentation};
use ahash::RandomState;
use indexmap::IndexMap;
use std::{fmt, rc::Rc};

#[cfg(feature = "chrono")]
use chrono::{DateTime, Utc};

/// A value as stored in a source, computed by a handler, or produced by translation.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The sentinel returned for keys that do not exist in the source.
    #[default]
    Absent,
    /// An explicit null stored in the source.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    #[cfg(feature = "chrono")]
    Timestamp(DateTime<Utc>),
    /// An ordered sequence of values.
    List(Vec<Value>),
    /// A mapping of named values.
    Map(Fields),
    /// A reference to an ORM-like model.
    Model(ModelRef),
    /// An already wrapped value. Only produced by translation or by handlers.
    Presentation(Presentation),
}

impl Value {
    /// Returns true for the missing-key sentinel.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Returns true for [`Value::Absent`] and [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Absent | Value::Null)
    }

    /// Returns true for sequences, mappings, models and presentations.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Map(_) | Value::Model(_) | Value::Presentation(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_fields(&self) -> Option<&Fields> {
        match self {
            Value::Map(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelRef> {
        match self {
            Value::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_presentation(&self) -> Option<&Presentation> {
        match self {
            Value::Presentation(presentation) => Some(presentation),
            _ => None,
        }
    }

    /// Gives a short name to describe the shape of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            #[cfg(feature = "chrono")]
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Model(_) => "model",
            Value::Presentation(_) => "presentation",
        }
    }

    /// Converts this value into a mapping key.
    ///
    /// Booleans become `"1"` and `""`, floats are truncated, missing and null values give the
    /// empty string. Compound values are keyed by their shape.
    pub fn to_key(&self) -> String {
        match self {
            Value::Absent | Value::Null => String::new(),
            Value::Bool(true) => "1".to_owned(),
            Value::Bool(false) => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => (f.trunc() as i64).to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            #[cfg(feature = "chrono")]
            Value::Timestamp(t) => t.to_rfc3339(),
            Value::List(_) | Value::Map(_) => self.type_name().to_owned(),
            Value::Model(model) => model.class_name().to_owned(),
            Value::Presentation(presentation) => presentation.presenter_type().name().to_owned(),
        }
    }
}

// Models and presentations compare by identity; everything else structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            #[cfg(feature = "chrono")]
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Model(a), Value::Model(b)) => Rc::ptr_eq(a, b),
            (Value::Presentation(a), Value::Presentation(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "(absent)"),
            Value::Null => write!(f, "(null)"),
            Value::String(s) => write!(f, "{s}"),
            Value::Float(v) => write!(f, "{v}"),
            other => write!(f, "{}", other.to_key()),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),+ $(,)?) => {
        $(impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::$variant(value.into())
            }
        })+
    };
}

impl_from!(
    bool => Bool,
    i64 => Int,
    // i32 because it's the "default" inference integer type
    i32 => Int,
    u32 => Int,
    f64 => Float,
    String => String,
    &str => String,
    Fields => Map,
    ModelRef => Model,
    Presentation => Presentation,
);

#[cfg(feature = "chrono")]
impl_from!(DateTime<Utc> => Timestamp);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// An insertion-ordered mapping of field names to values.
///
/// This is the shape of a plain data source and of the non-model payload of an inbound
/// mapping. A mapping whose keys are exactly `"0"`, `"1"`, ... in order is
/// [sequential](Fields::is_sequential) and is treated like a list, never as a record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields(IndexMap<String, Value, RandomState>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sequential mapping keyed by position.
    pub fn from_sequence(values: impl IntoIterator<Item = Value>) -> Self {
        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| (i.to_string(), value))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts a value, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if the keys are `"0".."n-1"` in order, that is, the mapping is a list.
    ///
    /// The empty mapping is sequential.
    pub fn is_sequential(&self) -> bool {
        self.0
            .keys()
            .enumerate()
            .all(|(i, key)| key.parse::<usize>().is_ok_and(|k| k == i))
    }

    /// Looks up a key, or a `.`-separated path through nested mappings and lists.
    ///
    /// An exact key match wins over path traversal, so keys containing dots stay reachable.
    pub fn path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Map(fields) => fields.get(segment)?,
                Value::List(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
