// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{DataPresentation, ModelPresentation, flatten};
use crate::{Error, FieldMap, Fields, Registry, Result, Value, create_map};
use ahash::RandomState;
use indexmap::IndexMap;
use std::{cell::RefCell, fmt, rc::Rc};

/// Read-only presentation of an in-memory sequence of rows.
///
/// Rows are presented on access and memoized per position: mappings and sequences become
/// data presentations, models become model presentations, and scalars are returned as is.
///
/// ```rust
/// # use present::{fields, ListPresentation, Registry, Value};
/// # use std::rc::Rc;
/// let list = ListPresentation::new(
///     Rc::new(Registry::new()),
///     vec![fields! { "id" => 1 }.into(), fields! { "id" => 2 }.into()],
/// );
/// let ids = list
///     .iter()
///     .map(|row| row.as_presentation().unwrap().get("id").unwrap())
///     .collect::<Vec<_>>();
/// assert_eq!(ids, [Value::from(1), Value::from(2)]);
/// ```
pub struct ListPresentation {
    registry: Rc<Registry>,
    rows: Vec<Value>,
    position: usize,
    objects: RefCell<FieldMap<usize, Value>>,
}

impl ListPresentation {
    pub fn new(registry: Rc<Registry>, rows: Vec<Value>) -> Self {
        Self {
            registry,
            rows,
            position: 0,
            objects: RefCell::new(create_map()),
        }
    }

    /// Replaces the rows, dropping every presented row. The position is kept.
    pub fn set_rows(&mut self, rows: Vec<Value>) -> &mut Self {
        self.objects.borrow_mut().clear();
        self.rows = rows;
        self
    }

    fn present(&self, row: &Value) -> Value {
        let registry = Rc::clone(&self.registry);
        match row {
            Value::Map(fields) => DataPresentation::new(registry)
                .with_source(fields.clone())
                .into(),
            Value::List(items) => DataPresentation::new(registry)
                .with_source(Fields::from_sequence(items.iter().cloned()))
                .into(),
            Value::Model(model) => ModelPresentation::from_model(registry, Rc::clone(model)).into(),
            other => other.clone(),
        }
    }

    fn row(&self, position: usize) -> Option<Value> {
        let row = self.rows.get(position)?;
        if let Some(presented) = self.objects.borrow().get(&position) {
            return Some(presented.clone());
        }
        let presented = self.present(row);
        self.objects.borrow_mut().insert(position, presented.clone());
        Some(presented)
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn key(&self) -> usize {
        self.position
    }

    /// The presented row at the current position, or `None` past either end.
    pub fn current(&self) -> Option<Value> {
        self.row(self.position)
    }

    pub fn next(&mut self) -> &mut Self {
        self.position = self.position.wrapping_add(1);
        self
    }

    pub fn prev(&mut self) -> &mut Self {
        self.position = self.position.wrapping_sub(1);
        self
    }

    pub fn rewind(&mut self) -> &mut Self {
        self.position = 0;
        self
    }

    pub fn valid(&self) -> bool {
        self.offset_exists(self.position)
    }

    /// Moves to `position` if it exists. Returns whether it did.
    pub fn seek(&mut self, position: usize) -> bool {
        if self.offset_exists(position) {
            self.position = position;
            true
        } else {
            false
        }
    }

    pub fn offset_exists(&self, offset: usize) -> bool {
        offset < self.rows.len()
    }

    /// The presented row at `offset`, without moving.
    pub fn offset_get(&self, offset: usize) -> Option<Value> {
        self.row(offset)
    }

    pub fn offset_set(&mut self, _offset: usize, _value: Value) -> Result<()> {
        Err(Error::ReadOnly)
    }

    pub fn offset_unset(&mut self, _offset: usize) -> Result<()> {
        Err(Error::ReadOnly)
    }

    /// Iterates over the presented rows, independently of the current position.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            position: 0,
        }
    }

    /// Flattens every row.
    ///
    /// Without a key the result is a JSON array. With a key it is an object keyed by that
    /// field of each row; rows that share a key overwrite each other.
    pub fn as_array(&self, key: Option<&str>) -> Result<serde_json::Value> {
        let Some(key) = key else {
            return self
                .iter()
                .map(|row| flatten(&self.registry, &row))
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array);
        };
        let mut object = serde_json::Map::new();
        for (position, row) in self.iter().enumerate() {
            let presentation = row
                .as_presentation()
                .ok_or(Error::NotPresentable { position })?;
            object.insert(presentation.get(key)?.to_key(), flatten(&self.registry, &row)?);
        }
        Ok(serde_json::Value::Object(object))
    }

    /// The presented rows, keyed by the given field of each row.
    pub fn as_indexed_array(&self, key: &str) -> Result<IndexMap<String, Value, RandomState>> {
        let mut indexed = IndexMap::default();
        for (position, row) in self.iter().enumerate() {
            let presentation = row
                .as_presentation()
                .ok_or(Error::NotPresentable { position })?;
            indexed.insert(presentation.get(key)?.to_key(), row.clone());
        }
        Ok(indexed)
    }
}

impl fmt::Debug for ListPresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListPresentation")
            .field("rows", &self.rows)
            .field("position", &self.position)
            .finish()
    }
}

impl serde::Serialize for ListPresentation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let rows = self.as_array(None).map_err(serde::ser::Error::custom)?;
        serde::Serialize::serialize(&rows, serializer)
    }
}

/// Iterator over the presented rows of a [`ListPresentation`].
#[derive(Debug)]
pub struct Iter<'a> {
    list: &'a ListPresentation,
    position: usize,
}

impl Iterator for Iter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let row = self.list.row(self.position)?;
        self.position += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.list.count().saturating_sub(self.position);
        (left, Some(left))
    }
}

impl<'a> IntoIterator for &'a ListPresentation {
    type Item = Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
