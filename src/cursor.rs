// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The database cursor collaborator.
//!
//! A [`Cursor`] is a positioned, countable, seekable sequence of rows, the way a database
//! driver hands out query results. [`CursorPresentation`](crate::CursorPresentation) wraps
//! one and presents its model rows. [`ResultSet`] is an in-memory cursor over rows that
//! were already fetched.
use crate::{Error, Result, Value};
use ahash::RandomState;
use indexmap::IndexMap;
use std::fmt;

/// Rows projected by [`Cursor::as_array`].
#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    /// One entry per row.
    List(Vec<Value>),
    /// Entries keyed by a column of each row. Later rows win on duplicate keys.
    Keyed(IndexMap<String, Value, RandomState>),
}

impl Projection {
    pub fn len(&self) -> usize {
        match self {
            Projection::List(rows) => rows.len(),
            Projection::Keyed(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Projection::List(rows) => Box::new(rows.iter()),
            Projection::Keyed(rows) => Box::new(rows.values()),
        }
    }

    /// Applies `f` to every projected value, keeping keys.
    pub fn map(self, mut f: impl FnMut(Value) -> Value) -> Self {
        match self {
            Projection::List(rows) => Projection::List(rows.into_iter().map(f).collect()),
            Projection::Keyed(rows) => {
                Projection::Keyed(rows.into_iter().map(|(k, v)| (k, f(v))).collect())
            }
        }
    }
}

/// A positioned sequence of rows.
pub trait Cursor: fmt::Debug {
    fn count(&self) -> usize;

    /// The current position.
    fn key(&self) -> usize;

    /// The row at the current position, or `None` past either end.
    fn current(&self) -> Option<Value>;

    fn next(&mut self);

    fn prev(&mut self);

    fn rewind(&mut self);

    fn valid(&self) -> bool {
        self.offset_exists(self.key())
    }

    /// Moves to `position` if it exists. Returns whether it did.
    fn seek(&mut self, position: usize) -> bool;

    fn offset_exists(&self, offset: usize) -> bool {
        offset < self.count()
    }

    /// The row at `offset`, without moving.
    fn offset_get(&self, offset: usize) -> Option<Value>;

    fn offset_set(&mut self, _offset: usize, _value: Value) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn offset_unset(&mut self, _offset: usize) -> Result<()> {
        Err(Error::ReadOnly)
    }

    /// Projects every row.
    ///
    /// * no key, no value: the rows,
    /// * no key, a value column: that column of each row,
    /// * a key column, no value: the rows keyed by that column,
    /// * both: the value column keyed by the key column.
    fn as_array(&self, key: Option<&str>, value: Option<&str>) -> Projection;
}

/// Reads a column of a row. Rows that are neither mappings nor models have no columns.
pub(crate) fn column(row: &Value, name: &str) -> Value {
    match row {
        Value::Map(fields) => fields.get(name).cloned().unwrap_or_default(),
        Value::Model(model) => model.get(name),
        _ => Value::Absent,
    }
}

/// In-memory [`Cursor`].
#[derive(Clone, Debug, Default)]
pub struct ResultSet {
    rows: Vec<Value>,
    position: usize,
}

impl ResultSet {
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows, position: 0 }
    }
}

impl FromIterator<Value> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Cursor for ResultSet {
    fn count(&self) -> usize {
        self.rows.len()
    }

    fn key(&self) -> usize {
        self.position
    }

    fn current(&self) -> Option<Value> {
        self.rows.get(self.position).cloned()
    }

    // Stepping before the first row leaves the cursor invalid; stepping forward again
    // brings it back.
    fn next(&mut self) {
        self.position = self.position.wrapping_add(1);
    }

    fn prev(&mut self) {
        self.position = self.position.wrapping_sub(1);
    }

    fn rewind(&mut self) {
        self.position = 0;
    }

    fn seek(&mut self, position: usize) -> bool {
        if self.offset_exists(position) {
            self.position = position;
            true
        } else {
            false
        }
    }

    fn offset_get(&self, offset: usize) -> Option<Value> {
        self.rows.get(offset).cloned()
    }

    fn as_array(&self, key: Option<&str>, value: Option<&str>) -> Projection {
        let pick = |row: &Value| match value {
            Some(value) => column(row, value),
            None => row.clone(),
        };
        match key {
            None => Projection::List(self.rows.iter().map(pick).collect()),
            Some(key) => Projection::Keyed(
                self.rows
                    .iter()
                    .map(|row| (column(row, key).to_key(), pick(row)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, fields};

    fn rows() -> ResultSet {
        ResultSet::new(vec![
            Value::Map(fields! { "id" => 1, "name" => "a" }),
            Record::new("Model_User")
                .with("id", 2)
                .with("name", "b")
                .into_ref()
                .into(),
            Value::Map(fields! { "id" => 1, "name" => "c" }),
        ])
    }

    #[test]
    fn iterates_and_seeks() {
        let mut rows = rows();
        assert_eq!(rows.count(), 3);
        assert!(rows.valid());
        rows.prev();
        assert!(!rows.valid());
        assert_eq!(rows.current(), None);
        rows.next();
        assert_eq!(rows.key(), 0);
        assert!(rows.seek(2));
        assert!(!rows.seek(3));
        assert_eq!(rows.key(), 2);
        rows.next();
        assert!(!rows.valid());
        rows.rewind();
        assert_eq!(rows.key(), 0);
    }

    #[test]
    fn projections() {
        let rows = rows();
        assert_eq!(
            rows.as_array(None, Some("name")),
            Projection::List(vec!["a".into(), "b".into(), "c".into()])
        );
        let Projection::Keyed(by_id) = rows.as_array(Some("id"), Some("name")) else {
            panic!("expected a keyed projection");
        };
        assert_eq!(by_id.len(), 2);
        assert_eq!(by_id["1"], Value::from("c"));
        assert_eq!(by_id["2"], Value::from("b"));
        assert_eq!(rows.as_array(None, None).len(), 3);
    }

    #[test]
    fn writes_are_rejected() {
        let mut rows = rows();
        assert_eq!(rows.offset_set(0, Value::Null), Err(Error::ReadOnly));
        assert_eq!(rows.offset_unset(0), Err(Error::ReadOnly));
        assert_eq!(rows.offset_get(0), rows.current());
    }
}
