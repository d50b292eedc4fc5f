// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::ModelPresentation;
use crate::{
    Error, FieldMap, Registry, Result, Value, create_map,
    cursor::{self, Cursor, Projection},
};
use std::{cell::RefCell, fmt, rc::Rc};
use tracing::trace;

type ProjectionKey = (Option<String>, Option<String>);

/// Presentation of a database cursor.
///
/// Model rows are presented with their model presentation, built once per position. Every
/// other row is returned as the cursor hands it out. Positioning is delegated to the cursor.
pub struct CursorPresentation {
    registry: Rc<Registry>,
    rows: Option<Box<dyn Cursor>>,
    objects: RefCell<FieldMap<usize, Value>>,
    projections: RefCell<FieldMap<ProjectionKey, Projection>>,
}

impl CursorPresentation {
    /// A presentation without rows. Every row operation fails until rows are bound.
    pub fn new(registry: Rc<Registry>) -> Self {
        Self {
            registry,
            rows: None,
            objects: RefCell::new(create_map()),
            projections: RefCell::new(create_map()),
        }
    }

    #[must_use]
    pub fn with_rows(mut self, rows: impl Cursor + 'static) -> Self {
        self.set_rows(Box::new(rows));
        self
    }

    /// Binds a cursor, dropping every wrapped row and projection.
    pub fn set_rows(&mut self, rows: Box<dyn Cursor>) -> &mut Self {
        self.clear_cache();
        self.rows = Some(rows);
        self
    }

    pub fn clear_cache(&self) {
        self.objects.borrow_mut().clear();
        self.projections.borrow_mut().clear();
    }

    pub fn rows(&self) -> Result<&dyn Cursor> {
        self.rows.as_deref().ok_or(Error::UnboundSource { kind: "cursor" })
    }

    fn rows_mut(&mut self) -> Result<&mut dyn Cursor> {
        match &mut self.rows {
            Some(rows) => Ok(&mut **rows),
            None => Err(Error::UnboundSource { kind: "cursor" }),
        }
    }

    fn wrap(&self, position: usize, row: Value) -> Value {
        let Value::Model(model) = row else {
            return row;
        };
        if let Some(wrapped) = self.objects.borrow().get(&position) {
            trace!(position, "row cache hit");
            return wrapped.clone();
        }
        let wrapped: Value = ModelPresentation::from_model(Rc::clone(&self.registry), model).into();
        self.objects.borrow_mut().insert(position, wrapped.clone());
        wrapped
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.rows()?.count())
    }

    pub fn key(&self) -> Result<usize> {
        Ok(self.rows()?.key())
    }

    /// The presented row at the current position, or `None` past either end.
    pub fn current(&self) -> Result<Option<Value>> {
        let rows = self.rows()?;
        let position = rows.key();
        Ok(rows.current().map(|row| self.wrap(position, row)))
    }

    pub fn next(&mut self) -> Result<&mut Self> {
        Cursor::next(self.rows_mut()?);
        Ok(self)
    }

    pub fn prev(&mut self) -> Result<&mut Self> {
        Cursor::prev(self.rows_mut()?);
        Ok(self)
    }

    pub fn rewind(&mut self) -> Result<&mut Self> {
        Cursor::rewind(self.rows_mut()?);
        Ok(self)
    }

    pub fn valid(&self) -> Result<bool> {
        Ok(self.rows()?.valid())
    }

    pub fn seek(&mut self, position: usize) -> Result<bool> {
        Ok(self.rows_mut()?.seek(position))
    }

    pub fn offset_exists(&self, offset: usize) -> Result<bool> {
        Ok(self.rows()?.offset_exists(offset))
    }

    /// The presented row at `offset`, without moving.
    pub fn offset_get(&self, offset: usize) -> Result<Option<Value>> {
        let row = self.rows()?.offset_get(offset);
        Ok(row.map(|row| self.wrap(offset, row)))
    }

    pub fn offset_set(&mut self, offset: usize, value: Value) -> Result<()> {
        self.rows_mut()?.offset_set(offset, value)
    }

    pub fn offset_unset(&mut self, offset: usize) -> Result<()> {
        self.rows_mut()?.offset_unset(offset)
    }

    /// Reads `name` from the current row, or returns `default` if the row has no such
    /// field or it is null.
    pub fn get(&self, name: &str, default: Value) -> Result<Value> {
        let value = match self.current()? {
            Some(Value::Presentation(row)) if row.as_source().has_field(name) => row.get(name)?,
            Some(row @ Value::Map(_)) => cursor::column(&row, name),
            _ => Value::Absent,
        };
        Ok(if value.is_null() { default } else { value })
    }

    /// Projects the rows like [`Cursor::as_array`], presenting model values.
    ///
    /// Projections are cached per `(key, value)` pair.
    pub fn as_array(&self, key: Option<&str>, value: Option<&str>) -> Result<Projection> {
        let cache_key = (key.map(str::to_owned), value.map(str::to_owned));
        if let Some(projection) = self.projections.borrow().get(&cache_key) {
            return Ok(projection.clone());
        }
        let projection = self.rows()?.as_array(key, value).map(|row| match row {
            Value::Model(model) => ModelPresentation::from_model(Rc::clone(&self.registry), model).into(),
            other => other,
        });
        self.projections
            .borrow_mut()
            .insert(cache_key, projection.clone());
        Ok(projection)
    }
}

impl fmt::Debug for CursorPresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorPresentation")
            .field("rows", &self.rows)
            .field("wrapped", &self.objects.borrow().len())
            .finish()
    }
}
