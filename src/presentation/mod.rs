// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The field resolution engine and the presentation variants.
//!
//! Data and model presentations implement [`FieldSource`], a small capability trait: they
//! know how to read a raw field from their source, how to project their source into a
//! basic structure, and which [`Engine`] holds their caches. Everything else (caching,
//! computed fields, rule chains, wrapping of nested values and flattening) is implemented
//! once on `dyn FieldSource`, so rules and handlers can call back into the presentation that
//! is evaluating them.
//!
//! Cursor and list presentations do not resolve fields themselves; they wrap their rows
//! into data and model presentations on access.
use crate::{FieldMap, Fields, Kind, PresenterType, Registry, Result, Value, create_map, json};
use std::{cell::RefCell, fmt, rc::Rc};
use tracing::{debug, trace};

mod cursor;
mod data;
mod list;
mod model;

pub use cursor::CursorPresentation;
pub use data::DataPresentation;
pub use list::{Iter, ListPresentation};
pub use model::ModelPresentation;

/// A flattened presentation.
pub type Structure = serde_json::Map<String, serde_json::Value>;

/// Caches and declarations of one presentation instance.
pub struct Engine {
    presenter: Rc<PresenterType>,
    registry: Rc<Registry>,
    values: RefCell<FieldMap<String, Value>>,
    computed: RefCell<FieldMap<String, Value>>,
}

impl Engine {
    pub fn new(registry: Rc<Registry>, presenter: Rc<PresenterType>) -> Self {
        Self {
            presenter,
            registry,
            values: RefCell::new(create_map()),
            computed: RefCell::new(create_map()),
        }
    }

    pub fn presenter_type(&self) -> &Rc<PresenterType> {
        &self.presenter
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// Empties both caches.
    pub fn clear(&self) {
        debug!(presenter = self.presenter.name(), "clearing caches");
        self.values.borrow_mut().clear();
        self.computed.borrow_mut().clear();
    }

    /// Stores an already translated value, as if it was resolved by `get`.
    pub(crate) fn seed(&self, field: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(field.into(), value);
    }

    fn cached(&self, field: &str) -> Option<Value> {
        self.values.borrow().get(field).cloned()
    }

    fn cached_computed(&self, field: &str) -> Option<Value> {
        self.computed.borrow().get(field).cloned()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("presenter", &self.presenter.name())
            .field("cached", &self.values.borrow().len())
            .field("computed", &self.computed.borrow().len())
            .finish()
    }
}

/// A presentation that resolves its own fields.
///
/// The field pipeline itself is available on `dyn FieldSource`, see [`get`](#method.get).
pub trait FieldSource {
    fn engine(&self) -> &Engine;

    /// Reads a field straight from the source. Missing fields give [`Value::Absent`].
    fn value(&self, field: &str) -> Result<Value>;

    /// Projects the source into a structure, without computed fields.
    fn basic_structure(&self) -> Result<Structure>;

    /// Wraps or transforms a raw value.
    ///
    /// Implementations defer to [`translate_shape`] for everything they do not handle.
    fn translate_field(&self, field: &str, raw: Value) -> Result<Value>;

    /// Returns true if `field` can be resolved to something other than a missing value.
    fn has_field(&self, field: &str) -> bool {
        self.engine().presenter_type().computed(field).is_some()
    }
}

impl dyn FieldSource + '_ {
    /// Resolves a field: fetch, translate and cache.
    ///
    /// Repeated calls return the cached value without running rules or handlers again.
    pub fn get(&self, field: &str) -> Result<Value> {
        if let Some(value) = self.engine().cached(field) {
            trace!(field, "value cache hit");
            return Ok(value);
        }
        let raw = self.fetch_value(field)?;
        let value = self.translate_field(field, raw)?;
        self.engine().seed(field, value.clone());
        Ok(value)
    }

    /// The raw value of a field, computed fields included, without translation.
    pub fn raw(&self, field: &str) -> Result<Value> {
        self.fetch_value(field)
    }

    fn fetch_value(&self, field: &str) -> Result<Value> {
        let engine = self.engine();
        if let Some(value) = engine.cached_computed(field) {
            trace!(field, "computed cache hit");
            return Ok(value);
        }
        let presenter = Rc::clone(engine.presenter_type());
        match presenter.computed(field) {
            Some(computed) => {
                debug!(field, presenter = presenter.name(), "evaluating computed field");
                let value = computed.evaluate(self)?;
                engine
                    .computed
                    .borrow_mut()
                    .insert(field.to_owned(), value.clone());
                Ok(value)
            }
            None => self.value(field),
        }
    }

    /// Runs `value` through the rule chain of `field`.
    pub fn translate_value(&self, field: &str, value: Value) -> Result<Value> {
        let presenter = Rc::clone(self.presenter_type());
        presenter
            .rules(field)
            .iter()
            .try_fold(value, |value, rule| rule.apply(self, value))
    }

    /// Flattens this presentation: its basic structure, then every computed field.
    pub fn as_structure(&self) -> Result<Structure> {
        let mut structure = self.basic_structure()?;
        let presenter = Rc::clone(self.presenter_type());
        for field in presenter.computed_fields() {
            let value = self.get(field)?;
            structure.insert(field.to_owned(), flatten(self.registry(), &value)?);
        }
        Ok(structure)
    }

    pub fn clear_cache(&self) {
        self.engine().clear();
    }

    pub fn presenter_type(&self) -> &Rc<PresenterType> {
        self.engine().presenter_type()
    }

    pub fn registry(&self) -> &Rc<Registry> {
        self.engine().registry()
    }
}

/// Wraps a raw value according to its shape.
///
/// * presentations are returned unchanged,
/// * models become model presentations,
/// * mappings tagged with the model key build a new model from the remaining fields,
/// * other associative mappings become data presentations, optionally named by the data key,
/// * everything else goes through the rule chain of `field`.
pub fn translate_shape(source: &dyn FieldSource, field: &str, raw: Value) -> Result<Value> {
    let registry = source.registry();
    let config = registry.config();
    match raw {
        Value::Presentation(_) => Ok(raw),
        Value::Model(model) => Ok(ModelPresentation::from_model(Rc::clone(registry), model).into()),
        Value::Map(mut fields) => {
            let model_name = match fields.remove(&config.model_key) {
                Some(Value::String(name)) if !name.is_empty() => Some(name),
                _ => None,
            };
            if let Some(name) = model_name {
                let mut presentation = ModelPresentation::named(Rc::clone(registry), &name);
                presentation.make(fields)?;
                return Ok(presentation.into());
            }
            if fields.is_sequential() {
                return source.translate_value(field, Value::Map(fields));
            }
            let name = match fields.remove(&config.data_key) {
                Some(Value::String(name)) => Some(name),
                _ => None,
            };
            Ok(DataPresentation::resolve(Rc::clone(registry), name.as_deref())
                .with_source(fields)
                .into())
        }
        other => source.translate_value(field, other),
    }
}

/// Converts a translated value to JSON, flattening nested presentations and models.
pub(crate) fn flatten(registry: &Rc<Registry>, value: &Value) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Presentation(presentation) => {
            serde_json::Value::Object(presentation.as_structure()?)
        }
        Value::Model(model) => serde_json::Value::Object(
            ModelPresentation::from_model(Rc::clone(registry), Rc::clone(model))
                .as_structure()?,
        ),
        Value::List(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|item| flatten(registry, item))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Map(fields) => serde_json::Value::Object(flatten_fields(registry, fields)?),
        scalar => json::scalar(scalar).unwrap_or_default(),
    })
}

fn flatten_fields(registry: &Rc<Registry>, fields: &Fields) -> Result<Structure> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.to_owned(), flatten(registry, value)?)))
        .collect()
}

/// A nested presentation, as produced by wrapping.
#[derive(Clone)]
pub enum Presentation {
    Data(Rc<DataPresentation>),
    Model(Rc<ModelPresentation>),
}

impl Presentation {
    /// Returns true if both handles point at the same presentation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Presentation::Data(a), Presentation::Data(b)) => Rc::ptr_eq(a, b),
            (Presentation::Model(a), Presentation::Model(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Presentation::Data(_) => Kind::Data,
            Presentation::Model(_) => Kind::Model,
        }
    }

    pub fn as_source(&self) -> &dyn FieldSource {
        match self {
            Presentation::Data(data) => data.as_source(),
            Presentation::Model(model) => model.as_source(),
        }
    }

    pub fn presenter_type(&self) -> &Rc<PresenterType> {
        self.as_source().presenter_type()
    }

    pub fn get(&self, field: &str) -> Result<Value> {
        self.as_source().get(field)
    }

    pub fn as_structure(&self) -> Result<Structure> {
        self.as_source().as_structure()
    }

    pub fn as_data(&self) -> Option<&DataPresentation> {
        match self {
            Presentation::Data(data) => Some(data),
            Presentation::Model(_) => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelPresentation> {
        match self {
            Presentation::Model(model) => Some(model),
            Presentation::Data(_) => None,
        }
    }
}

impl fmt::Debug for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presentation::Data(data) => fmt::Debug::fmt(&**data, f),
            Presentation::Model(model) => fmt::Debug::fmt(&**model, f),
        }
    }
}

impl serde::Serialize for Presentation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Presentation::Data(data) => serde::Serialize::serialize(&**data, serializer),
            Presentation::Model(model) => serde::Serialize::serialize(&**model, serializer),
        }
    }
}

impl From<DataPresentation> for Value {
    fn from(presentation: DataPresentation) -> Self {
        Value::Presentation(Presentation::Data(Rc::new(presentation)))
    }
}

impl From<ModelPresentation> for Value {
    fn from(presentation: ModelPresentation) -> Self {
        Value::Presentation(Presentation::Model(Rc::new(presentation)))
    }
}

/// Serializes a presentation as its flattened structure.
pub(crate) fn serialize_structure<S: serde::Serializer>(
    structure: Result<Structure>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    use serde::Serialize;
    structure
        .map_err(serde::ser::Error::custom)?
        .serialize(serializer)
}
