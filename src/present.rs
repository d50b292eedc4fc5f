// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::{
    Cursor, CursorPresentation, DataPresentation, Fields, ListPresentation, ModelPresentation,
    ModelRef, Registry, Value,
};
use std::rc::Rc;

/// Entry point for creating presentations.
///
/// `Present` owns a shared handle to the [`Registry`]; every presentation it creates, and
/// every presentation those create while wrapping nested values, resolves its presenter type
/// against that registry.
#[derive(Clone, Debug, Default)]
pub struct Present {
    registry: Rc<Registry>,
}

impl Present {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Rc::new(registry),
        }
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// Presents a model with the presenter type matching its class name.
    pub fn from_model(&self, model: impl Into<ModelRef>) -> ModelPresentation {
        ModelPresentation::from_model(Rc::clone(&self.registry), model.into())
    }

    /// Presents a mapping with the data type registered as `name`, or the base data type.
    pub fn from_data(&self, name: &str, data: Fields) -> DataPresentation {
        DataPresentation::resolve(Rc::clone(&self.registry), Some(name)).with_source(data)
    }

    pub fn from_cursor(&self, rows: impl Cursor + 'static) -> CursorPresentation {
        CursorPresentation::new(Rc::clone(&self.registry)).with_rows(rows)
    }

    pub fn from_list(&self, rows: Vec<Value>) -> ListPresentation {
        ListPresentation::new(Rc::clone(&self.registry), rows)
    }
}

impl From<Rc<Registry>> for Present {
    fn from(registry: Rc<Registry>) -> Self {
        Self { registry }
    }
}
