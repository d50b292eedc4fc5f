// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{Engine, FieldSource, Structure, flatten, serialize_structure, translate_shape};
use crate::{Error, Fields, Kind, ModelRef, PresenterType, Registry, Result, Value};
use std::{fmt, rc::Rc};
use tracing::debug;

/// Presentation of a single [`Model`](crate::Model).
///
/// A model presentation is either bound to a model right away, see
/// [`from_model`](Self::from_model), or created empty for a logical model name and bound
/// later with [`make`](Self::make), which builds the model through the registry.
pub struct ModelPresentation {
    engine: Engine,
    model: Option<ModelRef>,
    model_name: Option<String>,
}

impl ModelPresentation {
    /// An unbound presentation of the base model type.
    pub fn new(registry: Rc<Registry>) -> Self {
        let presenter = Rc::clone(registry.base(Kind::Model));
        Self {
            engine: Engine::new(registry, presenter),
            model: None,
            model_name: None,
        }
    }

    /// Presents `model` with the presenter type found from its class name.
    pub fn from_model(registry: Rc<Registry>, model: ModelRef) -> Self {
        let presenter = registry.resolve_model(&*model);
        Self {
            engine: Engine::new(registry, presenter),
            model: Some(model),
            model_name: None,
        }
    }

    /// An unbound presentation for the model registered as `name`.
    pub fn named(registry: Rc<Registry>, name: &str) -> Self {
        let presenter = registry.resolve_kind(Kind::Model, Some(name));
        Self {
            engine: Engine::new(registry, presenter),
            model: None,
            model_name: Some(name.to_owned()),
        }
    }

    /// Binds a model, dropping every cached value.
    pub fn set_model(&mut self, model: ModelRef) -> &mut Self {
        self.engine.clear();
        self.model = Some(model);
        self
    }

    pub fn model(&self) -> Result<&ModelRef> {
        self.model
            .as_ref()
            .ok_or(Error::UnboundSource { kind: "model" })
    }

    /// Builds the model of this presentation from `fields`.
    ///
    /// Fields that already hold a presentation are cached as is, the rest is assigned to
    /// the new model.
    pub fn make(&mut self, mut fields: Fields) -> Result<&mut Self> {
        if let Some(model) = &self.model {
            return Err(Error::AlreadyBound {
                model: model.class_name().to_owned(),
            });
        }
        let name = match (self.model_name.as_deref(), self.presenter_type().logical_name()) {
            (Some(name), _) | (None, Some(name)) => name.to_owned(),
            (None, None) => {
                return Err(Error::UnknownModel {
                    name: self.presenter_type().name().to_owned(),
                });
            }
        };
        let mut model = self.engine.registry().create_model(&name)?;
        debug!(model = %name, fields = fields.len(), "making model");
        self.engine.clear();

        let presented = fields
            .iter()
            .filter(|(_, value)| matches!(value, Value::Presentation(_)))
            .map(|(field, _)| field.to_owned())
            .collect::<Vec<_>>();
        for field in presented {
            if let Some(value) = fields.remove(&field) {
                self.engine.seed(field, value);
            }
        }
        model.force_values(fields);
        self.model = Some(Rc::from(model));
        Ok(self)
    }

    pub fn as_source(&self) -> &dyn FieldSource {
        self
    }

    pub fn presenter_type(&self) -> &Rc<PresenterType> {
        self.engine.presenter_type()
    }

    pub fn get(&self, field: &str) -> Result<Value> {
        self.as_source().get(field)
    }

    pub fn raw(&self, field: &str) -> Result<Value> {
        self.as_source().raw(field)
    }

    /// The raw value of a field. Fails for fields holding a model.
    pub fn original(&self, field: &str) -> Result<Value> {
        match self.raw(field)? {
            Value::Model(model) => Err(Error::DirectModelAccess {
                model: model.class_name().to_owned(),
            }),
            value => Ok(value),
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.has_field(field)
    }

    pub fn as_structure(&self) -> Result<Structure> {
        self.as_source().as_structure()
    }

    pub fn clear_cache(&self) {
        self.engine.clear();
    }

    /// Translates each member of an enum listing with the rules of its backing column.
    fn translate_enum(&self, column: &str, members: Value) -> Result<Value> {
        let source = self.as_source();
        match members {
            Value::Map(members) => members
                .into_iter()
                .map(|(key, member)| Ok((key, source.translate_value(column, member)?)))
                .collect::<Result<Fields>>()
                .map(Value::Map),
            Value::List(members) => members
                .into_iter()
                .map(|member| source.translate_value(column, member))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            other => Ok(other),
        }
    }
}

impl FieldSource for ModelPresentation {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn value(&self, field: &str) -> Result<Value> {
        Ok(self.model()?.get(field))
    }

    fn basic_structure(&self) -> Result<Structure> {
        let model = self.model()?;
        let registry = self.engine.registry();
        let mut structure = Structure::new();
        for (column, _) in model.object() {
            let value = self.get(&column)?;
            structure.insert(column, flatten(registry, &value)?);
        }
        for (column, related) in model.related() {
            let value = match self.get(&column)? {
                value @ Value::Presentation(_) => value,
                _ => Value::Model(related),
            };
            structure.insert(column, flatten(registry, &value)?);
        }
        Ok(structure)
    }

    fn translate_field(&self, field: &str, raw: Value) -> Result<Value> {
        if matches!(raw, Value::Map(_) | Value::List(_)) {
            let column = self
                .model
                .as_ref()
                .and_then(|model| model.enums().get(field))
                .map(|e| e.column.clone());
            if let Some(column) = column {
                return self.translate_enum(&column, raw);
            }
        }
        translate_shape(self, field, raw)
    }

    fn has_field(&self, field: &str) -> bool {
        self.model.as_ref().is_some_and(|model| model.has(field))
            || self.presenter_type().computed(field).is_some()
    }
}

impl fmt::Debug for ModelPresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPresentation")
            .field("presenter", &self.presenter_type().name())
            .field("model", &self.model)
            .finish()
    }
}

impl serde::Serialize for ModelPresentation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_structure(self.as_structure(), serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Model, Record, Rule, fields};

    fn registry() -> Rc<Registry> {
        let mut registry = Registry::new();
        registry.register(
            PresenterType::model("Post")
                .rule("status", Rule::replace([("draft", "Draft"), ("live", "Published")]))
                .field("summary", |this| {
                    let title = this.get("title")?;
                    Ok(Value::from(format!("{title}!")))
                }),
        );
        registry.register_model("Post", || Box::new(Record::new("Model_Post")));
        Rc::new(registry)
    }

    fn post() -> ModelRef {
        Record::new("Model_Post")
            .with("title", "Hello")
            .with("status", "live")
            .with_enum("status", ["draft", "live"])
            .with_related(
                "author",
                Record::new("Model_User").with("name", "Ann"),
            )
            .into_ref()
    }

    #[test]
    fn model_fields_follow_rules() {
        let presentation = ModelPresentation::from_model(registry(), post());
        assert_eq!(presentation.presenter_type().name(), "Presentation_Model_Post");
        assert_eq!(presentation.get("status").unwrap(), Value::from("Published"));
        assert_eq!(presentation.get("summary").unwrap(), Value::from("Hello!"));
        assert!(presentation.has("title"));
        assert!(presentation.has("summary"));
        assert!(!presentation.has("body"));
    }

    #[test]
    fn enums_expand_with_column_rules() {
        let presentation = ModelPresentation::from_model(registry(), post());
        assert_eq!(
            presentation.get("statuses").unwrap(),
            Value::Map(fields! { "draft" => "Draft", "live" => "Published" })
        );
    }

    #[test]
    fn original_refuses_models() {
        let presentation = ModelPresentation::from_model(registry(), post());
        assert_eq!(
            presentation.original("author").unwrap_err(),
            Error::DirectModelAccess {
                model: "Model_User".into()
            }
        );
        assert_eq!(presentation.original("title").unwrap(), Value::from("Hello"));
        let author = presentation.get("author").unwrap();
        assert_eq!(
            author.as_presentation().unwrap().get("name").unwrap(),
            Value::from("Ann")
        );
    }

    #[test]
    fn set_model_clears_caches() {
        let mut presentation = ModelPresentation::from_model(registry(), post());
        assert_eq!(presentation.get("status").unwrap(), Value::from("Published"));
        assert_eq!(presentation.get("summary").unwrap(), Value::from("Hello!"));

        presentation.set_model(
            Record::new("Model_Post")
                .with("title", "Bye")
                .with("status", "draft")
                .into_ref(),
        );
        assert_eq!(presentation.get("status").unwrap(), Value::from("Draft"));
        assert_eq!(presentation.get("summary").unwrap(), Value::from("Bye!"));
    }

    #[test]
    fn unbound_model_fails() {
        let presentation = ModelPresentation::new(registry());
        assert_eq!(
            presentation.get("title").unwrap_err(),
            Error::UnboundSource { kind: "model" }
        );
        assert!(presentation.as_structure().is_err());
        assert!(!presentation.has("title"));
    }

    #[test]
    fn make_builds_the_model_once() {
        let registry = registry();
        let tag = crate::DataPresentation::new(Rc::clone(&registry))
            .with_source(fields! { "name" => "rust" });
        let tag = Value::from(tag);

        let mut presentation = ModelPresentation::named(Rc::clone(&registry), "Post");
        presentation
            .make(fields! { "title" => "Made", "tag" => tag.clone() })
            .unwrap();
        let model = presentation.model().unwrap();
        assert_eq!(model.get("title"), Value::from("Made"));
        assert!(!model.has("tag"));
        assert_eq!(presentation.get("tag").unwrap(), tag);

        assert_eq!(
            presentation.make(fields! {}).unwrap_err(),
            Error::AlreadyBound {
                model: "Model_Post".into()
            }
        );
    }

    #[test]
    fn make_needs_a_known_model() {
        let mut presentation = ModelPresentation::new(registry());
        assert_eq!(
            presentation.make(fields! {}).unwrap_err(),
            Error::UnknownModel {
                name: "Presentation_Model".into()
            }
        );
        let mut presentation = ModelPresentation::named(registry(), "Tag");
        assert_eq!(
            presentation.make(fields! {}).unwrap_err(),
            Error::UnknownModel { name: "Tag".into() }
        );
    }

    #[test]
    fn structure_includes_related_models() {
        let presentation = ModelPresentation::from_model(registry(), post());
        let structure = serde_json::Value::Object(presentation.as_structure().unwrap());
        assert_eq!(
            structure,
            serde_json::json!({
                "title": "Hello",
                "status": "Published",
                "author": { "name": "Ann" },
                "summary": "Hello!",
            })
        );
    }
}
