// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{Engine, FieldSource, Structure, flatten, serialize_structure, translate_shape};
use crate::{Fields, Kind, PresenterType, Registry, Result, Value};
use std::{fmt, rc::Rc};

/// Presentation of a plain mapping.
///
/// Fields are read with [`Fields::path`], so `author.name` reaches into nested mappings.
/// Missing fields resolve to [`Value::Absent`].
///
/// ```rust
/// # use present::{fields, DataPresentation, Registry, Value};
/// # use std::rc::Rc;
/// let data = DataPresentation::new(Rc::new(Registry::new()))
///     .with_source(fields! { "author" => fields! { "name" => "Ann" } });
/// assert_eq!(data.get("author.name").unwrap(), Value::from("Ann"));
/// assert!(data.get("author").unwrap().as_presentation().is_some());
/// assert_eq!(data.get("missing").unwrap(), Value::Absent);
/// ```
pub struct DataPresentation {
    engine: Engine,
    source: Fields,
}

impl DataPresentation {
    /// An empty presentation of the base data type.
    pub fn new(registry: Rc<Registry>) -> Self {
        Self::resolve(registry, None)
    }

    /// An empty presentation of the data type registered as `name`, or of the base type.
    pub fn resolve(registry: Rc<Registry>, name: Option<&str>) -> Self {
        let presenter = registry.resolve_kind(Kind::Data, name);
        Self::with_presenter(registry, presenter)
    }

    pub fn with_presenter(registry: Rc<Registry>, presenter: Rc<PresenterType>) -> Self {
        Self {
            engine: Engine::new(registry, presenter),
            source: Fields::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Fields) -> Self {
        self.set_source(source);
        self
    }

    /// Replaces the source, dropping every cached value.
    pub fn set_source(&mut self, source: Fields) -> &mut Self {
        self.engine.clear();
        self.source = source;
        self
    }

    pub fn source(&self) -> &Fields {
        &self.source
    }

    pub fn as_source(&self) -> &dyn FieldSource {
        self
    }

    pub fn presenter_type(&self) -> &Rc<PresenterType> {
        self.engine.presenter_type()
    }

    /// Resolves a field through the presenter type's computed fields and rules.
    pub fn get(&self, field: &str) -> Result<Value> {
        self.as_source().get(field)
    }

    pub fn raw(&self, field: &str) -> Result<Value> {
        self.as_source().raw(field)
    }

    /// Same as [`raw`](Self::raw).
    pub fn original(&self, field: &str) -> Result<Value> {
        self.as_source().raw(field)
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
}

impl FieldSource for DataPresentation {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn value(&self, field: &str) -> Result<Value> {
        Ok(self.source.path(field).cloned().unwrap_or_default())
    }

    fn basic_structure(&self) -> Result<Structure> {
        let registry = self.engine.registry();
        let mut structure = Structure::new();
        for field in self.source.keys() {
            let value = self.get(field)?;
            structure.insert(field.to_owned(), flatten(registry, &value)?);
        }
        Ok(structure)
    }

    fn translate_field(&self, field: &str, raw: Value) -> Result<Value> {
        translate_shape(self, field, raw)
    }

    fn has_field(&self, field: &str) -> bool {
        self.source.path(field).is_some() || self.presenter_type().computed(field).is_some()
    }
}

impl fmt::Debug for DataPresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPresentation")
            .field("presenter", &self.presenter_type().name())
            .field("source", &self.source)
            .finish()
    }
}

impl serde::Serialize for DataPresentation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_structure(self.as_structure(), serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Record, Rule, fields};
    use std::cell::Cell;

    fn registry() -> Rc<Registry> {
        let mut registry = Registry::new();
        registry.register(
            PresenterType::data("Person")
                .rule("gender", Rule::replace([("m", "male"), ("f", "female")]))
                .rule("gender", Rule::map(|v| Ok(Value::from(format!("<{v}>")))))
                .field("full_name", |this| {
                    let first = this.get("first")?;
                    let last = this.get("last")?;
                    Ok(Value::from(format!("{first} {last}")))
                }),
        );
        Rc::new(registry)
    }

    #[test]
    fn rules_apply_in_order() {
        let person = DataPresentation::resolve(registry(), Some("Person"))
            .with_source(fields! { "gender" => "f", "first" => "A", "last" => "B" });
        assert_eq!(person.get("gender").unwrap(), Value::from("<female>"));
        assert_eq!(person.raw("gender").unwrap(), Value::from("f"));
        assert_eq!(person.get("full_name").unwrap(), Value::from("A B"));
        assert_eq!(person.raw("full_name").unwrap(), Value::from("A B"));
    }

    #[test]
    fn unknown_name_falls_back_to_base_type() {
        let data = DataPresentation::resolve(registry(), Some("Nobody"));
        assert_eq!(data.presenter_type().name(), "Presentation_Data");
    }

    #[test]
    fn set_source_clears_caches() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut registry = Registry::new();
        registry.register(PresenterType::data("Counter").field("n", move |this| {
            counter.set(counter.get() + 1);
            this.get("base")
        }));
        let mut data = DataPresentation::resolve(Rc::new(registry), Some("Counter"))
            .with_source(fields! { "base" => 1 });

        assert_eq!(data.get("n").unwrap(), Value::from(1));
        assert_eq!(data.get("n").unwrap(), Value::from(1));
        assert_eq!(calls.get(), 1);

        data.set_source(fields! { "base" => 2 });
        assert_eq!(data.get("n").unwrap(), Value::from(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn nested_values_are_wrapped_by_shape() {
        let mut registry = Registry::new();
        registry.register(PresenterType::data("Tag"));
        registry.register_model("Post", || Box::new(Record::new("Model_Post")));
        let data = DataPresentation::new(Rc::new(registry)).with_source(fields! {
            "tag" => fields! { "_presentation" => "Tag", "name" => "rust" },
            "plain" => fields! { "a" => 1 },
            "list" => vec![1, 2],
            "seq" => crate::Fields::from_sequence([Value::from(1)]),
            "post" => fields! { "_model" => "Post", "title" => "Hi" },
            "model" => Record::new("Model_Post").into_ref(),
        });

        let tag = data.get("tag").unwrap();
        let tag = tag.as_presentation().unwrap();
        assert_eq!(tag.presenter_type().name(), "Presentation_Data_Tag");
        assert_eq!(tag.get("_presentation").unwrap(), Value::Absent);

        let plain = data.get("plain").unwrap();
        assert_eq!(plain.as_presentation().unwrap().presenter_type().name(), "Presentation_Data");

        assert_eq!(data.get("list").unwrap(), Value::from(vec![1, 2]));
        assert!(matches!(data.get("seq").unwrap(), Value::Map(_)));

        let post = data.get("post").unwrap();
        let post = post.as_presentation().unwrap().as_model().unwrap();
        assert_eq!(post.model().unwrap().get("title"), Value::from("Hi"));
        assert_eq!(post.get("_model").unwrap(), Value::Absent);

        assert!(data.get("model").unwrap().as_presentation().unwrap().as_model().is_some());
    }

    #[test]
    fn unknown_model_tag_fails() {
        let data = DataPresentation::new(Rc::new(Registry::new()))
            .with_source(fields! { "post" => fields! { "_model" => "Post" } });
        assert_eq!(
            data.get("post").unwrap_err(),
            Error::UnknownModel { name: "Post".into() }
        );
    }

    #[test]
    fn non_string_model_tags_are_stripped() {
        let data = DataPresentation::new(Rc::new(Registry::new())).with_source(fields! {
            "odd" => fields! { "_model" => 5, "a" => 1 },
            "empty" => fields! { "_model" => "", "b" => 2 },
        });
        let odd = data.get("odd").unwrap();
        let odd = odd.as_presentation().unwrap().as_data().unwrap();
        assert!(!odd.source().contains_key("_model"));
        assert_eq!(
            serde_json::Value::Object(data.as_structure().unwrap()),
            serde_json::json!({ "odd": { "a": 1 }, "empty": { "b": 2 } })
        );
    }

    #[quickcheck]
    fn scalars_pass_through(value: Value) -> bool {
        if value.is_compound() {
            return true;
        }
        let data = DataPresentation::new(Rc::new(Registry::new()))
            .with_source(fields! { "field" => value.clone() });
        data.get("field").unwrap() == value && data.raw("field").unwrap() == value
    }

    #[quickcheck]
    fn get_is_idempotent(value: Value) -> bool {
        let data = DataPresentation::new(Rc::new(Registry::new()))
            .with_source(fields! { "field" => value });
        // presentations compare by identity, so wrapped values must come from the cache
        data.get("field").unwrap() == data.get("field").unwrap()
    }

    #[test]
    fn structure_flattens_nested_presentations() {
        let person = DataPresentation::resolve(registry(), Some("Person")).with_source(fields! {
            "first" => "A",
            "last" => "B",
            "address" => fields! { "city" => "Berlin" },
        });
        let structure = serde_json::Value::Object(person.as_structure().unwrap());
        assert_eq!(
            structure,
            serde_json::json!({
                "first": "A",
                "last": "B",
                "address": { "city": "Berlin" },
                "full_name": "A B",
            })
        );
        assert_eq!(serde_json::to_value(&person).unwrap(), structure);
    }
}
