// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Presenter types and the registry that names them.
//!
//! A [`PresenterType`] declares everything a presentation does beyond reading its source:
//! the rule chain of each field, the computed fields, and the instance and static methods
//! that `this::`, `self::` and `Type::` callbacks resolve to. Presenter types are built once
//! with a [`PresenterTypeBuilder`] and registered in a [`Registry`], which derives their
//! full name from a logical one:
//!
//! ```rust
//! # use present::{Kind, PresenterType, Registry};
//! let mut registry = Registry::new();
//! let post = registry.register(PresenterType::model("Blog\\Post"));
//! assert_eq!(post.name(), "Blog\\Presentation_Model_Post");
//!
//! // lookups by logical name fall back to the base type of the kind
//! assert_eq!(registry.resolve_kind(Kind::Model, Some("Blog\\Post")).name(), post.name());
//! assert_eq!(registry.resolve_kind(Kind::Model, Some("Blog\\Tag")).name(), "Presentation_Model");
//! ```
use crate::{
    FieldMap, FieldSource, Model, Result, Value,
    callback::{self, Args, Callback, Computed, Function, Method, Rule},
    create_map, names,
};
use ahash::RandomState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fmt, rc::Rc};
use tracing::debug;

/// Which kind of source a presenter type presents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Data,
    Model,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Data => "Data",
            Kind::Model => "Model",
        }
    }
}

/// How a field of a presenter type is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Read from the source and returned as is.
    Direct,
    /// Produced by a computed-field descriptor.
    Computed,
    /// Read from the source and passed through `steps` rules.
    RuleChain { steps: usize },
}

/// Naming conventions of a [`Registry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Leading part of every presenter type name.
    pub class_prefix: String,
    /// Optional context, placed between the class prefix and the kind.
    pub context: String,
    /// Prefix of model class names, stripped to find a model's presenter type.
    pub model_prefix: String,
    /// Reserved mapping key naming the model to build from the mapping.
    pub model_key: String,
    /// Reserved mapping key naming the presenter type of a data mapping.
    pub data_key: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            class_prefix: "Presentation".to_owned(),
            context: String::new(),
            model_prefix: "Model_".to_owned(),
            model_key: "_model".to_owned(),
            data_key: "_presentation".to_owned(),
        }
    }
}

impl RegistryConfig {
    /// The prefix of presenter types of `kind`, like `Presentation_Admin_Model_`.
    ///
    /// Empty parts are skipped.
    pub fn full_prefix(&self, kind: Kind) -> String {
        let parts = [self.class_prefix.as_str(), self.context.as_str(), kind.name()];
        let mut prefix = parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_");
        prefix.push('_');
        prefix
    }
}

/// The declarations shared by every presentation of one type.
pub struct PresenterType {
    name: String,
    logical: Option<String>,
    kind: Kind,
    rules: FieldMap<String, Vec<Rule>>,
    fields: IndexMap<String, Computed, RandomState>,
    methods: FieldMap<String, Method>,
    statics: FieldMap<String, Function>,
}

impl PresenterType {
    /// Starts declaring a data presenter type with the given logical name.
    pub fn data(logical: impl Into<String>) -> PresenterTypeBuilder {
        PresenterTypeBuilder::new(Kind::Data, logical.into())
    }

    /// Starts declaring a model presenter type with the given logical name.
    pub fn model(logical: impl Into<String>) -> PresenterTypeBuilder {
        PresenterTypeBuilder::new(Kind::Model, logical.into())
    }

    fn base(name: String, kind: Kind) -> Self {
        Self {
            name,
            logical: None,
            kind,
            rules: create_map(),
            fields: IndexMap::default(),
            methods: create_map(),
            statics: create_map(),
        }
    }

    /// Full name, including namespace and prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logical name this type was registered under. `None` for base types.
    pub fn logical_name(&self) -> Option<&str> {
        self.logical.as_deref()
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The rule chain of a field, in application order.
    pub fn rules(&self, field: &str) -> &[Rule] {
        self.rules.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn computed(&self, field: &str) -> Option<&Computed> {
        self.fields.get(field)
    }

    /// Names of the computed fields, in declaration order.
    pub fn computed_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn static_fn(&self, name: &str) -> Option<&Function> {
        self.statics.get(name)
    }

    pub fn describe(&self, field: &str) -> FieldKind {
        if self.fields.contains_key(field) {
            return FieldKind::Computed;
        }
        match self.rules(field).len() {
            0 => FieldKind::Direct,
            steps => FieldKind::RuleChain { steps },
        }
    }
}

impl fmt::Debug for PresenterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`PresenterType`]s, see [`Registry::register`].
#[must_use]
pub struct PresenterTypeBuilder {
    kind: Kind,
    logical: String,
    rules: FieldMap<String, Vec<Rule>>,
    fields: IndexMap<String, Computed, RandomState>,
    methods: FieldMap<String, Method>,
    statics: FieldMap<String, Function>,
}

impl PresenterTypeBuilder {
    fn new(kind: Kind, logical: String) -> Self {
        Self {
            kind,
            logical,
            rules: create_map(),
            fields: IndexMap::default(),
            methods: create_map(),
            statics: create_map(),
        }
    }

    /// Appends a rule to the chain of `field`.
    pub fn rule(mut self, field: &str, rule: Rule) -> Self {
        self.rules.entry(field.to_owned()).or_default().push(rule);
        self
    }

    /// Appends several rules to the chain of `field`.
    pub fn rules(mut self, field: &str, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.entry(field.to_owned()).or_default().extend(rules);
        self
    }

    /// Declares a computed field backed by a handler.
    ///
    /// The handler receives the presentation it is evaluated for.
    pub fn field<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&dyn FieldSource) -> Result<Value> + 'static,
    {
        let method: Method = Rc::new(move |source: &dyn FieldSource, _: &[Value]| handler(source));
        self.fields.insert(name.to_owned(), Computed::Method(method));
        self
    }

    /// Declares a computed field backed by a callback with fixed arguments.
    pub fn field_callback(
        mut self,
        name: &str,
        callback: impl Into<Callback>,
        args: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.fields.insert(
            name.to_owned(),
            Computed::Callback {
                callback: callback.into(),
                args: args.into_iter().collect::<Args>(),
            },
        );
        self
    }

    /// Declares an instance method, reachable as `this::name`.
    pub fn method<F>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(&dyn FieldSource, &[Value]) -> Result<Value> + 'static,
    {
        self.methods.insert(name.to_owned(), Rc::new(method));
        self
    }

    /// Declares a static method, reachable as `self::name` or `Full_Type_Name::name`.
    pub fn static_fn<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.statics.insert(name.to_owned(), Rc::new(f));
        self
    }

    fn build(self, name: String) -> PresenterType {
        PresenterType {
            name,
            logical: Some(self.logical),
            kind: self.kind,
            rules: self.rules,
            fields: self.fields,
            methods: self.methods,
            statics: self.statics,
        }
    }
}

type ModelFactory = Rc<dyn Fn() -> Box<dyn Model>>;

/// Lookup service for presenter types, model constructors and free functions.
pub struct Registry {
    config: RegistryConfig,
    types: FieldMap<String, Rc<PresenterType>>,
    data_base: Rc<PresenterType>,
    model_base: Rc<PresenterType>,
    models: FieldMap<String, ModelFactory>,
    functions: FieldMap<String, Function>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let base = |kind| {
            let prefix = config.full_prefix(kind);
            Rc::new(PresenterType::base(
                prefix.trim_end_matches('_').to_owned(),
                kind,
            ))
        };
        let (data_base, model_base) = (base(Kind::Data), base(Kind::Model));

        let mut types = create_map();
        types.insert(data_base.name.clone(), Rc::clone(&data_base));
        types.insert(model_base.name.clone(), Rc::clone(&model_base));

        let mut functions: FieldMap<String, Function> = create_map();
        functions.insert("replace".to_owned(), Rc::new(callback::replace));

        Self {
            config,
            types,
            data_base,
            model_base,
            models: create_map(),
            functions,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers a presenter type under its logical name and returns it.
    ///
    /// A type registered again under the same logical name replaces the earlier one.
    pub fn register(&mut self, builder: PresenterTypeBuilder) -> Rc<PresenterType> {
        let prefix = self.config.full_prefix(builder.kind);
        let name = names::add_class_prefix(&builder.logical, &prefix);
        debug!(%name, kind = builder.kind.name(), "registering presenter type");
        let presenter = Rc::new(builder.build(name.clone()));
        self.types.insert(name, Rc::clone(&presenter));
        presenter
    }

    /// Looks up the presenter type named `logical` with `prefix` applied to its class part.
    pub fn resolve(&self, logical: &str, prefix: &str) -> Option<Rc<PresenterType>> {
        self.type_named(&names::add_class_prefix(logical, prefix))
    }

    /// Resolves a presenter type of `kind`, falling back to the kind's base type.
    pub fn resolve_kind(&self, kind: Kind, logical: Option<&str>) -> Rc<PresenterType> {
        if let Some(logical) = logical {
            if let Some(presenter) = self.resolve(logical, &self.config.full_prefix(kind)) {
                return presenter;
            }
            debug!(logical, kind = kind.name(), "no presenter type, using base type");
        }
        Rc::clone(self.base(kind))
    }

    /// Resolves the presenter type of a model from its class name.
    pub fn resolve_model(&self, model: &dyn Model) -> Rc<PresenterType> {
        let logical = names::remove_class_prefix(model.class_name(), &self.config.model_prefix);
        self.resolve_kind(Kind::Model, Some(&logical))
    }

    /// The base presenter type of a kind, which declares nothing.
    pub fn base(&self, kind: Kind) -> &Rc<PresenterType> {
        match kind {
            Kind::Data => &self.data_base,
            Kind::Model => &self.model_base,
        }
    }

    /// Looks up a presenter type by its full name.
    pub fn type_named(&self, name: &str) -> Option<Rc<PresenterType>> {
        self.types.get(name).cloned()
    }

    /// Registers the constructor of the model named `name`.
    ///
    /// Models are built through it when a mapping tagged with the model key is presented.
    pub fn register_model<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Model> + 'static,
    {
        self.models.insert(name.to_owned(), Rc::new(factory));
    }

    pub fn create_model(&self, name: &str) -> Result<Box<dyn Model>> {
        let factory = self
            .models
            .get(name)
            .ok_or_else(|| crate::Error::UnknownModel {
                name: name.to_owned(),
            })?;
        Ok(factory())
    }

    /// Registers a free function, callable by its bare name.
    pub fn register_function<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.functions.insert(name.to_owned(), Rc::new(f));
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types = self.types.keys().collect::<Vec<_>>();
        types.sort();
        let mut models = self.models.keys().collect::<Vec<_>>();
        models.sort();
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("types", &types)
            .field("models", &models)
            .finish_non_exhaustive()
    }
}
