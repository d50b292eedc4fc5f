// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The ORM model collaborator.
//!
//! A [`ModelPresentation`](crate::ModelPresentation) never talks to a database: it reads
//! columns, enum metadata and related models through the [`Model`] trait. [`Record`] is an
//! in-memory implementation, handy for tests and for models built from inbound mappings.
use crate::{Fields, Value};
use ahash::RandomState;
use indexmap::IndexMap;
use std::{collections::HashMap, fmt, rc::Rc};

/// Shared handle to a model.
pub type ModelRef = Rc<dyn Model>;

/// Enum metadata of a model, keyed by the pluralized column name (`status` → `statuses`).
pub type Enums = HashMap<String, EnumColumn, RandomState>;

/// A column whose values are restricted to a fixed set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumColumn {
    /// The column holding the actual value.
    pub column: String,
    /// The allowed values, in declaration order.
    pub values: Vec<String>,
}

/// An ORM-like object that can be presented.
pub trait Model: fmt::Debug {
    /// Class name of the model, like `Model_Blog_Post`.
    ///
    /// The configured model prefix is stripped from it to find the presenter type.
    fn class_name(&self) -> &str;

    /// Returns the value of a column, a related model or an enum's allowed values.
    ///
    /// Missing columns give [`Value::Absent`].
    fn get(&self, column: &str) -> Value;

    /// Returns true if `column` is a column, a relation or an enum of this model.
    fn has(&self, column: &str) -> bool;

    fn enums(&self) -> &Enums;

    /// Related models that are loaded, by relation name.
    fn related(&self) -> Vec<(String, ModelRef)>;

    /// Raw column values, in column order.
    fn object(&self) -> Fields;

    /// Assigns values to columns without any validation or filtering.
    fn force_values(&mut self, values: Fields);
}

/// In-memory [`Model`].
///
/// ```rust
/// # use present::{Model, Record, Value};
/// let post = Record::new("Model_Post")
///     .with("title", "Hello")
///     .with_enum("status", ["draft", "published"]);
/// assert_eq!(post.get("title"), Value::from("Hello"));
/// assert!(post.has("statuses"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Record {
    class_name: String,
    columns: Fields,
    related: IndexMap<String, ModelRef, RandomState>,
    enums: Enums,
}

impl Record {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Sets a column value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column, value);
        self
    }

    /// Declares an enum column.
    ///
    /// The enum is registered under the plural of the column name, so `status` is listed as
    /// `statuses`. The column itself is created with a null value if it does not exist yet.
    pub fn with_enum<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.columns.contains_key(column) {
            self.columns.insert(column, Value::Null);
        }
        self.enums.insert(
            pluralize(column),
            EnumColumn {
                column: column.to_owned(),
                values: values.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Attaches a related model.
    pub fn with_related(mut self, name: impl Into<String>, model: impl Into<ModelRef>) -> Self {
        self.related.insert(name.into(), model.into());
        self
    }

    pub fn into_ref(self) -> ModelRef {
        Rc::new(self)
    }
}

impl From<Record> for ModelRef {
    fn from(record: Record) -> Self {
        record.into_ref()
    }
}

impl Model for Record {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn get(&self, column: &str) -> Value {
        if let Some(e) = self.enums.get(column) {
            return Value::Map(
                e.values
                    .iter()
                    .map(|value| (value.as_str(), value.as_str()))
                    .collect(),
            );
        }
        if let Some(model) = self.related.get(column) {
            return Value::Model(Rc::clone(model));
        }
        self.columns.get(column).cloned().unwrap_or_default()
    }

    fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
            || self.related.contains_key(column)
            || self.enums.contains_key(column)
    }

    fn enums(&self) -> &Enums {
        &self.enums
    }

    fn related(&self) -> Vec<(String, ModelRef)> {
        self.related
            .iter()
            .map(|(name, model)| (name.clone(), Rc::clone(model)))
            .collect()
    }

    fn object(&self) -> Fields {
        self.columns.clone()
    }

    fn force_values(&mut self, values: Fields) {
        self.columns.extend(values);
    }
}

/// English plural of a column name.
fn pluralize(name: &str) -> String {
    let lower = name.to_lowercase();
    let before_last = lower.chars().rev().nth(1);
    let is_consonant = |c: Option<char>| c.is_some_and(|c| !"aeiou".contains(c));

    if ["s", "sh", "ch", "x"].iter().any(|end| lower.ends_with(end)) {
        return format!("{name}es");
    }
    if lower.ends_with('y') && is_consonant(before_last) {
        return format!("{}ies", &name[..name.len() - 1]);
    }
    if lower.ends_with('o') && is_consonant(before_last) {
        return format!("{name}es");
    }
    format!("{name}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plurals() {
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("type"), "types");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("hero"), "heroes");
        assert_eq!(pluralize("video"), "videos");
    }

    #[test]
    fn enum_lists_its_values() {
        let post = Record::new("Model_Post").with_enum("status", ["draft", "live"]);
        let e = &post.enums()["statuses"];
        assert_eq!(e.column, "status");
        assert_eq!(
            post.get("statuses"),
            Value::Map(crate::fields! { "draft" => "draft", "live" => "live" })
        );
        assert_eq!(post.get("status"), Value::Null);
    }

    #[test]
    fn related_models_are_shared() {
        let author = Record::new("Model_User").with("name", "Ann").into_ref();
        let post = Record::new("Model_Post").with_related("author", Rc::clone(&author));
        let Value::Model(got) = post.get("author") else {
            panic!("expected a model");
        };
        assert!(Rc::ptr_eq(&got, &author));
        assert!(post.has("author"));
        assert!(!post.object().contains_key("author"));
    }

    #[test]
    fn force_values_overwrites_and_appends() {
        let mut post = Record::new("Model_Post").with("title", "a");
        post.force_values(crate::fields! { "title" => "b", "body" => "c" });
        assert_eq!(post.get("title"), Value::from("b"));
        assert_eq!(post.object().keys().collect::<Vec<_>>(), ["title", "body"]);
        assert_eq!(post.get("missing"), Value::Absent);
    }
}
