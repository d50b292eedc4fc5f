// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # Present: cached presentation objects over models, mappings and result sets
//!
//! This crate provides a presentation (view-model) layer that sits on top of an ORM. It
//! wraps raw model rows, nested mappings and database result sets into lazily computed,
//! cached and serializable *presentations* whose fields can be derived, transformed and
//! recursively wrapped before they are flattened into a plain structure for output.
//!
//! ## Core Concepts
//!
//! There are four presentation variants, one per kind of source:
//!
//! - [`DataPresentation`]: wraps a plain mapping ([`Fields`]).
//! - [`ModelPresentation`]: wraps one ORM-like object implementing [`Model`].
//! - [`CursorPresentation`]: wraps a database-style [`Cursor`], wrapping each model row.
//! - [`ListPresentation`]: wraps an in-memory sequence of rows. It is read-only.
//!
//! Data and model presentations share one field resolution engine. Asking for a field
//! runs a three stage pipeline:
//!
//! 1. **fetch**: the raw value comes from the computed-field registry of the presenter
//!    type (cached in a computed cache) or, failing that, straight from the source;
//! 2. **translate**: models, tagged mappings and associative mappings are wrapped into
//!    nested presentations, everything else goes through the field's [`Rule`] chain;
//! 3. **cache**: the result is memoized until the source is rebound or the cache cleared.
//!
//! Raw values are modelled by the closed sum type [`Value`], so the wrapping decision is a
//! single exhaustive match on the value's shape.
//!
//! ## Presenter Types
//!
//! What a presentation does with its fields is declared on a [`PresenterType`], registered
//! in a [`Registry`] under a logical name. The registry is also the lookup service that
//! maps logical names (for example `Blog\Post`) to presenter types, falling back to a base
//! type when nothing specialised is registered, and it holds the model constructors used to
//! build models from inbound mappings.
//!
//! ```rust
//! use present::{fields, Present, PresenterType, Registry, Rule, Value};
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     PresenterType::data("Greeting")
//!         .rule("lang", Rule::replace([("en", "English"), ("fr", "French")]))
//!         .field("shout", |this| {
//!             let text = this.get("text")?;
//!             Ok(Value::from(text.as_str().unwrap_or_default().to_uppercase()))
//!         }),
//! );
//! let present = Present::new(registry);
//!
//! let greeting = present.from_data("Greeting", fields! { "text" => "hello", "lang" => "fr" });
//! assert_eq!(greeting.get("lang").unwrap(), Value::from("French"));
//! assert_eq!(greeting.get("shout").unwrap(), Value::from("HELLO"));
//!
//! let structure = greeting.as_structure().unwrap();
//! assert_eq!(
//!     serde_json::Value::Object(structure),
//!     serde_json::json!({ "text": "hello", "lang": "French", "shout": "HELLO" })
//! );
//! ```
//!
//! ## Threading
//!
//! Presentations are single-threaded. Their caches are unsynchronized interior state owned
//! by each instance and nested presentations are shared through [`Rc`](std::rc::Rc), so
//! none of the presentation types are `Send` or `Sync`.
//!
//! ## Features
//!
//! - `chrono`: Enables [`Value::Timestamp`]. This feature is enabled by default.
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for [`Value`], useful for
//!   property-based testing.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use ahash::RandomState;

pub mod callback;
pub use callback::{Callback, Computed, Function, Method, Receiver, Rule};
pub mod cursor;
pub use cursor::{Cursor, Projection, ResultSet};
mod error;
pub use error::{Error, Result};
mod json;
/// Macros usable for tests and initialization
pub mod macros;
pub mod model;
pub use model::{EnumColumn, Enums, Model, ModelRef, Record};
pub mod names;
pub mod presentation;
pub use presentation::{
    CursorPresentation, DataPresentation, Engine, FieldSource, ListPresentation,
    ModelPresentation, Presentation, Structure,
};
mod present;
pub use present::Present;
pub mod registry;
pub use registry::{FieldKind, Kind, PresenterType, PresenterTypeBuilder, Registry, RegistryConfig};
#[cfg(any(test, feature = "arbitrary"))]
mod test_util;
mod value;
pub use value::{Fields, Value};

/// Hash map keyed by field names, using the crate's hasher.
pub(crate) type FieldMap<K, V> = std::collections::HashMap<K, V, RandomState>;

fn create_map<K, V>() -> FieldMap<K, V> {
    std::collections::HashMap::with_hasher(RandomState::default())
}
