// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Callbacks used by rules and computed fields.
//!
//! A [`Callback`] names a transformation in one of three ways: as a function value, as a
//! `Type::method` reference resolved against the presenter type of the calling
//! presentation, or as the name of a free function registered on the
//! [`Registry`](crate::Registry). Rules are callbacks that receive the value being
//! transformed as their leading argument; computed fields are callbacks (or instance
//! methods) that receive only their fixed arguments.
use crate::{Error, FieldSource, Fields, Result, Value};
use smallvec::SmallVec;
use std::{fmt, rc::Rc};
use tracing::trace;

/// A free or static function.
pub type Function = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// An instance method, called with the presentation it is bound to.
pub type Method = Rc<dyn Fn(&dyn FieldSource, &[Value]) -> Result<Value>>;

/// Fixed callback arguments. Most rules carry at most a mapping or two.
pub type Args = SmallVec<[Value; 2]>;

/// The type a `Type::method` callback is resolved against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Receiver {
    /// `this::method`: an instance method bound to the calling presentation, or failing
    /// that a static of its presenter type.
    This,
    /// `self::method`: a static of the calling presentation's presenter type.
    SelfType,
    /// `Some_Type::method`: a static of the presenter type registered under that full name.
    Type(String),
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::This => write!(f, "this"),
            Receiver::SelfType => write!(f, "self"),
            Receiver::Type(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Clone)]
pub enum Callback {
    Fn(Function),
    Method { receiver: Receiver, name: String },
    /// A free function registered on the registry.
    Function(String),
}

impl Callback {
    /// Wraps a closure.
    pub fn function(f: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Callback::Fn(Rc::new(f))
    }
}

/// Parses `this::m`, `self::m` (both case-insensitive), `Type::m` or a bare function name.
///
/// A `::` at the very start does not name a type, so `::m` is a free function.
impl From<&str> for Callback {
    fn from(text: &str) -> Self {
        match text.find("::") {
            Some(at) if at > 0 => {
                let (class, method) = (&text[..at], &text[at + 2..]);
                let receiver = if class.eq_ignore_ascii_case("this") {
                    Receiver::This
                } else if class.eq_ignore_ascii_case("self") {
                    Receiver::SelfType
                } else {
                    Receiver::Type(class.to_owned())
                };
                Callback::Method {
                    receiver,
                    name: method.to_owned(),
                }
            }
            _ => Callback::Function(text.to_owned()),
        }
    }
}

impl From<String> for Callback {
    fn from(text: String) -> Self {
        Callback::from(text.as_str())
    }
}

impl From<Function> for Callback {
    fn from(f: Function) -> Self {
        Callback::Fn(f)
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Fn(_) => write!(f, "{{closure}}"),
            Callback::Method { receiver, name } => write!(f, "{receiver}::{name}"),
            Callback::Function(name) => write!(f, "{name}"),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({self})")
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callback::Fn(a), Callback::Fn(b)) => Rc::ptr_eq(a, b),
            (
                Callback::Method { receiver, name },
                Callback::Method {
                    receiver: r,
                    name: n,
                },
            ) => receiver == r && name == n,
            (Callback::Function(a), Callback::Function(b)) => a == b,
            _ => false,
        }
    }
}

/// Invokes `callback` with `args` on behalf of `source`.
///
/// Fails with [`Error::Invocation`] if the callback names a method, type or function that
/// does not exist, and propagates whatever the target itself fails with.
pub fn invoke(source: &dyn FieldSource, callback: &Callback, args: &[Value]) -> Result<Value> {
    match callback {
        Callback::Fn(f) => f(args),
        Callback::Method { receiver, name } => {
            let current = source.presenter_type();
            match receiver {
                Receiver::This => {
                    if let Some(method) = current.method(name) {
                        return method(source, args);
                    }
                    let f = current.static_fn(name).ok_or_else(|| {
                        Error::invocation(
                            callback.to_string(),
                            format!("{} has no method {name}", current.name()),
                        )
                    })?;
                    f(args)
                }
                Receiver::SelfType => {
                    let f = current.static_fn(name).ok_or_else(|| {
                        Error::invocation(
                            callback.to_string(),
                            format!("{} has no static method {name}", current.name()),
                        )
                    })?;
                    f(args)
                }
                Receiver::Type(type_name) => {
                    let target = source.registry().type_named(type_name).ok_or_else(|| {
                        Error::invocation(callback.to_string(), "no such presenter type")
                    })?;
                    let f = target.static_fn(name).ok_or_else(|| {
                        Error::invocation(
                            callback.to_string(),
                            format!("{type_name} has no static method {name}"),
                        )
                    })?;
                    f(args)
                }
            }
        }
        Callback::Function(name) => {
            let f = source
                .registry()
                .function(name)
                .ok_or_else(|| Error::invocation(name.as_str(), "no such function"))?;
            f(args)
        }
    }
}

/// Invokes `callback` with `value` followed by `extra`.
pub fn invoke_with_leading_value(
    source: &dyn FieldSource,
    value: Value,
    callback: &Callback,
    extra: &[Value],
) -> Result<Value> {
    let mut args = Args::with_capacity(extra.len() + 1);
    args.push(value);
    args.extend(extra.iter().cloned());
    invoke(source, callback, &args)
}

/// One step of a field's transformation chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    callback: Callback,
    args: Args,
}

impl Rule {
    pub fn new(callback: impl Into<Callback>) -> Self {
        Self {
            callback: callback.into(),
            args: Args::new(),
        }
    }

    pub fn with_args(callback: impl Into<Callback>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            callback: callback.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Appends a fixed argument, passed after the value being transformed.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// A rule applying `f` to the value.
    pub fn map(f: impl Fn(Value) -> Result<Value> + 'static) -> Self {
        Self::new(Callback::function(move |args| {
            f(args.first().cloned().unwrap_or_default())
        }))
    }

    /// A rule that substitutes values found in `pairs`, leaving any other value unchanged.
    ///
    /// ```rust
    /// # use present::{Rule, Value};
    /// let rule = Rule::replace([("m", "male"), ("f", "female")]);
    /// # let _ = rule;
    /// ```
    pub fn replace<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mapping: Fields = pairs.into_iter().collect();
        Self::map(move |value| Ok(replace_with(value, &mapping)))
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Runs this rule on `value`.
    pub fn apply(&self, source: &dyn FieldSource, value: Value) -> Result<Value> {
        trace!(callback = %self.callback, "applying rule");
        invoke_with_leading_value(source, value, &self.callback, &self.args)
    }
}

/// How a computed field obtains its raw value.
#[derive(Clone)]
pub enum Computed {
    /// An instance method of the presenter type, called without arguments.
    Method(Method),
    /// A callback called with fixed arguments.
    Callback { callback: Callback, args: Args },
}

impl Computed {
    pub fn evaluate(&self, source: &dyn FieldSource) -> Result<Value> {
        match self {
            Computed::Method(handler) => handler(source, &[]),
            Computed::Callback { callback, args } => invoke(source, callback, args),
        }
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Method(_) => write!(f, "Method"),
            Computed::Callback { callback, args } => f
                .debug_struct("Callback")
                .field("callback", callback)
                .field("args", args)
                .finish(),
        }
    }
}

fn replace_with(value: Value, mapping: &Fields) -> Value {
    if value.is_compound() {
        return value;
    }
    match mapping.get(&value.to_key()) {
        Some(replacement) => replacement.clone(),
        None => value,
    }
}

/// The built-in `replace` function: `replace(value, mapping)`.
pub(crate) fn replace(args: &[Value]) -> Result<Value> {
    match args {
        [value, Value::Map(mapping), ..] => Ok(replace_with(value.clone(), mapping)),
        [_, other, ..] => Err(Error::invocation(
            "replace",
            format!("expected a mapping of replacements, got {}", other.type_name()),
        )),
        [value] => Ok(value.clone()),
        [] => Ok(Value::Absent),
    }
}
