// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Error types for the presentation layer.
//!
//! Every error is fatal at the point where it occurs and propagates to the caller: a failed
//! field aborts the whole [`get`](crate::DataPresentation::get) or
//! [`as_structure`](crate::DataPresentation::as_structure) call. The one lenient path is a
//! lookup of a missing key, which resolves to [`Value::Absent`](crate::Value::Absent)
//! instead of raising.
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving, wrapping or flattening presented values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operation that needs a bound cursor or model ran before one was attached.
    #[error("{kind} can not be empty, bind one before using the presentation")]
    UnboundSource { kind: &'static str },

    /// `make` was called on a model presentation that already wraps a model.
    #[error("model {model} already exists")]
    AlreadyBound { model: String },

    /// The raw model behind a field was requested through `original`.
    #[error("no direct access to original model {model} from presentation")]
    DirectModelAccess { model: String },

    /// A read-only collection was asked to assign or remove an element.
    #[error("calculated results are read-only")]
    ReadOnly,

    /// A callback named by a rule or computed field could not be resolved or failed.
    #[error("can not invoke {callback}: {reason}")]
    Invocation { callback: String, reason: String },

    /// No model constructor is registered under the given logical name.
    #[error("no model registered as {name}")]
    UnknownModel { name: String },

    /// A keyed projection met a row that has no fields to read the key from.
    #[error("row {position} is a scalar and can not be keyed")]
    NotPresentable { position: usize },
}

impl Error {
    /// Shorthand for an [`Error::Invocation`] raised by user supplied handlers.
    pub fn invocation(callback: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invocation {
            callback: callback.into(),
            reason: reason.into(),
        }
    }
}
