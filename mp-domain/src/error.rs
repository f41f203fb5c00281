//! Error types for dispatch and actor construction

use crate::introspect::ParamKind;
use mp_meta::Meta;
use thiserror::Error;

/// Failure of a call
#[derive(Debug, Error)]
pub enum ActorError {
    /// No actor is registered for the (kind, method) pair
    #[error("Actor {method} for {kind} not found")]
    NotFound { method: String, kind: String },

    /// The actor exists but has no behavior for this call
    #[error("{method} is not supported for {kind}")]
    Unsupported { method: String, kind: String },

    /// An `Error` meta returned as failure
    #[error("{}", .0.error_message())]
    Meta(Meta),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActorError {
    pub fn not_found(method: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::NotFound {
            method: method.into(),
            kind: kind.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The failure as an `Error` meta.
    ///
    /// A carried error meta is returned as is; anything else becomes a new
    /// error meta with the given code.
    pub fn to_meta(&self, code: i64) -> Meta {
        match self {
            Self::Meta(m) if m.is_error() => m.clone(),
            Self::NotFound { method, kind } | Self::Unsupported { method, kind } => {
                Meta::ajax_error(code, self.to_string(), [("kind", kind.as_str())])
                    .with_tag("method", method.as_str())
            }
            _ => Meta::ajax_error(code, self.to_string(), []),
        }
    }
}

impl From<Meta> for ActorError {
    fn from(m: Meta) -> Self {
        Self::Meta(m)
    }
}

/// A method that cannot be turned into an actor.
///
/// Handler methods must take `&self`, a `&Context`, one `Meta` and the
/// options `&[Meta]`, and return `Result<Meta, ActorError>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("{type_name} has no method {method}")]
    MissingMethod { type_name: String, method: String },

    #[error("{type_name}::{method} takes {found} parameters besides &self, expected 3")]
    Arity {
        type_name: String,
        method: String,
        found: usize,
    },

    #[error("{type_name}::{method} parameter {position} is {found}, expected {expected}")]
    Param {
        type_name: String,
        method: String,
        position: usize,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("{type_name}::{method} returns {found}, expected {expected}")]
    Return {
        type_name: String,
        method: String,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("{type_name}::{method} cannot be invoked as a handler")]
    Unbound { type_name: String, method: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ActorError::not_found("bogus", "NoSuchKind");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Actor bogus for NoSuchKind not found");

        let m = err.to_meta(404);
        assert!(m.is_error());
        assert_eq!(m.error_code(0), 404);
        assert_eq!(m.attr("kind"), "NoSuchKind");
        assert_eq!(m.tag("method"), "bogus");
    }

    #[test]
    fn test_meta_failure_keeps_error_meta() {
        let carried = Meta::ajax_error(409, "conflict", []);
        let err = ActorError::from(carried.clone());
        assert_eq!(err.to_string(), "conflict (CODE 409)");
        assert!(Meta::ptr_eq(&err.to_meta(400), &carried));

        let odd = ActorError::Meta(Meta::new("Item"));
        assert_eq!(odd.to_meta(400).error_code(0), 400);
    }

    #[test]
    fn test_other_errors() {
        let err = ActorError::from(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.to_meta(500).error_message(), "disk full (CODE 500)");
        assert_eq!(ActorError::failed("nope").to_string(), "nope");
    }
}
