//! Attribute errors and error values carried as metas

use crate::meta::Meta;
use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// Reserved kind of error values
pub const ERROR_KIND: &str = "Error";

/// Failure to read a typed attribute
#[derive(Debug, Error)]
pub enum AttrError {
    #[error("invalid int attr {name}={value:?}: {source}")]
    Int {
        name: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid float attr {name}={value:?}: {source}")]
    Float {
        name: String,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("invalid bool attr {name}={value:?}")]
    Bool { name: String, value: String },

    #[error("invalid time attr {name}={value:?}: {source}")]
    Time {
        name: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The local time does not exist in the requested time zone
    #[error("no local time for attr {name}={value:?}")]
    NoLocalTime { name: String, value: String },
}

impl Meta {
    /// Error value with a message and extra attributes
    pub fn error<'a, I>(message: impl Into<String>, attrs: I) -> Meta
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Meta::new(ERROR_KIND)
            .with_attr("message", message)
            .with_attrs(attrs)
    }

    /// Error value with a numeric code, a message and extra attributes
    pub fn ajax_error<'a, I>(code: i64, message: impl Into<String>, attrs: I) -> Meta
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Meta::new(ERROR_KIND)
            .with_attr("code", code.to_string())
            .with_attr("message", message)
            .with_attrs(attrs)
    }

    /// Error value describing `err` in the context of the request `m`.
    ///
    /// Copies the request kind into the `kind` attribute and its `method`
    /// tag, when present.
    pub fn error_for<'a, I>(m: &Meta, err: &dyn fmt::Display, attrs: I) -> Meta
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ret = Meta::error(err.to_string(), [("kind", m.kind())]);
        if m.has_tag("method") {
            ret = ret.with_tag("method", m.tag("method"));
        }
        ret.with_attrs(attrs)
    }

    pub fn is_error(&self) -> bool {
        self.kind() == ERROR_KIND
    }

    /// Neither nil nor an error value
    pub fn is_valid(&self) -> bool {
        !self.is_nil() && !self.is_error()
    }

    /// Human readable message of an error value.
    ///
    /// `"Nil"` for the nil value and the empty string for ordinary values.
    pub fn error_message(&self) -> String {
        if self.is_nil() {
            return "Nil".to_string();
        }
        if !self.is_error() {
            return String::new();
        }
        let message = match self.attr("message") {
            "" => ERROR_KIND,
            message => message,
        };
        match self.attr("code") {
            "" => message.to_string(),
            code => format!("{message} (CODE {code})"),
        }
    }

    /// Numeric `code` of an error value, or `otherwise`
    pub fn error_code(&self, otherwise: i64) -> i64 {
        if self.is_error() {
            if let Ok(code) = self.int_attr("code") {
                return code;
            }
        }
        otherwise
    }
}
