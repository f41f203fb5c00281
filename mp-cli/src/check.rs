//! Document checks behind `mt` and `mj`

use mp_meta::parse_meta;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Mismatch {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("kind is {found:?}, expected {expected:?}")]
    Kind { found: String, expected: String },

    #[error("tag {name}={found:?}, expected {name}={expected:?}")]
    Tag {
        name: String,
        found: String,
        expected: String,
    },

    #[error("attr {name}={found}, expected {name}={expected}")]
    Attr {
        name: String,
        found: String,
        expected: String,
    },

    #[error("value is {found}, expected {expected}")]
    Value { found: String, expected: String },
}

/// Expectations on a Meta document
#[derive(Debug, Default)]
pub struct MetaCheck {
    pub kind: Option<String>,
    pub tags: Vec<(String, String)>,
    pub attrs: Vec<(String, String)>,
}

impl MetaCheck {
    pub fn run(&self, buf: &[u8]) -> Result<(), Mismatch> {
        let m = parse_meta(buf)?;
        tracing::debug!(kind = m.kind(), tags = m.tag_count(), attrs = m.attr_count(), "Parsed meta");

        if let Some(kind) = self.kind.as_deref().filter(|k| !k.is_empty()) {
            if m.kind() != kind {
                return Err(Mismatch::Kind {
                    found: m.kind().to_string(),
                    expected: kind.to_string(),
                });
            }
        }
        for (name, value) in &self.tags {
            if !m.tag_is(name, value) {
                return Err(Mismatch::Tag {
                    name: name.clone(),
                    found: m.tag(name).to_string(),
                    expected: value.clone(),
                });
            }
        }
        for (name, value) in &self.attrs {
            if !m.attr_is(name, value) {
                return Err(Mismatch::Attr {
                    name: name.clone(),
                    found: format!("{:?}", m.attr(name)),
                    expected: format!("{value:?}"),
                });
            }
        }
        Ok(())
    }
}

/// Expectations on a plain JSON document.
///
/// `string` and `int` check the whole document and take precedence over the
/// field checks.
#[derive(Debug, Default)]
pub struct JsonCheck {
    pub attrs: Vec<(String, String)>,
    pub ints: Vec<(String, i64)>,
    pub string: Option<String>,
    pub int: Option<i64>,
}

impl JsonCheck {
    pub fn run(&self, buf: &[u8]) -> Result<(), Mismatch> {
        if let Some(expected) = &self.string {
            let found: String = serde_json::from_slice(buf)?;
            return expect_equal(&found, expected);
        }
        if let Some(expected) = self.int {
            let found: i64 = serde_json::from_slice(buf)?;
            return expect_equal(&found, &expected);
        }

        let doc: serde_json::Map<String, Value> = serde_json::from_slice(buf)?;
        for (name, value) in &self.attrs {
            let found = doc.get(name);
            if found.and_then(Value::as_str) != Some(value.as_str()) {
                return Err(field_mismatch(name, found, format!("{value:?}")));
            }
        }
        for (name, value) in &self.ints {
            let found = doc.get(name);
            if found.and_then(Value::as_i64) != Some(*value) {
                return Err(field_mismatch(name, found, value.to_string()));
            }
        }
        Ok(())
    }
}

fn expect_equal<T: PartialEq + std::fmt::Debug>(found: &T, expected: &T) -> Result<(), Mismatch> {
    if found == expected {
        return Ok(());
    }
    Err(Mismatch::Value {
        found: format!("{found:?}"),
        expected: format!("{expected:?}"),
    })
}

fn field_mismatch(name: &str, found: Option<&Value>, expected: String) -> Mismatch {
    Mismatch::Attr {
        name: name.to_string(),
        found: found.map_or_else(|| "missing".to_string(), Value::to_string),
        expected,
    }
}

/// Parses one `key=value` pair
pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got {s:?}")),
    }
}

/// Parses one `key=integer` pair
pub fn parse_int_pair(s: &str) -> Result<(String, i64), String> {
    let (key, value) = parse_pair(s)?;
    let value = value
        .parse()
        .map_err(|err| format!("{key}: {value:?} is not an integer ({err})"))?;
    Ok((key, value))
}
