//! JSON wire encoding of metas
//!
//! Every field is omitted when empty. A document without a kind decodes to
//! the nil value, and nil list items are kept as `{}` placeholders so that
//! decoding an encoded meta gives back an equal meta.

use crate::meta::Meta;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Wire form of a [`Meta`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaJson {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ns: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gid: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subs: BTreeMap<String, MetaJson>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rels: BTreeMap<String, MetaJson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<MetaJson>,
}

impl MetaJson {
    pub fn is_nil(&self) -> bool {
        self.kind.is_empty()
    }

    pub fn meta(&self) -> Meta {
        Meta::from(self)
    }
}

impl From<&Meta> for MetaJson {
    fn from(m: &Meta) -> Self {
        if m.is_nil() {
            return MetaJson::default();
        }
        MetaJson {
            kind: m.kind().to_string(),
            method: m.method().to_string(),
            ns: m.ns().to_string(),
            gid: m.gid().to_string(),
            tags: m.info().tags().clone(),
            attrs: m.info().attrs().clone(),
            payload: m.payload().to_string(),
            subs: children(m.subs_map()),
            rels: children(m.rels_map()),
            list: metas_to_jsons(m.list()),
        }
    }
}

impl From<&MetaJson> for Meta {
    fn from(mj: &MetaJson) -> Self {
        if mj.is_nil() {
            return Meta::nil();
        }
        Meta::of(&mj.kind, &mj.method, &mj.ns, &mj.gid)
            .with_tags(&mj.tags)
            .with_attrs(&mj.attrs)
            .with_payload(&mj.payload)
            .with_subs(mj.subs.iter().map(|(name, sub)| (name, Meta::from(sub))))
            .with_rels(mj.rels.iter().map(|(name, rel)| (name, Meta::from(rel))))
            .with_list_keeping_nil(jsons_to_metas(&mj.list))
    }
}

impl From<MetaJson> for Meta {
    fn from(mj: MetaJson) -> Self {
        Meta::from(&mj)
    }
}

fn children(map: &BTreeMap<String, Meta>) -> BTreeMap<String, MetaJson> {
    map.iter()
        .map(|(name, m)| (name.clone(), MetaJson::from(m)))
        .collect()
}

pub fn metas_to_jsons(ms: &[Meta]) -> Vec<MetaJson> {
    ms.iter().map(MetaJson::from).collect()
}

pub fn jsons_to_metas(mjs: &[MetaJson]) -> Vec<Meta> {
    mjs.iter().map(Meta::from).collect()
}

/// Decodes a JSON document into a meta
pub fn parse_meta(buf: &[u8]) -> Result<Meta, serde_json::Error> {
    let mj: MetaJson = serde_json::from_slice(buf)?;
    Ok(Meta::from(mj))
}

impl Serialize for Meta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MetaJson::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Meta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        MetaJson::deserialize(deserializer).map(Meta::from)
    }
}

impl Meta {
    /// Compact JSON encoding
    pub fn to_json(&self) -> String {
        serde_json::to_string(&MetaJson::from(self)).unwrap_or_default()
    }

    /// Indented JSON encoding
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&MetaJson::from(self)).unwrap_or_default()
    }
}

/// Scalar fields of a serializable struct as attribute strings.
///
/// Only booleans, numbers and strings are kept; nested values, sequences
/// and nulls are skipped. With `keys`, only those fields are picked. A value
/// that does not serialize to a JSON object gives an empty map.
pub fn struct_to_attrs<T: Serialize + ?Sized>(value: &T, keys: &[&str]) -> BTreeMap<String, String> {
    let fields = match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(fields)) => fields,
        _ => return BTreeMap::new(),
    };
    let scalar = |(name, field): (&String, &serde_json::Value)| {
        scalar_string(field).map(|s| (name.clone(), s))
    };
    if keys.is_empty() {
        return fields.iter().filter_map(scalar).collect();
    }
    keys.iter()
        .filter_map(|key| fields.get_key_value(*key))
        .filter_map(scalar)
        .collect()
}

fn scalar_string(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Some(i.to_string()),
            (_, Some(u), _) => Some(u.to_string()),
            // Display gives the shortest form without an exponent
            (_, _, Some(f)) => Some(f.to_string()),
            _ => None,
        },
        _ => None,
    }
}

impl Meta {
    /// Adds the scalar fields of `value` as attributes, see
    /// [`struct_to_attrs`]
    pub fn with_struct_attrs<T: Serialize + ?Sized>(&self, value: &T, keys: &[&str]) -> Meta {
        self.with_attrs(struct_to_attrs(value, keys))
    }
}
