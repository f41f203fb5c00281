//! Body of a `/call` request

use crate::error::MpiError;
use mp_meta::{jsons_to_metas, metas_to_jsons, Meta, MetaJson};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "MetaJson::is_nil")]
    pub meta: MetaJson,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<MetaJson>,
}

impl Request {
    pub fn new(method: &str, m: &Meta, opts: &[Meta]) -> Self {
        Self {
            method: method.to_string(),
            meta: MetaJson::from(m),
            options: metas_to_jsons(opts),
        }
    }

    /// Method, input and options
    pub fn unpack(&self) -> (String, Meta, Vec<Meta>) {
        (
            self.method.clone(),
            self.meta.meta(),
            jsons_to_metas(&self.options),
        )
    }
}

/// Indented JSON body for a call
pub fn request_body(method: &str, m: &Meta, opts: &[Meta]) -> Result<Vec<u8>, MpiError> {
    Ok(serde_json::to_vec_pretty(&Request::new(method, m, opts))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_shape() {
        let body = request_body(
            "list",
            &Meta::new("Item").with_tag("region", "us"),
            &[Meta::new("Page").with_attr("size", "10")],
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["method"], "list");
        assert_eq!(value["meta"]["kind"], "Item");
        assert_eq!(value["meta"]["tags"]["region"], "us");
        assert_eq!(value["options"][0]["attrs"]["size"], "10");
    }

    #[test]
    fn test_unpack() {
        let req: Request = serde_json::from_str(
            r#"{"method": "find", "meta": {"kind": "Item", "gid": "i1"}, "options": [{}, {"kind": "Sort"}]}"#,
        )
        .unwrap();
        let (method, m, opts) = req.unpack();
        assert_eq!(method, "find");
        assert_eq!(m.gid(), "i1");
        assert_eq!(opts.len(), 2);
        assert!(opts[0].is_nil());
        assert_eq!(opts[1].kind(), "Sort");
    }

    #[test]
    fn test_empty_request() {
        let req: Request = serde_json::from_str("{}").unwrap();
        let (method, m, opts) = req.unpack();
        assert!(method.is_empty());
        assert!(m.is_nil());
        assert!(opts.is_empty());
        assert_eq!(serde_json::to_string(&req).unwrap(), "{}");
    }
}
