//! Identity and flat attributes of a meta node

use crate::error::AttrError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Layout of date attributes (`2006-01-02`)
pub const UTC_DATE_FORMAT: &str = "%Y-%m-%d";

/// Layout of UTC timestamp attributes (`2006-01-02T15:04:05.000Z`)
pub const UTC_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Identity plus flat string attributes of a node.
///
/// Tags are meant for routing and classification, attributes for scalar
/// payload data. Both maps are shared between versions of a node until one
/// of them is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    pub(crate) kind: String,
    pub(crate) method: String,
    pub(crate) ns: String,
    pub(crate) gid: String,
    pub(crate) tags: Arc<BTreeMap<String, String>>,
    pub(crate) attrs: Arc<BTreeMap<String, String>>,
    pub(crate) payload: Arc<str>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            kind: String::new(),
            method: String::new(),
            ns: String::new(),
            gid: String::new(),
            tags: Arc::new(BTreeMap::new()),
            attrs: Arc::new(BTreeMap::new()),
            payload: Arc::from(""),
        }
    }
}

impl Info {
    pub(crate) fn identity(
        kind: impl Into<String>,
        method: impl Into<String>,
        ns: impl Into<String>,
        gid: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            method: method.into(),
            ns: ns.into(),
            gid: gid.into(),
            ..Self::default()
        }
    }

    /// True for the nil value (empty kind)
    pub fn is_nil(&self) -> bool {
        self.kind.is_empty()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn ns(&self) -> &str {
        &self.ns
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn gid(&self) -> &str {
        &self.gid
    }

    /// `ns:kind.method:gid`, or `ns:kind:gid` when no method is set
    pub fn label(&self) -> String {
        if self.method.is_empty() {
            format!("{}:{}:{}", self.ns, self.kind, self.gid)
        } else {
            format!("{}:{}.{}:{}", self.ns, self.kind, self.method, self.gid)
        }
    }

    // tags

    /// Tag value, or the empty string when absent
    pub fn tag(&self, name: &str) -> &str {
        self.tags.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// True when the tag is present with exactly this value
    pub fn tag_is(&self, name: &str, value: &str) -> bool {
        self.tags.get(name).is_some_and(|v| v == value)
    }

    /// True when every given pair is present with an equal value
    pub fn has_tags<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        has_values(&self.tags, tags)
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.keys().map(String::as_str).collect()
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Owned copy of the tags
    pub fn tag_map(&self) -> HashMap<String, String> {
        self.tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Kind and namespace match and every given tag pair is present
    pub fn is(&self, kind: &str, ns: &str, tags: &[(&str, &str)]) -> bool {
        self.kind == kind && self.ns == ns && self.has_tags(tags.iter().copied())
    }

    // attributes

    /// Attribute value, or the empty string when absent
    pub fn attr(&self, name: &str) -> &str {
        self.attrs.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// True when the attribute is present with exactly this value
    pub fn attr_is(&self, name: &str, value: &str) -> bool {
        self.attrs.get(name).is_some_and(|v| v == value)
    }

    pub fn has_attrs<'a, I>(&self, attrs: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        has_values(&self.attrs, attrs)
    }

    pub fn attr_names(&self) -> Vec<&str> {
        self.attrs.keys().map(String::as_str).collect()
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// Owned copy of the attributes, minus the skipped names
    pub fn attr_map(&self, skips: &[&str]) -> HashMap<String, String> {
        self.attrs
            .iter()
            .filter(|(k, _)| !skips.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn int_attr(&self, name: &str) -> Result<i64, AttrError> {
        let value = self.attr(name);
        value.parse().map_err(|source| AttrError::Int {
            name: name.to_string(),
            value: value.to_string(),
            source,
        })
    }

    /// Integer attribute, or `otherwise` when absent or malformed
    pub fn int_attr_or(&self, name: &str, otherwise: i64) -> i64 {
        self.attrs
            .get(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(otherwise)
    }

    pub fn float_attr(&self, name: &str) -> Result<f64, AttrError> {
        let value = self.attr(name);
        value.parse().map_err(|source| AttrError::Float {
            name: name.to_string(),
            value: value.to_string(),
            source,
        })
    }

    /// Parses `1/true/yes/on` and `0/false/no/off`, ignoring case
    pub fn bool_attr(&self, name: &str) -> Result<bool, AttrError> {
        let value = self.attr(name);
        truth(value).ok_or_else(|| AttrError::Bool {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn is_true_attr(&self, name: &str) -> bool {
        truth(self.attr(name)) == Some(true)
    }

    pub fn is_false_attr(&self, name: &str) -> bool {
        truth(self.attr(name)) == Some(false)
    }

    /// Date attribute in [`UTC_DATE_FORMAT`], as midnight UTC
    pub fn date_attr(&self, name: &str) -> Result<DateTime<Utc>, AttrError> {
        self.date_attr_in(name, &Utc)
    }

    /// Date attribute in [`UTC_DATE_FORMAT`], as midnight in `tz`
    pub fn date_attr_in<Tz: TimeZone>(
        &self,
        name: &str,
        tz: &Tz,
    ) -> Result<DateTime<Tz>, AttrError> {
        let value = self.attr(name);
        let date = NaiveDate::parse_from_str(value, UTC_DATE_FORMAT)
            .map_err(|source| self.time_error(name, source))?;
        local(name, value, tz, date.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    /// Timestamp attribute with a chrono `layout`.
    ///
    /// Layouts carrying an offset are honored; layouts without one are read
    /// as UTC.
    pub fn time_attr(&self, name: &str, layout: &str) -> Result<DateTime<Utc>, AttrError> {
        let value = self.attr(name);
        if let Ok(dt) = DateTime::parse_from_str(value, layout) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, layout)
            .map(|naive| naive.and_utc())
            .map_err(|source| self.time_error(name, source))
    }

    /// Timestamp attribute with a chrono `layout`, read as local time in `tz`
    pub fn time_attr_in<Tz: TimeZone>(
        &self,
        name: &str,
        layout: &str,
        tz: &Tz,
    ) -> Result<DateTime<Tz>, AttrError> {
        let value = self.attr(name);
        let naive = NaiveDateTime::parse_from_str(value, layout)
            .map_err(|source| self.time_error(name, source))?;
        local(name, value, tz, naive)
    }

    /// Timestamp in [`UTC_TIME_FORMAT`], or the Unix epoch when malformed
    pub fn utc_attr(&self, name: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(self.attr(name), UTC_TIME_FORMAT)
            .map(|naive| naive.and_utc())
            .unwrap_or_default()
    }

    /// Splits the attribute on `sep` and parses every piece.
    ///
    /// An absent or empty attribute yields an empty vector. An empty `sep`
    /// splits into single characters.
    pub fn ints_attr(&self, name: &str, sep: &str) -> Result<Vec<i64>, AttrError> {
        let value = self.attr(name);
        if value.is_empty() {
            return Ok(Vec::new());
        }
        let words: Vec<&str> = if sep.is_empty() {
            value
                .char_indices()
                .map(|(i, c)| &value[i..i + c.len_utf8()])
                .collect()
        } else {
            value.split(sep).collect()
        };
        words
            .into_iter()
            .map(|word| {
                word.parse().map_err(|source| AttrError::Int {
                    name: name.to_string(),
                    value: word.to_string(),
                    source,
                })
            })
            .collect()
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    fn time_error(&self, name: &str, source: chrono::ParseError) -> AttrError {
        AttrError::Time {
            name: name.to_string(),
            value: self.attr(name).to_string(),
            source,
        }
    }
}

fn truth(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn has_values<'a, I>(vals: &BTreeMap<String, String>, wanted: I) -> bool
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    wanted
        .into_iter()
        .all(|(k, v)| vals.get(k).is_some_and(|val| val == v))
}

fn local<Tz: TimeZone>(
    name: &str,
    value: &str,
    tz: &Tz,
    naive: NaiveDateTime,
) -> Result<DateTime<Tz>, AttrError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| AttrError::NoLocalTime {
            name: name.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use crate::Meta;
    use chrono::{Datelike, FixedOffset, Timelike};

    fn sample() -> Meta {
        Meta::new("Order")
            .with_attr("count", "42")
            .with_attr("ratio", "0.25")
            .with_attr("flag", "YES")
            .with_attr("odd", "maybe")
            .with_attr("off", "Off")
            .with_attr("day", "2022-03-04")
            .with_attr("at", "2022-03-04T05:06:07.890Z")
            .with_attr("ids", "1,2,3")
            .with_attr("bad_ids", "1,x,3")
    }

    #[test]
    fn test_bool_parsing() {
        let m = sample();
        assert!(m.is_true_attr("flag"));
        assert!(!m.is_false_attr("flag"));
        assert!(!m.is_true_attr("odd"));
        assert!(!m.is_false_attr("odd"));
        assert!(m.bool_attr("odd").is_err());
        assert_eq!(m.bool_attr("flag").unwrap(), true);
        assert_eq!(m.bool_attr("off").unwrap(), false);
        assert!(m.is_false_attr("off"));
        assert!(m.bool_attr("missing").is_err());
    }

    #[test]
    fn test_numeric_attrs() {
        let m = sample();
        assert_eq!(m.int_attr("count").unwrap(), 42);
        assert!(m.int_attr("ratio").is_err());
        assert_eq!(m.int_attr_or("ratio", 7), 7);
        assert_eq!(m.int_attr_or("missing", -1), -1);
        assert_eq!(m.float_attr("ratio").unwrap(), 0.25);
        assert!(m.float_attr("odd").is_err());
    }

    #[test]
    fn test_ints_attr() {
        let m = sample();
        assert_eq!(m.ints_attr("ids", ",").unwrap(), vec![1, 2, 3]);
        assert_eq!(m.ints_attr("missing", ",").unwrap(), Vec::<i64>::new());
        let err = m.ints_attr("bad_ids", ",").unwrap_err();
        assert!(err.to_string().contains("bad_ids"));
    }

    #[test]
    fn test_ints_attr_empty_separator() {
        let m = crate::Meta::new("X").with_attr("digits", "123");
        assert_eq!(m.ints_attr("digits", "").unwrap(), vec![1, 2, 3]);
        let m = m.with_attr("digits", "4x");
        assert!(m.ints_attr("digits", "").is_err());
    }

    #[test]
    fn test_date_and_time_attrs() {
        let m = sample();
        let day = m.date_attr("day").unwrap();
        assert_eq!((day.year(), day.month(), day.day()), (2022, 3, 4));
        assert_eq!(day.hour(), 0);

        let plus8 = FixedOffset::east_opt(8 * 3600).unwrap();
        let local = m.date_attr_in("day", &plus8).unwrap();
        assert_eq!(local.naive_local().hour(), 0);
        assert_eq!(local.naive_utc().hour(), 16);

        let at = m.utc_attr("at");
        assert_eq!((at.hour(), at.minute(), at.second()), (5, 6, 7));
        assert_eq!(m.utc_attr("odd").timestamp(), 0);

        let t = m.time_attr("day", "%Y-%m-%d").unwrap_err();
        assert!(t.to_string().contains("day"));
        let t = m.time_attr("at", "%Y-%m-%dT%H:%M:%S%.fZ").unwrap();
        assert_eq!(t.minute(), 6);
    }

    #[test]
    fn test_nil_accessors_are_empty() {
        let nil = Meta::nil();
        assert_eq!(nil.kind(), "");
        assert_eq!(nil.tag("x"), "");
        assert_eq!(nil.attr("x"), "");
        assert_eq!(nil.tag_count(), 0);
        assert!(nil.attr_names().is_empty());
        assert!(!nil.is_true_attr("x"));
        assert_eq!(nil.payload(), "");
    }

    #[test]
    fn test_label_and_is() {
        let m = Meta::of("Item", "list", "shop", "g1").with_tag("status", "open");
        assert_eq!(m.label(), "shop:Item.list:g1");
        assert_eq!(Meta::new("Item").label(), ":Item:");
        assert!(m.is("Item", "shop", &[("status", "open")]));
        assert!(!m.is("Item", "shop", &[("status", "closed")]));
        assert!(!m.is("Item", "", &[]));
    }

    #[test]
    fn test_attr_map_skips() {
        let m = Meta::new("X").with_attr("a", "1").with_attr("b", "2");
        let map = m.attr_map(&["a"]);
        assert_eq!(map.len(), 1);
        assert_eq!(map["b"], "2");
        assert!(m.has_attrs([("a", "1"), ("b", "2")]));
        assert!(!m.has_attrs([("a", "2")]));
    }
}
