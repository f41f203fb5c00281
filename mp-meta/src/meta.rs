//! The immutable attributed tree

use crate::info::Info;
use crate::walk::{self, Visitor};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

static NIL: Lazy<Meta> = Lazy::new(|| Meta(Arc::new(Node::default())));

#[derive(Debug, Default, PartialEq, Eq)]
struct Node {
    info: Info,
    subs: Arc<BTreeMap<String, Meta>>,
    rels: Arc<BTreeMap<String, Meta>>,
    list: Arc<Vec<Meta>>,
}

impl Node {
    fn with_info(&self, info: Info) -> Meta {
        Meta(Arc::new(Node {
            info,
            subs: self.subs.clone(),
            rels: self.rels.clone(),
            list: self.list.clone(),
        }))
    }
}

/// Immutable, structurally shared attributed tree.
///
/// Cloning a `Meta` is a reference count bump. Equality (`==`) is
/// structural; [`Meta::ptr_eq`] tells whether two values are the very same
/// node.
#[derive(Clone)]
pub struct Meta(Arc<Node>);

impl Deref for Meta {
    type Target = Info;

    fn deref(&self) -> &Info {
        &self.0.info
    }
}

impl Default for Meta {
    fn default() -> Self {
        Meta::nil()
    }
}

impl PartialEq for Meta {
    fn eq(&self, other: &Self) -> bool {
        Meta::ptr_eq(self, other) || *self.0 == *other.0
    }
}

impl Eq for Meta {}

impl fmt::Debug for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return f.write_str("Meta(nil)");
        }
        let mut s = f.debug_struct("Meta");
        s.field("kind", &self.kind());
        if !self.method().is_empty() {
            s.field("method", &self.method());
        }
        if !self.ns().is_empty() {
            s.field("ns", &self.ns());
        }
        if !self.gid().is_empty() {
            s.field("gid", &self.gid());
        }
        if self.tag_count() > 0 {
            s.field("tags", self.info().tags());
        }
        if self.attr_count() > 0 {
            s.field("attrs", self.info().attrs());
        }
        if !self.payload().is_empty() {
            s.field("payload", &self.payload());
        }
        if !self.0.subs.is_empty() {
            s.field("subs", &self.0.subs);
        }
        if !self.0.rels.is_empty() {
            s.field("rels", &self.0.rels);
        }
        if !self.0.list.is_empty() {
            s.field("list", &self.0.list);
        }
        s.finish()
    }
}

impl fmt::Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl Meta {
    /// New node of the given kind. An empty kind yields [`Meta::nil`].
    pub fn new(kind: impl Into<String>) -> Meta {
        Meta::of(kind, "", "", "")
    }

    /// New node with its whole identity set at once
    pub fn of(
        kind: impl Into<String>,
        method: impl Into<String>,
        ns: impl Into<String>,
        gid: impl Into<String>,
    ) -> Meta {
        let info = Info::identity(kind, method, ns, gid);
        if info.is_nil() {
            return Meta::nil();
        }
        Meta(Arc::new(Node {
            info,
            ..Node::default()
        }))
    }

    /// The canonical nil value
    pub fn nil() -> Meta {
        NIL.clone()
    }

    /// True when both handles point at the same node
    pub fn ptr_eq(a: &Meta, b: &Meta) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// The identity and flat attributes of this node
    pub fn info(&self) -> &Info {
        &self.0.info
    }

    pub fn with_method(&self, method: impl Into<String>) -> Meta {
        let method = method.into();
        if self.is_nil() || self.method() == method {
            return self.clone();
        }
        self.0.with_info(Info {
            method,
            ..self.info().clone()
        })
    }

    pub fn with_ns(&self, ns: impl Into<String>) -> Meta {
        let ns = ns.into();
        if self.is_nil() || self.ns() == ns {
            return self.clone();
        }
        self.0.with_info(Info {
            ns,
            ..self.info().clone()
        })
    }

    pub fn with_gid(&self, gid: impl Into<String>) -> Meta {
        let gid = gid.into();
        if self.is_nil() || self.gid() == gid {
            return self.clone();
        }
        self.0.with_info(Info {
            gid,
            ..self.info().clone()
        })
    }

    // tags

    pub fn with_tag(&self, name: impl Into<String>, value: impl Into<String>) -> Meta {
        self.with_tags([(name, value)])
    }

    /// Union of the current tags with `tags`, later keys winning
    pub fn with_tags<I, K, V>(&self, tags: I) -> Meta
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if self.is_nil() {
            return self.clone();
        }
        match merge_strings(&self.info().tags, tags, false) {
            Some(tags) => self.0.with_info(Info {
                tags,
                ..self.info().clone()
            }),
            None => self.clone(),
        }
    }

    // attributes

    pub fn with_attr(&self, name: impl Into<String>, value: impl Into<String>) -> Meta {
        self.with_attrs([(name, value)])
    }

    /// Like [`Meta::with_attr`], but an empty value leaves the node unchanged
    pub fn with_non_empty_attr(&self, name: impl Into<String>, value: impl Into<String>) -> Meta {
        self.with_non_empty_attrs([(name, value)])
    }

    /// Union of the current attributes with `attrs`, later keys winning
    pub fn with_attrs<I, K, V>(&self, attrs: I) -> Meta
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.merge_attrs(attrs, false)
    }

    pub fn with_non_empty_attrs<I, K, V>(&self, attrs: I) -> Meta
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.merge_attrs(attrs, true)
    }

    fn merge_attrs<I, K, V>(&self, attrs: I, skip_empty: bool) -> Meta
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if self.is_nil() {
            return self.clone();
        }
        match merge_strings(&self.info().attrs, attrs, skip_empty) {
            Some(attrs) => self.0.with_info(Info {
                attrs,
                ..self.info().clone()
            }),
            None => self.clone(),
        }
    }

    pub fn with_payload(&self, payload: impl AsRef<str>) -> Meta {
        let payload = payload.as_ref();
        if self.is_nil() || self.payload() == payload {
            return self.clone();
        }
        self.0.with_info(Info {
            payload: Arc::from(payload),
            ..self.info().clone()
        })
    }

    // subs

    /// Named sub-tree, or nil
    pub fn sub(&self, name: &str) -> Meta {
        self.0.subs.get(name).cloned().unwrap_or_default()
    }

    pub fn has_sub(&self, name: &str) -> bool {
        self.0.subs.contains_key(name)
    }

    pub fn sub_names(&self) -> Vec<&str> {
        self.0.subs.keys().map(String::as_str).collect()
    }

    pub fn sub_count(&self) -> usize {
        self.0.subs.len()
    }

    /// Sets the sub-tree under `name`. A nil `sub` removes the entry.
    pub fn with_sub(&self, name: impl Into<String>, sub: Meta) -> Meta {
        self.with_subs([(name, sub)])
    }

    pub fn with_subs<I, K>(&self, subs: I) -> Meta
    where
        I: IntoIterator<Item = (K, Meta)>,
        K: Into<String>,
    {
        if self.is_nil() {
            return self.clone();
        }
        match merge_children(&self.0.subs, subs) {
            Some(subs) => Meta(Arc::new(Node {
                info: self.info().clone(),
                subs,
                rels: self.0.rels.clone(),
                list: self.0.list.clone(),
            })),
            None => self.clone(),
        }
    }

    // rels

    /// Named relation, or nil
    pub fn rel(&self, name: &str) -> Meta {
        self.0.rels.get(name).cloned().unwrap_or_default()
    }

    pub fn has_rel(&self, name: &str) -> bool {
        self.0.rels.contains_key(name)
    }

    pub fn rel_names(&self) -> Vec<&str> {
        self.0.rels.keys().map(String::as_str).collect()
    }

    pub fn rel_count(&self) -> usize {
        self.0.rels.len()
    }

    /// Sets the relation under `name`. A nil `rel` removes the entry.
    pub fn with_rel(&self, name: impl Into<String>, rel: Meta) -> Meta {
        self.with_rels([(name, rel)])
    }

    pub fn with_rels<I, K>(&self, rels: I) -> Meta
    where
        I: IntoIterator<Item = (K, Meta)>,
        K: Into<String>,
    {
        if self.is_nil() {
            return self.clone();
        }
        match merge_children(&self.0.rels, rels) {
            Some(rels) => Meta(Arc::new(Node {
                info: self.info().clone(),
                subs: self.0.subs.clone(),
                rels,
                list: self.0.list.clone(),
            })),
            None => self.clone(),
        }
    }

    // list

    pub fn list(&self) -> &[Meta] {
        &self.0.list
    }

    /// List item at `index`, or nil when out of range
    pub fn list_item(&self, index: usize) -> Meta {
        self.0.list.get(index).cloned().unwrap_or_default()
    }

    /// Replaces the list, dropping nil items
    pub fn with_list<I>(&self, items: I) -> Meta
    where
        I: IntoIterator<Item = Meta>,
    {
        self.replace_list(items, true)
    }

    /// Replaces the list, keeping nil items as placeholders
    pub fn with_list_keeping_nil<I>(&self, items: I) -> Meta
    where
        I: IntoIterator<Item = Meta>,
    {
        self.replace_list(items, false)
    }

    fn replace_list<I>(&self, items: I, trim: bool) -> Meta
    where
        I: IntoIterator<Item = Meta>,
    {
        if self.is_nil() {
            return self.clone();
        }
        let list: Vec<Meta> = items
            .into_iter()
            .filter(|item| !(trim && item.is_nil()))
            .map(|item| if item.is_nil() { Meta::nil() } else { item })
            .collect();

        let current = &self.0.list;
        let unchanged = list.len() == current.len()
            && list
                .iter()
                .zip(current.iter())
                .all(|(a, b)| Meta::ptr_eq(a, b));
        if unchanged {
            return self.clone();
        }
        Meta(Arc::new(Node {
            info: self.info().clone(),
            subs: self.0.subs.clone(),
            rels: self.0.rels.clone(),
            list: Arc::new(list),
        }))
    }

    // matching

    /// Same kind, and every tag of `self` is on `other` with an equal value
    pub fn generalizes(&self, other: &Meta) -> bool {
        self.kind() == other.kind()
            && self
                .info()
                .tags()
                .iter()
                .all(|(k, v)| other.tag_is(k, v))
    }

    pub fn specializes(&self, other: &Meta) -> bool {
        other.generalizes(self)
    }

    /// Depth-first traversal, see [`walk::walk`]
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        walk::walk(self, visitor)
    }

    pub(crate) fn subs_map(&self) -> &BTreeMap<String, Meta> {
        &self.0.subs
    }

    pub(crate) fn rels_map(&self) -> &BTreeMap<String, Meta> {
        &self.0.rels
    }
}

/// Returns the merged map, or `None` when nothing would change
fn merge_strings<I, K, V>(
    current: &Arc<BTreeMap<String, String>>,
    entries: I,
    skip_empty: bool,
) -> Option<Arc<BTreeMap<String, String>>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut merged: Option<BTreeMap<String, String>> = None;
    for (k, v) in entries {
        let (k, v) = (k.into(), v.into());
        if skip_empty && v.is_empty() {
            continue;
        }
        let existing = merged.as_ref().unwrap_or(current.as_ref()).get(&k);
        if existing == Some(&v) {
            continue;
        }
        merged
            .get_or_insert_with(|| current.as_ref().clone())
            .insert(k, v);
    }
    merged.map(Arc::new)
}

fn merge_children<I, K>(
    current: &Arc<BTreeMap<String, Meta>>,
    entries: I,
) -> Option<Arc<BTreeMap<String, Meta>>>
where
    I: IntoIterator<Item = (K, Meta)>,
    K: Into<String>,
{
    let mut merged: Option<BTreeMap<String, Meta>> = None;
    for (name, child) in entries {
        let name = name.into();
        let existing = merged.as_ref().unwrap_or(current.as_ref()).get(&name);
        if child.is_nil() {
            if existing.is_some() {
                merged
                    .get_or_insert_with(|| current.as_ref().clone())
                    .remove(&name);
            }
            continue;
        }
        if existing.is_some_and(|e| Meta::ptr_eq(e, &child)) {
            continue;
        }
        merged
            .get_or_insert_with(|| current.as_ref().clone())
            .insert(name, child);
    }
    merged.map(Arc::new)
}

/// First option, or nil
pub fn first(ms: &[Meta]) -> Meta {
    ms.first().cloned().unwrap_or_default()
}

pub fn first_attr(ms: &[Meta], name: &str) -> String {
    first(ms).attr(name).to_string()
}

/// First option when it matches `kind`, `ns` and `tags`, else nil
pub fn first_is(ms: &[Meta], kind: &str, ns: &str, tags: &[(&str, &str)]) -> Meta {
    let ret = first(ms);
    if !ret.is_nil() && ret.is(kind, ns, tags) {
        ret
    } else {
        Meta::nil()
    }
}
