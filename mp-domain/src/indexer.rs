//! Lookup tables for (kind, method) dispatch
//!
//! An indexer is computed from a domain's own actors and the indexers of
//! its sub-domains. Every table keeps the first entry it sees, so a
//! domain's own actors shadow those of its descendants and earlier
//! sub-domains shadow later ones. Kind lists accumulate instead.

use crate::actor::{Actor, TARGET};
use crate::domain::Domain;
use mp_meta::Meta;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Kind an actor identity routes to: the `target` tag, else the kind of the
/// `target` relation (as `ns:kind` when the relation has a namespace)
pub fn routing_kind(actor: &Meta) -> Option<String> {
    let tagged = actor.tag(TARGET);
    if !tagged.is_empty() {
        return Some(tagged.to_string());
    }
    let rel = actor.rel(TARGET);
    match (rel.ns(), rel.kind()) {
        (_, "") => None,
        ("", kind) => Some(kind.to_string()),
        (ns, kind) => Some(format!("{ns}:{kind}")),
    }
}

fn method_key(kind: &str, method: &str) -> String {
    format!("{kind}.{method}")
}

#[derive(Clone, Default)]
pub struct Indexer {
    gids: BTreeMap<String, Arc<dyn Actor>>,
    kinds: BTreeMap<String, Vec<Arc<dyn Actor>>>,
    methods: BTreeMap<String, Arc<dyn Actor>>,
}

impl Indexer {
    /// Default build: own actors in order, then each sub-domain in order
    pub fn build(domain: &Domain) -> Indexer {
        let mut indexer = Indexer::default();
        for actor in domain.actors() {
            indexer.add_actor(actor.clone());
        }
        for sub in domain.subs() {
            indexer.merge(&sub.indexer());
        }
        trace!(
            domain = %domain.meta().label(),
            gids = indexer.gids.len(),
            kinds = indexer.kinds.len(),
            methods = indexer.methods.len(),
            "built indexer"
        );
        indexer
    }

    /// Indexes one actor of the domain itself
    pub fn add_actor(&mut self, actor: Arc<dyn Actor>) {
        let meta = actor.meta();
        if !meta.gid().is_empty() {
            self.gids
                .entry(meta.gid().to_string())
                .or_insert_with(|| actor.clone());
        }

        let Some(kind) = routing_kind(&meta) else {
            trace!(actor = %meta.label(), "actor has no target, not indexed");
            return;
        };
        if !meta.method().is_empty() {
            if let Entry::Vacant(slot) = self.methods.entry(method_key(&kind, meta.method())) {
                slot.insert(actor.clone());
            }
        }
        self.kinds.entry(kind).or_default().push(actor);
    }

    /// Folds in the indexer of a sub-domain
    pub fn merge(&mut self, other: &Indexer) {
        for (gid, actor) in &other.gids {
            self.gids
                .entry(gid.clone())
                .or_insert_with(|| actor.clone());
        }
        for (kind, actors) in &other.kinds {
            self.kinds
                .entry(kind.clone())
                .or_default()
                .extend(actors.iter().cloned());
        }
        for (key, actor) in &other.methods {
            self.methods
                .entry(key.clone())
                .or_insert_with(|| actor.clone());
        }
    }

    pub fn actor_with_gid(&self, gid: &str) -> Option<Arc<dyn Actor>> {
        self.gids.get(gid).cloned()
    }

    /// Every actor for `kind`, own actors first
    pub fn actors_with_kind(&self, kind: &str) -> &[Arc<dyn Actor>] {
        self.kinds.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn actor_with_method(&self, kind: &str, method: &str) -> Option<Arc<dyn Actor>> {
        self.methods.get(&method_key(kind, method)).cloned()
    }

    pub fn gid_actors(&self) -> &BTreeMap<String, Arc<dyn Actor>> {
        &self.gids
    }

    pub fn kind_actors(&self) -> &BTreeMap<String, Vec<Arc<dyn Actor>>> {
        &self.kinds
    }

    /// Keyed by `kind.method`
    pub fn method_actors(&self) -> &BTreeMap<String, Arc<dyn Actor>> {
        &self.methods
    }
}

impl fmt::Debug for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indexer")
            .field("gids", &self.gids.keys().collect::<Vec<_>>())
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{BaseActor, ACTOR_KIND};

    fn actor(base: BaseActor) -> Arc<dyn Actor> {
        Arc::new(base)
    }

    #[test]
    fn test_routing_kind() {
        let tagged = Meta::new(ACTOR_KIND).with_tag(TARGET, "Item");
        assert_eq!(routing_kind(&tagged).as_deref(), Some("Item"));

        let related = Meta::new(ACTOR_KIND).with_rel(TARGET, Meta::new("Order"));
        assert_eq!(routing_kind(&related).as_deref(), Some("Order"));

        let scoped = related.with_rel(TARGET, Meta::of("Order", "", "shop", ""));
        assert_eq!(routing_kind(&scoped).as_deref(), Some("shop:Order"));

        let both = scoped.with_tag(TARGET, "Item");
        assert_eq!(routing_kind(&both).as_deref(), Some("Item"));

        assert_eq!(routing_kind(&Meta::new(ACTOR_KIND)), None);
    }

    #[test]
    fn test_own_actors_first_writer_wins() {
        let first = actor(BaseActor::lister("Item").with_gid("a"));
        let second = actor(BaseActor::lister("Item").with_gid("a"));
        let finder = actor(BaseActor::finder("Item"));

        let mut indexer = Indexer::default();
        for a in [&first, &second, &finder] {
            indexer.add_actor(a.clone());
        }

        assert!(Arc::ptr_eq(&indexer.actor_with_gid("a").unwrap(), &first));
        assert!(Arc::ptr_eq(
            &indexer.actor_with_method("Item", "list").unwrap(),
            &first
        ));
        assert_eq!(indexer.actors_with_kind("Item").len(), 3);
        assert!(indexer.actor_with_method("Item", "create").is_none());
        assert!(indexer.actors_with_kind("Nope").is_empty());
    }

    #[test]
    fn test_untargeted_actor_only_by_gid() {
        let loose = actor(BaseActor::new(
            Meta::new(ACTOR_KIND).with_method("list").with_gid("loose"),
        ));
        let mut indexer = Indexer::default();
        indexer.add_actor(loose);

        assert!(indexer.actor_with_gid("loose").is_some());
        assert!(indexer.kind_actors().is_empty());
        assert!(indexer.method_actors().is_empty());
    }

    #[test]
    fn test_merge_policy() {
        let own = actor(BaseActor::lister("Item"));
        let sub_list = actor(BaseActor::lister("Item").with_gid("g"));
        let sub_find = actor(BaseActor::finder("Item"));

        let mut mine = Indexer::default();
        mine.add_actor(own.clone());
        let mut theirs = Indexer::default();
        theirs.add_actor(sub_list.clone());
        theirs.add_actor(sub_find.clone());
        mine.merge(&theirs);

        assert!(Arc::ptr_eq(&mine.actor_with_method("Item", "list").unwrap(), &own));
        assert!(Arc::ptr_eq(
            &mine.actor_with_method("Item", "find").unwrap(),
            &sub_find
        ));
        assert!(Arc::ptr_eq(&mine.actor_with_gid("g").unwrap(), &sub_list));

        let kinds = mine.actors_with_kind("Item");
        assert_eq!(kinds.len(), 3);
        assert!(Arc::ptr_eq(&kinds[0], &own));
        assert!(Arc::ptr_eq(&kinds[1], &sub_list));
        assert!(Arc::ptr_eq(&kinds[2], &sub_find));
        assert_eq!(
            mine.method_actors().keys().collect::<Vec<_>>(),
            vec!["Item.find", "Item.list"]
        );
    }
}
