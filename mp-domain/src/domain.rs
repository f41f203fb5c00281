//! Trees of domains and call dispatch

use crate::actor::Actor;
use crate::config::{DomainConfig, ScanConfig};
use crate::context::Context;
use crate::error::ActorError;
use crate::indexer::Indexer;
use crate::introspect::Introspect;
use crate::reflect::reflect_actors;
use mp_meta::Meta;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Immutable node of a domain tree.
///
/// A domain owns its actors and sub-domains and holds a weak link to its
/// parent. Growing a domain (`with_subs`, `with_actors`, `with_parent`)
/// returns a new value; attached sub-domains are re-parented to it. The
/// indexer is built on first use and cached for the lifetime of the value.
///
/// Cloning shares the node, cache included. Two handles are the same
/// domain only when [`Domain::ptr_eq`] says so.
#[derive(Clone)]
pub struct Domain(Arc<Inner>);

struct Inner {
    meta: Meta,
    config: DomainConfig,
    parent: Weak<Inner>,
    subs: Vec<Domain>,
    actors: Vec<Arc<dyn Actor>>,
    indexer: OnceCell<Arc<Indexer>>,
}

impl Domain {
    pub fn new(meta: Meta) -> Self {
        Self::with_config(meta, DomainConfig::default())
    }

    pub fn with_config(meta: Meta, config: DomainConfig) -> Self {
        Self::assemble(meta, config, Weak::new(), &[], Vec::new())
    }

    fn assemble(
        meta: Meta,
        config: DomainConfig,
        parent: Weak<Inner>,
        subs: &[Domain],
        actors: Vec<Arc<dyn Actor>>,
    ) -> Self {
        Domain(Arc::new_cyclic(|me| Inner {
            meta,
            config,
            parent,
            subs: subs.iter().map(|sub| sub.reparented(me.clone())).collect(),
            actors,
            indexer: OnceCell::new(),
        }))
    }

    // Copy of this subtree hanging from `parent`
    fn reparented(&self, parent: Weak<Inner>) -> Self {
        Self::assemble(
            self.0.meta.clone(),
            self.0.config.clone(),
            parent,
            &self.0.subs,
            self.0.actors.clone(),
        )
    }

    /// Identity of the domain; its namespace names it among siblings
    pub fn meta(&self) -> &Meta {
        &self.0.meta
    }

    pub fn config(&self) -> &DomainConfig {
        &self.0.config
    }

    pub fn is_nil(&self) -> bool {
        self.0.meta.is_nil()
    }

    /// Description of the domain, the identity unless configured otherwise
    pub fn info(&self) -> Meta {
        match &self.0.config.info {
            Some(info) => info(self),
            None => self.0.meta.clone(),
        }
    }

    pub fn ptr_eq(a: &Domain, b: &Domain) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    // tree

    /// Parent domain, while it is alive.
    ///
    /// The link is weak: a sub-domain kept after its tree is dropped, or a
    /// domain whose `with_parent` argument is gone, reports no parent.
    pub fn parent(&self) -> Option<Domain> {
        self.0.parent.upgrade().map(Domain)
    }

    /// Topmost live ancestor.
    ///
    /// Stops at the first parent that has been dropped, so a detached
    /// sub-domain is its own root.
    pub fn root(&self) -> Domain {
        let mut root = self.clone();
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    pub fn subs(&self) -> &[Domain] {
        &self.0.subs
    }

    /// First direct sub-domain whose namespace is `name`
    pub fn sub(&self, name: &str) -> Option<Domain> {
        self.0.subs.iter().find(|sub| sub.meta().ns() == name).cloned()
    }

    pub fn actors(&self) -> &[Arc<dyn Actor>] {
        &self.0.actors
    }

    /// Same domain under another parent
    pub fn with_parent(&self, parent: &Domain) -> Domain {
        self.reparented(Arc::downgrade(&parent.0))
    }

    /// Same domain with `subs` as its sub-domains, re-parented to the result
    pub fn with_subs<I>(&self, subs: I) -> Domain
    where
        I: IntoIterator<Item = Domain>,
    {
        let subs: Vec<Domain> = subs.into_iter().collect();
        Self::assemble(
            self.0.meta.clone(),
            self.0.config.clone(),
            self.0.parent.clone(),
            &subs,
            self.0.actors.clone(),
        )
    }

    /// Same domain with `actors` as its own actors
    pub fn with_actors<I>(&self, actors: I) -> Domain
    where
        I: IntoIterator<Item = Arc<dyn Actor>>,
    {
        Self::assemble(
            self.0.meta.clone(),
            self.0.config.clone(),
            self.0.parent.clone(),
            &self.0.subs,
            actors.into_iter().collect(),
        )
    }

    /// Same domain with the handler methods of `target` as its actors
    pub fn with_reflected<T: Introspect>(
        &self,
        target: Arc<T>,
        kind: &str,
        config: &ScanConfig,
    ) -> Domain {
        let actors = reflect_actors(target, kind, config);
        debug!(
            domain = %self.0.meta.label(),
            kind,
            count = actors.len(),
            "discovered actors"
        );
        self.with_actors(actors)
    }

    // dispatch

    /// Lookup tables of this domain and its descendants, built once
    pub fn indexer(&self) -> Arc<Indexer> {
        self.0
            .indexer
            .get_or_init(|| {
                Arc::new(match &self.0.config.indexer {
                    Some(build) => build(self),
                    None => Indexer::build(self),
                })
            })
            .clone()
    }

    /// Routes `m` to the actor for `(m.kind(), method)`
    pub fn call(
        &self,
        ctx: &Context,
        method: &str,
        m: Meta,
        opts: &[Meta],
    ) -> Result<Meta, ActorError> {
        let Some(actor) = self.indexer().actor_with_method(m.kind(), method) else {
            return Err(ActorError::not_found(method, m.kind()));
        };
        trace!(kind = m.kind(), method, actor = %actor.meta().label(), "dispatch");
        actor.process(ctx, m, opts)
    }

    pub fn list(&self, ctx: &Context, m: Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        self.call(ctx, "list", m, opts)
    }

    pub fn find(&self, ctx: &Context, m: Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        self.call(ctx, "find", m, opts)
    }

    pub fn create(&self, ctx: &Context, m: Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        self.call(ctx, "create", m, opts)
    }

    pub fn make(&self, ctx: &Context, m: Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        self.call(ctx, "make", m, opts)
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("meta", &self.0.meta)
            .field("subs", &self.0.subs)
            .field("actors", &self.0.actors.len())
            .field("indexed", &self.0.indexer.get().is_some())
            .finish()
    }
}
