//! The actor abstraction and its declarative implementations

use crate::context::Context;
use crate::error::ActorError;
use crate::indexer::routing_kind;
use mp_meta::Meta;
use std::fmt;

/// Kind of every actor identity
pub const ACTOR_KIND: &str = "Actor";

/// Tag (or relation) naming the kind an actor accepts
pub const TARGET: &str = "target";

/// A handler for one (kind, method) pair.
///
/// The identity returned by [`Actor::meta`] has kind `Actor`, the handled
/// verb as method and the accepted kind in the `target` tag. It must not
/// change over the lifetime of the actor.
pub trait Actor: Send + Sync {
    fn meta(&self) -> Meta;

    /// Handles `m` with the given options
    fn process(&self, ctx: &Context, m: Meta, opts: &[Meta]) -> Result<Meta, ActorError>;
}

impl fmt::Debug for dyn Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({})", self.meta().label())
    }
}

/// Identity-only actor.
///
/// Handlers embed it for their identity and implement [`Actor::process`]
/// themselves; on its own it rejects every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseActor {
    meta: Meta,
}

impl BaseActor {
    /// Wraps an arbitrary identity
    pub fn new(meta: Meta) -> Self {
        Self { meta }
    }

    /// Actor for `method` on `kind`, with extra identity tags
    pub fn simple<'a, I>(kind: &str, method: &str, tags: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::new(
            Meta::new(ACTOR_KIND)
                .with_method(method)
                .with_tag(TARGET, kind)
                .with_tags(tags),
        )
    }

    pub fn lister(kind: &str) -> Self {
        Self::simple(kind, "list", [])
    }

    pub fn finder(kind: &str) -> Self {
        Self::simple(kind, "find", [])
    }

    pub fn creator(kind: &str) -> Self {
        Self::simple(kind, "create", [])
    }

    pub fn maker(kind: &str) -> Self {
        Self::simple(kind, "make", [])
    }

    pub fn remover(kind: &str) -> Self {
        Self::simple(kind, "remove", [])
    }

    /// Same identity with a global id, for lookup by gid
    pub fn with_gid(&self, gid: &str) -> Self {
        Self::new(self.meta.with_gid(gid))
    }

    pub fn method(&self) -> &str {
        self.meta.method()
    }

    /// Accepted kind, as resolved by [`routing_kind`]
    pub fn target(&self) -> String {
        routing_kind(&self.meta).unwrap_or_default()
    }

    /// Pairs this identity with a closure
    pub fn handle<F>(self, f: F) -> FnActor<F>
    where
        F: Fn(&Context, Meta, &[Meta]) -> Result<Meta, ActorError> + Send + Sync,
    {
        FnActor::new(self, f)
    }
}

impl Actor for BaseActor {
    fn meta(&self) -> Meta {
        self.meta.clone()
    }

    fn process(&self, _ctx: &Context, _m: Meta, _opts: &[Meta]) -> Result<Meta, ActorError> {
        Err(ActorError::Unsupported {
            method: self.method().to_string(),
            kind: self.target(),
        })
    }
}

/// Declarative actor backed by a closure
pub struct FnActor<F> {
    base: BaseActor,
    f: F,
}

impl<F> FnActor<F>
where
    F: Fn(&Context, Meta, &[Meta]) -> Result<Meta, ActorError> + Send + Sync,
{
    pub fn new(base: BaseActor, f: F) -> Self {
        Self { base, f }
    }

    pub fn base(&self) -> &BaseActor {
        &self.base
    }
}

impl<F> Actor for FnActor<F>
where
    F: Fn(&Context, Meta, &[Meta]) -> Result<Meta, ActorError> + Send + Sync,
{
    fn meta(&self) -> Meta {
        self.base.meta()
    }

    fn process(&self, ctx: &Context, m: Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        (self.f)(ctx, m, opts)
    }
}

impl<F> fmt::Debug for FnActor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnActor").field("base", &self.base).finish()
    }
}
