//! Actors synthesized from the methods of an introspected object

use crate::actor::{Actor, ACTOR_KIND, TARGET};
use crate::config::ScanConfig;
use crate::context::Context;
use crate::error::{ActorError, ContractViolation};
use crate::introspect::{short_type_name, Handler, Introspect};
use mp_meta::Meta;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Actor forwarding every call to one method of a shared object
pub struct ReflectActor<T> {
    meta: Meta,
    target: Arc<T>,
    name: &'static str,
    handler: Handler<T>,
}

impl<T: Introspect> ReflectActor<T> {
    /// Actor for the method `name`, handling `kind`.
    ///
    /// The verb is the name without the default `mpi_` prefix,
    /// lowercase-leading.
    ///
    /// # Panics
    ///
    /// When the method does not exist or does not satisfy the handler
    /// contract.
    pub fn build(target: Arc<T>, kind: &str, name: &str) -> Self {
        match Self::try_build(target, kind, name) {
            Ok(actor) => actor,
            Err(violation) => panic!("{violation}"),
        }
    }

    pub fn try_build(target: Arc<T>, kind: &str, name: &str) -> Result<Self, ContractViolation> {
        let verb = lower_first(ScanConfig::default().suffix(name).unwrap_or(name));
        Self::try_build_as(target, kind, name, &verb)
    }

    /// Like [`ReflectActor::try_build`] with an explicit verb
    pub fn try_build_as(
        target: Arc<T>,
        kind: &str,
        name: &str,
        verb: &str,
    ) -> Result<Self, ContractViolation> {
        let info = T::method(name).ok_or_else(|| ContractViolation::MissingMethod {
            type_name: short_type_name::<T>().to_string(),
            method: name.to_string(),
        })?;
        let handler = info.handler()?;
        Ok(Self {
            meta: Meta::new(ACTOR_KIND).with_method(verb).with_tag(TARGET, kind),
            target,
            name: info.name,
            handler,
        })
    }

    /// Name of the wrapped method
    pub fn method_name(&self) -> &'static str {
        self.name
    }
}

impl<T: Introspect> Actor for ReflectActor<T> {
    fn meta(&self) -> Meta {
        self.meta.clone()
    }

    fn process(&self, ctx: &Context, m: Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        (self.handler)(self.target.as_ref(), ctx, m, opts)
    }
}

impl<T> fmt::Debug for ReflectActor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectActor")
            .field("type", &short_type_name::<T>())
            .field("method", &self.name)
            .field("meta", &self.meta)
            .finish()
    }
}

/// Discovers the handler methods of `target`.
///
/// The names listed in `config` come first, in order, with the whole name
/// as verb. Then every method starting with the scan prefix, in declaration
/// order, with the rest of its name as verb. A verb already taken, a missing
/// name, or a method that breaks the handler contract is skipped.
pub fn reflect_actors<T: Introspect>(
    target: Arc<T>,
    kind: &str,
    config: &ScanConfig,
) -> Vec<Arc<dyn Actor>> {
    let type_name = short_type_name::<T>();
    let mut taken = HashSet::new();
    let mut actors: Vec<Arc<dyn Actor>> = Vec::new();

    let mut register = |name: &str, verb: String| {
        if verb.is_empty() || taken.contains(&verb) {
            return;
        }
        match ReflectActor::try_build_as(target.clone(), kind, name, &verb) {
            Ok(actor) => {
                debug!("{type_name}::{name} registered as {kind}.{verb}");
                taken.insert(verb);
                actors.push(Arc::new(actor));
            }
            Err(violation) => debug!("skipping {type_name}::{name}: {violation}"),
        }
    };

    for name in &config.names {
        let name = name.trim();
        register(name, lower_first(name));
    }
    for info in T::methods() {
        if let Some(suffix) = config.suffix(info.name) {
            register(info.name, lower_first(suffix));
        }
    }
    actors
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect;

    struct Store {
        name: &'static str,
    }

    introspect! {
        impl Store {
            fn mpi_list(&self, _ctx: &Context, m: Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
                Ok(m.with_attr("store", self.name)
                    .with_attr("options", opts.len().to_string()))
            }

            #[allow(non_snake_case)]
            fn mpi_Find(&self, _ctx: &Context, m: Meta, _opts: &[Meta]) -> Result<Meta, ActorError> {
                Ok(m.with_gid("found"))
            }

            fn mpi_broken(&self, _ctx: &Context, count: usize, _opts: &[Meta]) -> Result<Meta, ActorError> {
                Err(ActorError::failed(count.to_string()))
            }

            fn fetch(&self, _ctx: &Context, _m: Meta, _opts: &[Meta]) -> Result<Meta, ActorError> {
                Err(ActorError::failed("fetch failed"))
            }
        }
    }

    fn store() -> Arc<Store> {
        Arc::new(Store { name: "main" })
    }

    #[test]
    fn test_build_identity() {
        let actor = ReflectActor::build(store(), "Item", "mpi_list");
        let meta = actor.meta();
        assert_eq!(meta.kind(), ACTOR_KIND);
        assert_eq!(meta.method(), "list");
        assert_eq!(meta.tag(TARGET), "Item");
        assert_eq!(actor.method_name(), "mpi_list");
    }

    #[test]
    fn test_process_forwards_everything() {
        let actor = ReflectActor::build(store(), "Item", "mpi_list");
        let out = actor
            .process(
                &Context::background(),
                Meta::new("Item"),
                &[Meta::new("A"), Meta::new("B"), Meta::new("C")],
            )
            .unwrap();
        assert_eq!(out.attr("store"), "main");
        assert_eq!(out.attr("options"), "3");

        let err = ReflectActor::build(store(), "Item", "fetch")
            .process(&Context::background(), Meta::new("Item"), &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "fetch failed");
    }

    #[test]
    #[should_panic(expected = "Store::mpi_broken parameter 2 is usize, expected Meta")]
    fn test_build_panics_on_contract_violation() {
        ReflectActor::build(store(), "Item", "mpi_broken");
    }

    #[test]
    fn test_try_build_reports_missing() {
        let err = ReflectActor::try_build(store(), "Item", "mpi_nothing").unwrap_err();
        assert!(matches!(err, ContractViolation::MissingMethod { .. }));
    }

    #[test]
    fn test_scan_skips_violations() {
        let actors = reflect_actors(store(), "Item", &ScanConfig::default());
        let verbs: Vec<_> = actors.iter().map(|a| a.meta().method().to_string()).collect();
        assert_eq!(verbs, vec!["list", "find"]);
    }

    #[test]
    fn test_explicit_names_first() {
        let config = ScanConfig::default().with_names(["fetch", "missing", "mpi_broken", "fetch"]);
        let actors = reflect_actors(store(), "Item", &config);
        let verbs: Vec<_> = actors.iter().map(|a| a.meta().method().to_string()).collect();
        assert_eq!(verbs, vec!["fetch", "list", "find"]);
    }
}
