//! Hierarchical (kind, method) dispatch for mp
//!
//! Business logic lives in [`Actor`]s: small handler units, each serving one
//! method on one kind of [`Meta`]. Actors are grouped into [`Domain`]s, and
//! domains nest into a tree. Calling a domain routes the input to the right
//! actor anywhere below it:
//!
//! ```text
//!            root ── Item.list (own, shadows below)
//!           /    \
//!      orders    catalog ── Item.list, Item.find
//!        │
//!      Order.create
//! ```
//!
//! # Core Concepts
//!
//! ## Actors
//!
//! - [`BaseActor`] holds an identity only; [`FnActor`] pairs one with a
//!   closure.
//! - [`ReflectActor`] wraps one method of an object whose type went through
//!   [`introspect!`]. [`reflect_actors`] discovers all of them by name prefix
//!   (`mpi_` by default, see [`ScanConfig`]).
//!
//! ## Domains and indexers
//!
//! A domain's [`Indexer`] is built once, from its own actors followed by
//! the indexers of its sub-domains in order. For a given `kind.method` the
//! first actor seen wins, so a domain overrides anything below it.
//!
//! # Example
//!
//! ```
//! use mp_domain::{introspect, ActorError, Context, Domain, ScanConfig};
//! use mp_meta::Meta;
//! use std::sync::Arc;
//!
//! struct Catalog;
//!
//! introspect! {
//!     impl Catalog {
//!         fn mpi_list(&self, _ctx: &Context, m: Meta, _opts: &[Meta]) -> Result<Meta, ActorError> {
//!             Ok(m.with_list([Meta::new("Item").with_gid("i1")]))
//!         }
//!     }
//! }
//!
//! let catalog = Domain::new(Meta::of("Domain", "", "catalog", ""))
//!     .with_reflected(Arc::new(Catalog), "Item", &ScanConfig::default());
//! let root = Domain::new(Meta::new("Domain")).with_subs([catalog]);
//!
//! let ctx = Context::background();
//! let items = root.list(&ctx, Meta::new("Item"), &[]).unwrap();
//! assert_eq!(items.list_item(0).gid(), "i1");
//!
//! let err = root.call(&ctx, "bogus", Meta::new("Item"), &[]).unwrap_err();
//! assert!(err.is_not_found());
//! ```

mod actor;
mod config;
mod context;
mod domain;
mod error;
mod indexer;
pub mod introspect;
mod reflect;

pub use actor::{Actor, BaseActor, FnActor, ACTOR_KIND, TARGET};
pub use config::{DomainConfig, IndexBuilder, InfoBuilder, ScanConfig};
pub use context::Context;
pub use domain::Domain;
pub use error::{ActorError, ContractViolation};
pub use indexer::{routing_kind, Indexer};
pub use introspect::{Handler, Introspect, MethodInfo, ParamKind, Signature};
pub use reflect::{reflect_actors, ReflectActor};
