//! Attributed trees for mp
//!
//! A [`Meta`] is the single value type that flows through every call: it is
//! the input of a call, its output, and the identity of the actor that
//! handles it. Each node carries an [`Info`] part (kind, method, namespace,
//! global id, tags, attributes, payload) plus named sub-trees, named
//! relations and an ordered list of items.
//!
//! Metas are immutable. Every `with_*` method returns a new value that shares
//! all untouched substructure with the receiver, or the receiver itself when
//! the update would not change anything:
//!
//! ```
//! use mp_meta::Meta;
//!
//! let order = Meta::new("Order").with_tag("status", "open");
//! let same = order.with_tag("status", "open");
//! assert!(Meta::ptr_eq(&order, &same));
//!
//! let routed = order.with_tag("region", "us");
//! assert!(!order.has_tag("region"));
//! assert!(order.generalizes(&routed));
//! ```
//!
//! The value with an empty kind is the canonical nil ([`Meta::nil`]). All
//! accessors on it answer with empty values and all mutators return it
//! unchanged.

mod error;
mod info;
pub mod json;
mod meta;
mod walk;

pub use error::{AttrError, ERROR_KIND};
pub use info::{Info, UTC_DATE_FORMAT, UTC_TIME_FORMAT};
pub use json::{jsons_to_metas, metas_to_jsons, parse_meta, struct_to_attrs, MetaJson};
pub use meta::{first, first_attr, first_is, Meta};
pub use walk::{walk, Visitor};
