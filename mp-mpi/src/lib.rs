//! HTTP surface for mp domains
//!
//! [`mount`] exposes a [`Domain`](mp_domain::Domain) as a single
//! `POST /call` route. The body names a method, the input meta and the
//! options:
//!
//! ```json
//! { "method": "list", "meta": { "kind": "Item" }, "options": [] }
//! ```
//!
//! The reply is the result meta, or an `Error` meta with a matching status:
//! 404 when no actor serves the method, the error's own `code` when a
//! handler returned one, 400 otherwise.
//!
//! [`LocalMpi`] drives the same router in process, which keeps the JSON
//! codec honest without opening a socket.

mod error;
mod local;
mod mount;
mod request;

pub use error::MpiError;
pub use local::LocalMpi;
pub use mount::{mount, mount_with, status_for, MountConfig};
pub use request::{request_body, Request};
