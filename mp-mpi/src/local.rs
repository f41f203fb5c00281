//! In-process proxy speaking the `/call` protocol

use crate::error::MpiError;
use crate::mount::{mount_with, MountConfig};
use crate::request::request_body;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request as HttpRequest, StatusCode},
    Router,
};
use mp_domain::{ActorError, Context, Domain};
use mp_meta::{parse_meta, Meta};
use tower::ServiceExt;

/// Response bodies larger than this are rejected
const MAX_BODY: usize = 16 * 1024 * 1024;

/// Calls a mounted router without a network.
///
/// Every call is serialized, routed through the router exactly like an HTTP
/// request would be, and the response decoded back into a [`Meta`]. Useful
/// for exercising the wire format end to end in tests and for embedding.
#[derive(Clone)]
pub struct LocalMpi {
    router: Router,
    config: MountConfig,
}

impl LocalMpi {
    /// Proxy for a router mounted with `config`
    pub fn new(router: Router, config: MountConfig) -> Self {
        Self { router, config }
    }

    pub fn for_domain(domain: Domain) -> Self {
        Self::for_domain_with(domain, MountConfig::default())
    }

    pub fn for_domain_with(domain: Domain, config: MountConfig) -> Self {
        Self::new(mount_with(domain, &config), config)
    }

    pub async fn call(
        &self,
        ctx: &Context,
        method: &str,
        m: &Meta,
        opts: &[Meta],
    ) -> Result<Meta, ActorError> {
        if ctx.is_cancelled() {
            return Err(MpiError::Cancelled.into());
        }
        if ctx.is_expired() {
            return Err(MpiError::Timeout.into());
        }

        let request = HttpRequest::builder()
            .method(Method::POST)
            .uri(self.config.call_path())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(request_body(method, m, opts)?))
            .map_err(MpiError::from)?;

        let send = self.router.clone().oneshot(request);
        let bounded = async {
            match ctx.deadline() {
                Some(deadline) => tokio::time::timeout_at(deadline.into(), send)
                    .await
                    .map_err(|_| MpiError::Timeout),
                None => Ok(send.await),
            }
        };
        let response = tokio::select! {
            _ = ctx.token().cancelled() => return Err(MpiError::Cancelled.into()),
            response = bounded => response?,
        };
        let response = response.unwrap_or_else(|never| match never {});

        let status = response.status();
        let body = to_bytes(response.into_body(), MAX_BODY)
            .await
            .map_err(MpiError::from)?;
        tracing::debug!(method, status = status.as_u16(), bytes = body.len(), "Local call");

        let ret = if body.is_empty() {
            Meta::nil()
        } else {
            parse_meta(&body).map_err(MpiError::from)?
        };
        if status.is_success() {
            return Ok(ret);
        }
        Err(remote_error(status, ret))
    }

    pub async fn list(&self, ctx: &Context, m: &Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        self.call(ctx, "list", m, opts).await
    }

    pub async fn find(&self, ctx: &Context, m: &Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        self.call(ctx, "find", m, opts).await
    }

    pub async fn create(&self, ctx: &Context, m: &Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        self.call(ctx, "create", m, opts).await
    }

    pub async fn make(&self, ctx: &Context, m: &Meta, opts: &[Meta]) -> Result<Meta, ActorError> {
        self.call(ctx, "make", m, opts).await
    }
}

impl std::fmt::Debug for LocalMpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMpi")
            .field("call_path", &self.config.call_path())
            .finish()
    }
}

/// Rebuilds the failure reported by the other side
fn remote_error(status: StatusCode, m: Meta) -> ActorError {
    if status == StatusCode::NOT_FOUND && m.has_attr("kind") && m.has_tag("method") {
        return ActorError::not_found(m.tag("method"), m.attr("kind"));
    }
    if m.is_error() {
        return ActorError::Meta(m);
    }
    let reason = status.canonical_reason().unwrap_or("request failed");
    ActorError::Meta(Meta::ajax_error(i64::from(status.as_u16()), reason, []))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_domain::{Actor, BaseActor};
    use std::sync::Arc;
    use std::time::Duration;

    fn echo_domain() -> Domain {
        let creator = BaseActor::creator("Note").handle(|_ctx, m, opts| {
            Ok(m.with_gid("n1").with_list(opts.iter().cloned()))
        });
        Domain::new(Meta::new("Domain")).with_actors([Arc::new(creator) as Arc<dyn Actor>])
    }

    #[tokio::test]
    async fn round_trip_through_router() {
        let mpi = LocalMpi::for_domain(echo_domain());
        let ctx = Context::background();
        let input = Meta::new("Note").with_attr("title", "hello");
        let out = mpi
            .create(&ctx, &input, &[Meta::new("Flag").with_tag("pin", "yes")])
            .await
            .unwrap();
        assert_eq!(out.kind(), "Note");
        assert_eq!(out.gid(), "n1");
        assert_eq!(out.attr("title"), "hello");
        assert_eq!(out.list_item(0).tag("pin"), "yes");
    }

    #[tokio::test]
    async fn not_found_comes_back_typed() {
        let mpi = LocalMpi::for_domain(echo_domain());
        let err = mpi
            .list(&Context::background(), &Meta::new("Note"), &[])
            .await
            .unwrap_err();
        assert!(
            matches!(err, ActorError::NotFound { ref method, ref kind } if method == "list" && kind == "Note")
        );
    }

    #[tokio::test]
    async fn cancelled_context_is_not_sent() {
        let mpi = LocalMpi::for_domain(echo_domain());
        let ctx = Context::background().child();
        ctx.cancel();
        let err = mpi.create(&ctx, &Meta::new("Note"), &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "call cancelled");
    }

    #[tokio::test]
    async fn cancel_interrupts_a_call_in_flight() {
        let slow = BaseActor::maker("Note").handle(|_ctx, m, _opts| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(m)
        });
        let dom = Domain::new(Meta::new("Domain")).with_actors([Arc::new(slow) as Arc<dyn Actor>]);
        let mpi = LocalMpi::for_domain(dom);

        let ctx = Context::background().child();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let err = mpi.make(&ctx, &Meta::new("Note"), &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "call cancelled");
    }

    #[tokio::test]
    async fn expired_deadline_times_out() {
        let mpi = LocalMpi::for_domain(echo_domain());
        let ctx = Context::background().with_timeout(Duration::ZERO);
        let err = mpi.create(&ctx, &Meta::new("Note"), &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "call timed out");
    }

    #[tokio::test]
    async fn wrong_path_reports_status() {
        let router = crate::mount(echo_domain());
        let mpi = LocalMpi::new(router, MountConfig::with_prefix("/elsewhere"));
        let err = mpi
            .create(&Context::background(), &Meta::new("Note"), &[])
            .await
            .unwrap_err();
        match err {
            ActorError::Meta(m) => assert_eq!(m.error_code(0), 404),
            other => panic!("expected an error meta, got {other:?}"),
        }
    }
}
