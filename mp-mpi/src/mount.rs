//! The `/call` route

use crate::request::Request;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use mp_domain::{ActorError, Context, Domain};
use mp_meta::Meta;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

/// Where the call route is mounted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    /// Path prefix, empty or starting with `/`
    #[serde(default)]
    pub prefix: String,
}

impl MountConfig {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn call_path(&self) -> String {
        format!("{}/call", self.prefix.trim_end_matches('/'))
    }
}

/// Router serving `POST /call` for `domain`
pub fn mount(domain: Domain) -> Router {
    mount_with(domain, &MountConfig::default())
}

pub fn mount_with(domain: Domain, config: &MountConfig) -> Router {
    Router::new()
        .route(&config.call_path(), post(call))
        .layer(TraceLayer::new_for_http())
        .with_state(domain)
}

/// Status for a failed call
pub fn status_for(err: &ActorError) -> StatusCode {
    match err {
        ActorError::NotFound { .. } => StatusCode::NOT_FOUND,
        ActorError::Meta(m) => u16::try_from(m.error_code(400))
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .filter(|status| status.is_client_error() || status.is_server_error())
            .unwrap_or(StatusCode::BAD_REQUEST),
        _ => StatusCode::BAD_REQUEST,
    }
}

async fn call(State(domain): State<Domain>, body: Bytes) -> Response {
    let req: Request = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(err) => {
            tracing::warn!("Malformed call request: {}", err);
            let status = StatusCode::BAD_REQUEST;
            return reply(status, Meta::ajax_error(400, err.to_string(), []));
        }
    };

    let (method, m, opts) = req.unpack();
    tracing::info!(method = %method, kind = m.kind(), ns = m.ns(), "Call");

    // Handlers are synchronous and may block
    let result = tokio::task::spawn_blocking(move || {
        domain.call(&Context::background(), &method, m, &opts)
    })
    .await;

    match result {
        Ok(Ok(ret)) => {
            tracing::debug!(kind = ret.kind(), list = ret.list().len(), "Result");
            reply(StatusCode::OK, ret)
        }
        Ok(Err(err)) => {
            let status = status_for(&err);
            tracing::warn!(status = status.as_u16(), "Call failed: {}", err);
            reply(status, err.to_meta(i64::from(status.as_u16())))
        }
        Err(err) => {
            tracing::error!("Call task panicked: {}", err);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            reply(status, Meta::ajax_error(500, format!("Task join error: {}", err), []))
        }
    }
}

fn reply(status: StatusCode, m: Meta) -> Response {
    (status, Json(m)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request as HttpRequest};
    use mp_domain::{Actor, BaseActor};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn sample_domain() -> Domain {
        let lister = BaseActor::lister("Item")
            .handle(|_ctx, m, _opts| Ok(m.with_list([Meta::new("Item").with_gid("i1")])));
        let finder = BaseActor::finder("Item")
            .handle(|_ctx, _m, _opts| Err(Meta::ajax_error(409, "conflict", []).into()));
        Domain::new(Meta::new("Domain")).with_actors([
            Arc::new(lister) as Arc<dyn Actor>,
            Arc::new(finder) as Arc<dyn Actor>,
        ])
    }

    async fn post_call(app: Router, path: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = HttpRequest::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn call_returns_result_meta() {
        let app = mount(sample_domain());
        let (status, value) =
            post_call(app, "/call", r#"{"method": "list", "meta": {"kind": "Item"}}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["kind"], "Item");
        assert_eq!(value["list"][0]["gid"], "i1");
    }

    #[tokio::test]
    async fn missing_actor_is_404() {
        let app = mount(sample_domain());
        let (status, value) =
            post_call(app, "/call", r#"{"method": "make", "meta": {"kind": "Item"}}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(value["kind"], "Error");
        assert_eq!(value["attrs"]["code"], "404");
        assert_eq!(value["attrs"]["message"], "Actor make for Item not found");
    }

    #[tokio::test]
    async fn error_meta_code_becomes_status() {
        let app = mount(sample_domain());
        let (status, value) =
            post_call(app, "/call", r#"{"method": "find", "meta": {"kind": "Item"}}"#).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(value["attrs"]["message"], "conflict");
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let app = mount(sample_domain());
        let (status, value) = post_call(app, "/call", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["kind"], "Error");
        assert_eq!(value["attrs"]["code"], "400");
    }

    #[tokio::test]
    async fn prefix_moves_the_route() {
        let config = MountConfig::with_prefix("/mpi/");
        assert_eq!(config.call_path(), "/mpi/call");
        let app = mount_with(sample_domain(), &config);
        let (status, _) =
            post_call(app, "/mpi/call", r#"{"method": "list", "meta": {"kind": "Item"}}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_for(&ActorError::not_found("x", "Y")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ActorError::Meta(Meta::ajax_error(503, "down", []))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ActorError::Meta(Meta::ajax_error(200, "odd", []))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ActorError::Meta(Meta::error("no code", []))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&ActorError::failed("x")), StatusCode::BAD_REQUEST);
    }
}
