//! Transport errors

use mp_domain::ActorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MpiError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build request: {0}")]
    Http(#[from] axum::http::Error),

    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),

    #[error("call timed out")]
    Timeout,

    #[error("call cancelled")]
    Cancelled,
}

impl From<MpiError> for ActorError {
    fn from(err: MpiError) -> Self {
        ActorError::Other(err.into())
    }
}
