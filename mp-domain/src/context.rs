//! Call context handed through dispatch to every handler

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Opaque per-call handle.
///
/// Dispatch never inspects it; it only forwards it from [`crate::Domain::call`]
/// to the handler. Handlers may use it to observe cancellation and deadlines.
/// Cloning is cheap and clones observe the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Root context without deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context; cancelling the parent cancels the child, not the
    /// other way around
    pub fn child(&self) -> Self {
        self.derive(self.deadline())
    }

    /// Child context with a deadline no later than `deadline`
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline() {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        self.derive(Some(deadline))
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: self.inner.token.child_token(),
                deadline,
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Token cancelled together with this context, for async work
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Cancelled, or past the deadline
    pub fn is_expired(&self) -> bool {
        self.is_cancelled() || self.deadline().is_some_and(|d| Instant::now() >= d)
    }
}
