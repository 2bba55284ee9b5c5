//! Per-call deadlines and cancellation.
//!
//! Every helper request runs under a [`CallContext`]. The orchestrator itself
//! never picks a deadline; the caller does. A deadline is an absolute instant
//! fixed when the context is built, so it bounds every request made under the
//! context together, not each request on its own.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{MountError, MountResult};

/// Deadline and cancellation handle threaded through every helper call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    budget: Option<Duration>,
    cancel: CancellationToken,
}

impl CallContext {
    /// Context with no deadline and a fresh, never-cancelled token.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Expire the context `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self.budget = Some(timeout);
        self
    }

    /// Expire the context at `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self.budget = Some(deadline.saturating_duration_since(Instant::now()));
        self
    }

    /// Use `token` for cancellation, typically a child of the caller's token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The time the context was given when its deadline was set, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.budget
    }

    /// The instant the context expires, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `fut`, racing it against the deadline and the cancellation token.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::Cancelled`] or [`MountError::DeadlineExceeded`]
    /// when the context fires first, otherwise whatever `fut` yields.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> MountResult<T>
    where
        F: Future<Output = MountResult<T>>,
    {
        if self.cancel.is_cancelled() {
            tracing::debug!(operation, "Context already cancelled");
            return Err(MountError::Cancelled {
                operation: operation.to_string(),
            });
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut).await.map_err(|_| {
                    let timeout = self.budget.unwrap_or_default();
                    tracing::debug!(operation, ?timeout, "Deadline exceeded");
                    MountError::DeadlineExceeded {
                        operation: operation.to_string(),
                        timeout,
                    }
                })?,
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                tracing::debug!(operation, "Cancelled while waiting");
                Err(MountError::Cancelled {
                    operation: operation.to_string(),
                })
            }
            result = bounded => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_result() {
        let ctx = CallContext::background();
        let value = ctx.run("PathExists", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);

        let err = ctx
            .run::<(), _>("Mkdir", async {
                Err(MountError::transport("closed"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MountError::Transport { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires() {
        let ctx = CallContext::background().with_timeout(Duration::from_millis(50));
        let err = ctx
            .run("IsMountPoint", async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(true)
            })
            .await
            .unwrap_err();
        match err {
            MountError::DeadlineExceeded { operation, timeout } => {
                assert_eq!(operation, "IsMountPoint");
                assert_eq!(timeout, Duration::from_millis(50));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_spans_consecutive_runs() {
        let ctx = CallContext::background().with_timeout(Duration::from_secs(5));
        let step = || async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(())
        };

        ctx.run("PathExists", step()).await.unwrap();
        let err = ctx.run("Mkdir", step()).await.unwrap_err();
        match err {
            MountError::DeadlineExceeded { operation, timeout } => {
                assert_eq!(operation, "Mkdir");
                assert_eq!(timeout, Duration::from_secs(5));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_deadline() {
        let deadline = Instant::now() + Duration::from_secs(2);
        let ctx = CallContext::background().with_deadline(deadline);
        assert_eq!(ctx.deadline(), Some(deadline));
        assert_eq!(ctx.timeout(), Some(Duration::from_secs(2)));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let err = ctx.run("LinkPath", async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, MountError::DeadlineExceeded { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let token = CancellationToken::new();
        let ctx = CallContext::background().with_cancellation(token.clone());
        token.cancel();
        assert!(ctx.is_cancelled());

        let err = ctx.run("Rmdir", async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, MountError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn cancelled_while_waiting() {
        let token = CancellationToken::new();
        let ctx = CallContext::background().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move { token.cancel() });
        let err = ctx
            .run("NewSmbGlobalMapping", std::future::pending::<MountResult<()>>())
            .await
            .unwrap_err();
        canceller.await.unwrap();
        assert!(matches!(err, MountError::Cancelled { .. }));
    }
}
