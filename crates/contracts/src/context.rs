//! Context - cancellation and deadline carried by every sink operation

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::ContractError;

/// Cancellable, deadline-bearing execution context
///
/// Cancelling a context cancels every context derived from it. A derived
/// context never outlives its parent's deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Derived context sharing this context's deadline
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derived context that expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derived context that expires at `deadline` (or earlier, if the parent does)
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every context derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Error describing why the context ended, or `None` while it is live
    pub fn err(&self) -> Option<ContractError> {
        if self.token.is_cancelled() {
            return Some(ContractError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContractError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context ends, yielding the matching error
    ///
    /// Pends forever for a background context.
    pub async fn done(&self) -> ContractError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => ContractError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContractError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContractError::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_propagates_to_children() {
        let parent = Context::background();
        let child = parent.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        parent.cancel();

        assert!(matches!(child.err(), Some(ContractError::Cancelled)));
        assert!(matches!(grandchild.err(), Some(ContractError::Cancelled)));
    }

    #[test]
    fn test_child_cancel_does_not_touch_parent() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert!(parent.err().is_none());
    }

    #[test]
    fn test_child_deadline_never_exceeds_parent() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn test_done_reports_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        let err = ctx.done().await;
        assert!(matches!(err, ContractError::DeadlineExceeded));
        assert!(matches!(ctx.err(), Some(ContractError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_done_reports_cancellation() {
        let ctx = Context::background().with_timeout(Duration::from_secs(60));
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });
        ctx.cancel();
        let err = handle.await.unwrap();
        assert!(matches!(err, ContractError::Cancelled));
    }
}
