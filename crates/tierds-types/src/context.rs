use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Interrupted;

/// Cancellation and deadline for one logical request.
///
/// A `Context` is cheap to clone and is passed by reference into every store
/// call. Derived contexts ([`child`](Self::child), [`with_timeout`](Self::with_timeout))
/// are cancelled when their parent is, but cancelling a child leaves the
/// parent untouched.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context driven by an existing cancellation token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context that is cancelled along with this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child whose deadline is at most `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child with the earlier of `deadline` and the current deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<Interrupted> {
        if self.token.is_cancelled() {
            return Some(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupted::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Ok(())` while the context is live.
    pub fn check(&self) -> Result<(), Interrupted> {
        match self.err() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Drive `fut` to completion unless the context finishes first.
    ///
    /// Cancellation wins ties, so an already-cancelled context never polls
    /// `fut`.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        self.check()?;
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Interrupted::Cancelled),
            _ = expired => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_live() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_propagates_to_children_only() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert_eq!(child.err(), Some(Interrupted::Cancelled));
        assert!(parent.err().is_none());

        let other = parent.child();
        parent.cancel();
        assert_eq!(other.err(), Some(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn run_returns_output() {
        let ctx = Context::background();
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn run_on_cancelled_context_does_not_poll() {
        let ctx = Context::background();
        ctx.cancel();
        let out = ctx
            .run(async { panic!("future must not be polled") })
            .await;
        assert_eq!(out, Err::<(), _>(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_future() {
        let ctx = Context::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let out = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(out, Err(Interrupted::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_pending_future() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let out = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(out, Err(Interrupted::DeadlineExceeded));
        assert_eq!(ctx.err(), Some(Interrupted::DeadlineExceeded));
    }

    #[tokio::test]
    async fn with_deadline_keeps_earlier_deadline() {
        let near = Context::background().with_timeout(Duration::from_secs(1));
        let far = near.with_timeout(Duration::from_secs(60));
        assert_eq!(far.deadline(), near.deadline());
    }
}
