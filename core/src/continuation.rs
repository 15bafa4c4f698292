//! Continuation - The Cooperative Cancellation Gate
//!
//! The owning transition manager supplies a `Continuation`; the resolver
//! consults it between steps. A rejection is the only way to cancel a pass.

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

/// Permission check consulted before a transition advances.
///
/// `Ok(())` lets the pass continue; any `Err` aborts it.
#[async_trait]
pub trait Continuation: Send + Sync {
    async fn check(&self) -> anyhow::Result<()>;
}

/// A continuation that never rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysContinue;

#[async_trait]
impl Continuation for AlwaysContinue {
    async fn check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Adapts an async closure into a [`Continuation`].
#[derive(Clone)]
pub struct FnContinuation<F>(F);

/// Build a continuation from a closure returning a future.
///
/// ```rust,ignore
/// let superseded = Arc::new(AtomicBool::new(false));
/// let flag = superseded.clone();
/// let check = continue_fn(move || {
///     let flag = flag.clone();
///     async move {
///         anyhow::ensure!(!flag.load(Ordering::SeqCst), "transition superseded");
///         Ok(())
///     }
/// });
/// ```
pub fn continue_fn<F, Fut>(f: F) -> FnContinuation<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    FnContinuation(f)
}

#[async_trait]
impl<F, Fut> Continuation for FnContinuation<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn check(&self) -> anyhow::Result<()> {
        (self.0)().await
    }
}

/// Wraps the caller's continuation and remembers whether it ever rejected.
///
/// Once set, the flag stays set for the lifetime of the guard, no matter
/// how the rejection is later reported by a segment record.
pub struct AbortGuard<'a> {
    inner: &'a dyn Continuation,
    aborted: AtomicBool,
}

impl<'a> AbortGuard<'a> {
    pub fn new(inner: &'a dyn Continuation) -> Self {
        Self {
            inner,
            aborted: AtomicBool::new(false),
        }
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Continuation for AbortGuard<'_> {
    async fn check(&self) -> anyhow::Result<()> {
        let result = self.inner.check().await;
        if result.is_err() {
            self.aborted.store(true, Ordering::SeqCst);
        }
        result
    }
}
