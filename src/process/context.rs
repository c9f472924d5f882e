// src/process/context.rs

use core::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

/// Why a context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Done {
    /// `cancel` was called on this context or an ancestor.
    Cancelled,
    /// The deadline of this context or an ancestor passed.
    DeadlineExceeded,
}

impl fmt::Display for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Done::Cancelled => f.write_str("context cancelled"),
            Done::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

/// A cancellable lifetime shared by cooperating tasks.
///
/// Contexts form a tree: cancelling a context cancels every context derived
/// from it, never its parent. A deadline behaves exactly like a cancellation
/// that fires on its own. Cloning yields a handle to the same context.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<Option<Done>>,
    deadline: Option<Instant>,
    parent: Option<Context>,
}

impl Context {
    /// A root context that is never done unless cancelled.
    pub fn background() -> Self {
        Self::new(None, None)
    }

    fn new(parent: Option<Context>, deadline: Option<Instant>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                state,
                deadline,
                parent,
            }),
        }
    }

    /// A context cancelled together with `self`, and separately cancellable.
    pub fn child(&self) -> Self {
        Self::new(Some(self.clone()), self.inner.deadline)
    }

    /// A child that is additionally done at `deadline`.
    ///
    /// The effective deadline never extends beyond the parent's.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let effective = match self.inner.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self::new(Some(self.clone()), Some(effective))
    }

    /// A child that is additionally done `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Cancels this context and everything derived from it. Idempotent; the
    /// first reason recorded sticks.
    pub fn cancel(&self) {
        let reason = self.done_reason().unwrap_or(Done::Cancelled);
        self.inner.state.send_if_modified(|state| {
            if state.is_none() {
                *state = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn is_done(&self) -> bool {
        self.done_reason().is_some()
    }

    /// `None` while the context is live.
    pub fn done_reason(&self) -> Option<Done> {
        if let Some(reason) = *self.inner.state.borrow() {
            return Some(reason);
        }
        if self.deadline_passed() {
            return Some(Done::DeadlineExceeded);
        }
        self.inner.parent.as_ref().and_then(Context::done_reason)
    }

    fn deadline_passed(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves once the context is done. Cancel safe.
    pub fn cancelled(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.inner.state.subscribe();
            let own = async {
                // The sender lives as long as `self`, so this cannot fail.
                let _ = state.wait_for(Option::is_some).await;
            };
            let deadline = async {
                match self.inner.deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };
            let parent = async {
                match &self.inner.parent {
                    Some(parent) => parent.cancelled().await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = own => {}
                _ = deadline => {}
                _ = parent => {}
            }
        })
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("done", &self.done_reason())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}
