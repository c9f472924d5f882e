// src/process/group.rs

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use tokio::task::JoinSet;

use super::context::Context;
use crate::common::Error;

/// Runs sibling tasks under one cancellable lifetime.
///
/// The first task to fail cancels the group's context, which every task
/// started with [`ProcessGroup::start`] observes. [`ProcessGroup::wait`]
/// returns only after every task has returned, with the first recorded error.
///
/// Tasks are spawned on the current tokio runtime, so the group must be used
/// from within one.
pub struct ProcessGroup {
    ctx: Context,
    tasks: JoinSet<()>,
    first_error: Arc<Mutex<Option<Error>>>,
}

impl ProcessGroup {
    /// Creates a group whose context is a child of `parent`.
    pub fn new(parent: &Context) -> Self {
        Self {
            ctx: parent.child(),
            tasks: JoinSet::new(),
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    /// The group's shared context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Starts `task` with the group context.
    pub fn start<F, Fut>(&mut self, task: F)
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let fut = task(self.ctx.clone());
        self.go(fut);
    }

    /// Starts a one-shot task that does not need the context. A failure still
    /// cancels the group.
    pub fn go<Fut>(&mut self, task: Fut)
    where
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let ctx = self.ctx.clone();
        let first_error = Arc::clone(&self.first_error);
        self.tasks.spawn(async move {
            if let Err(e) = task.await {
                debug!("process group task failed: {}", e);
                {
                    let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
                ctx.cancel();
            }
        });
    }

    /// Waits for every task, then cancels the group context.
    ///
    /// A panicking task cancels its siblings and the panic is resumed here.
    pub async fn wait(mut self) -> Result<(), Error> {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    self.ctx.cancel();
                    std::panic::resume_unwind(e.into_panic());
                }
            }
        }
        self.ctx.cancel();
        let first = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
