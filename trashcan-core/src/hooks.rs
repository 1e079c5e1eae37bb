//! Lifecycle hooks around trash and recover.
//!
//! Each transition owns a [`HookChain`] of named handlers:
//!
//! 1. `before` handlers, in registration order;
//! 2. `around` handlers wrapping the writes, the first registered outermost;
//! 3. `after` handlers, in registration order, once the writes are committed.
//!
//! A `before` or `after` handler stops the call by returning a [`HookAbort`].
//! An `around` handler stops it by returning an error (see
//! [`HookContext::abort`]) or by not driving `next` to completion.
//!
//! `around` handlers run while the write transaction is open. On a store
//! with a single connection (such as `trashcan-test`'s `TestDb`) a handler
//! that issues its own store query waits on that connection forever.

use crate::error::TrashError;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Abort reason for an `around` handler that never ran the wrapped operation.
pub const NOT_RUN: &str = "did not run the wrapped operation";

/// The two state transitions of a trashable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Trash,
    Recover,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Trash => f.write_str("trash"),
            Transition::Recover => f.write_str("recover"),
        }
    }
}

/// What a hook knows about the call it is part of.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub model: &'static str,
    pub table: &'static str,
    pub id: String,
    pub transition: Transition,
    pub marker_column: String,
}

impl HookContext {
    /// Error an `around` handler returns to cancel the call.
    pub fn abort(&self, reason: impl Into<String>) -> TrashError {
        TrashError::HookAbort {
            hook: String::new(),
            transition: self.transition,
            reason: reason.into(),
        }
    }
}

/// Returned by a `before`/`after` handler to cancel the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookAbort {
    pub reason: String,
}

impl HookAbort {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The rest of the chain, handed to an `around` handler.
pub struct Next<'a> {
    run: Box<dyn FnOnce() -> BoxFuture<'a, Result<(), TrashError>> + Send + 'a>,
}

impl<'a> Next<'a> {
    pub fn new(run: impl FnOnce() -> BoxFuture<'a, Result<(), TrashError>> + Send + 'a) -> Self {
        Self { run: Box::new(run) }
    }

    /// Run the inner handlers and the writes.
    pub fn run(self) -> BoxFuture<'a, Result<(), TrashError>> {
        (self.run)()
    }
}

/// Handler wrapping the writes of a transition.
///
/// Implemented for every `Fn(HookContext, Next<'a>) -> BoxFuture<'a, ..>` closure:
///
/// ```ignore
/// config.around_trash("timing", |ctx, next| {
///     async move {
///         let started = Instant::now();
///         let result = next.run().await;
///         tracing::info!(id = %ctx.id, elapsed = ?started.elapsed(), "trashed");
///         result
///     }
///     .boxed()
/// })
/// ```
pub trait AroundHook: Send + Sync {
    fn around<'a>(&'a self, ctx: HookContext, next: Next<'a>) -> BoxFuture<'a, Result<(), TrashError>>;
}

impl<F> AroundHook for F
where
    F: for<'a> Fn(HookContext, Next<'a>) -> BoxFuture<'a, Result<(), TrashError>> + Send + Sync,
{
    fn around<'a>(&'a self, ctx: HookContext, next: Next<'a>) -> BoxFuture<'a, Result<(), TrashError>> {
        self(ctx, next)
    }
}

type Callback = dyn Fn(&HookContext) -> Result<(), HookAbort> + Send + Sync;

struct Named<T: ?Sized> {
    name: String,
    hook: Box<T>,
}

/// Ordered `before`, `around` and `after` handlers of one transition.
#[derive(Default)]
pub struct HookChain {
    before: Vec<Named<Callback>>,
    around: Vec<Named<dyn AroundHook>>,
    after: Vec<Named<Callback>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&HookContext) -> Result<(), HookAbort> + Send + Sync + 'static,
    {
        self.before.push(Named {
            name: name.into(),
            hook: Box::new(hook),
        });
    }

    pub fn around<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: for<'a> Fn(HookContext, Next<'a>) -> BoxFuture<'a, Result<(), TrashError>> + Send + Sync + 'static,
    {
        self.around.push(Named {
            name: name.into(),
            hook: Box::new(hook),
        });
    }

    pub fn after<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&HookContext) -> Result<(), HookAbort> + Send + Sync + 'static,
    {
        self.after.push(Named {
            name: name.into(),
            hook: Box::new(hook),
        });
    }

    /// Handler names in execution order, prefixed by their kind.
    pub fn names(&self) -> Vec<String> {
        let before = self.before.iter().map(|h| format!("before:{}", h.name));
        let around = self.around.iter().map(|h| format!("around:{}", h.name));
        let after = self.after.iter().map(|h| format!("after:{}", h.name));
        before.chain(around).chain(after).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.around.is_empty() && self.after.is_empty()
    }

    /// Name of the first registered `around` handler, which runs outermost.
    pub fn outermost_around(&self) -> Option<&str> {
        self.around.first().map(|h| h.name.as_str())
    }

    pub(crate) fn run_before(&self, ctx: &HookContext) -> Result<(), TrashError> {
        run_callbacks(&self.before, ctx)
    }

    pub(crate) fn run_after(&self, ctx: &HookContext) -> Result<(), TrashError> {
        run_callbacks(&self.after, ctx)
    }

    /// Nest the `around` handlers over `body` and run the result.
    pub(crate) fn run_around<'a>(&'a self, ctx: &HookContext, body: Next<'a>) -> BoxFuture<'a, Result<(), TrashError>> {
        let mut next = body;
        for named in self.around.iter().rev() {
            let ctx = ctx.clone();
            let inner = next;
            next = Next::new(move || wrap(named, ctx, inner));
        }
        next.run()
    }
}

fn wrap<'a>(named: &'a Named<dyn AroundHook>, ctx: HookContext, inner: Next<'a>) -> BoxFuture<'a, Result<(), TrashError>> {
    async move {
        let transition = ctx.transition;
        let yielded = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&yielded);
        let guarded = Next::new(move || {
            async move {
                flag.store(true, Ordering::SeqCst);
                inner.run().await
            }
            .boxed()
        });

        named
            .hook
            .around(ctx, guarded)
            .await
            .map_err(|err| err.attribute_to(&named.name))?;

        if !yielded.load(Ordering::SeqCst) {
            return Err(TrashError::HookAbort {
                hook: named.name.clone(),
                transition,
                reason: NOT_RUN.to_string(),
            });
        }
        Ok(())
    }
    .boxed()
}

fn run_callbacks(hooks: &[Named<Callback>], ctx: &HookContext) -> Result<(), TrashError> {
    for named in hooks {
        (named.hook)(ctx).map_err(|abort| TrashError::HookAbort {
            hook: named.name.clone(),
            transition: ctx.transition,
            reason: abort.reason,
        })?;
    }
    Ok(())
}
