//! Middleware
//!
//! Middleware wraps dispatch. Given middlewares `[m1, m2, ..., mn]`,
//! dispatching `a` evaluates `m1(api, next = m2 ∘ ... ∘ mn ∘ reduce)(a)`.
//!
//! A middleware may:
//!
//! - forward the action unchanged with `next.run(action)`
//! - forward a different action
//! - swallow the action by never calling `next`
//! - run code before and after `next`; after `next` returns, the reducer has
//!   run and subscribers have been notified
//!
//! [`Next`] is consumed by `run`, so the rest of the chain runs at most once
//! per middleware invocation.
//!
//! # Async work
//!
//! Middleware runs on the dispatching thread while the store's writer lock is
//! held. Long work belongs on a task: clone the store (or a
//! [`DispatchQueue`](super::DispatchQueue)) through [`MiddlewareApi::store`]
//! and dispatch the follow-up action when the work completes.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::action::Action;
use super::container::Store;
use crate::error::StoreResult;

/// A dispatch interceptor.
pub trait Middleware<S, A>: Send + Sync {
    /// Handle `action`, usually by calling `next.run(action)`.
    fn handle(&self, api: &MiddlewareApi<'_, S, A>, action: A, next: Next<'_, S, A>);
}

/// What a middleware can see of the store.
pub struct MiddlewareApi<'a, S, A> {
    store: &'a Store<S, A>,
}

impl<'a, S, A> MiddlewareApi<'a, S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Current state.
    pub fn state(&self) -> Arc<S> {
        self.store.state()
    }

    /// Number of reductions applied so far.
    pub fn version(&self) -> u64 {
        self.store.version()
    }

    /// Label from the store's config.
    pub fn label(&self) -> &str {
        self.store.label()
    }

    /// Dispatch another action through the whole chain.
    ///
    /// The action is deferred until the current dispatch has finished
    /// notifying subscribers.
    pub fn dispatch(&self, action: A) -> StoreResult<()> {
        self.store.dispatch(action)
    }

    /// An owned handle to the store, for work that outlives this call.
    pub fn store(&self) -> Store<S, A> {
        self.store.clone()
    }
}

/// The remainder of the chain, ending in the reducer.
pub struct Next<'a, S, A> {
    store: &'a Store<S, A>,
    chain: &'a [Arc<dyn Middleware<S, A>>],
    terminal: &'a dyn Fn(A),
}

impl<'a, S, A> Next<'a, S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn new(
        store: &'a Store<S, A>,
        chain: &'a [Arc<dyn Middleware<S, A>>],
        terminal: &'a dyn Fn(A),
    ) -> Self {
        Self {
            store,
            chain,
            terminal,
        }
    }

    /// Hand `action` to the next middleware, or to the reducer if this is the
    /// end of the chain.
    pub fn run(self, action: A) {
        match self.chain.split_first() {
            Some((head, rest)) => {
                let api = MiddlewareApi { store: self.store };
                head.handle(&api, action, Next::new(self.store, rest, self.terminal));
            }
            None => (self.terminal)(action),
        }
    }
}

// ----------------------------------------------------------------------------
// Built-in middleware
// ----------------------------------------------------------------------------

/// Adapter turning a closure into a [`Middleware`]. See [`from_fn`].
pub struct FnMiddleware<F>(F);

/// Build a middleware from a closure.
///
/// ```rust,ignore
/// let audit = middleware::from_fn(|api, action, next| {
///     tracing::info!(before = api.version(), "audit");
///     next.run(action);
/// });
/// ```
pub fn from_fn<S, A, F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&MiddlewareApi<'_, S, A>, A, Next<'_, S, A>) + Send + Sync,
{
    FnMiddleware(f)
}

impl<S, A, F> Middleware<S, A> for FnMiddleware<F>
where
    F: Fn(&MiddlewareApi<'_, S, A>, A, Next<'_, S, A>) + Send + Sync,
{
    fn handle(&self, api: &MiddlewareApi<'_, S, A>, action: A, next: Next<'_, S, A>) {
        (self.0)(api, action, next)
    }
}

/// Logs every action with the version transition and the time the rest of
/// the chain took.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl<S, A> Middleware<S, A> for LoggingMiddleware
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn handle(&self, api: &MiddlewareApi<'_, S, A>, action: A, next: Next<'_, S, A>) {
        let kind = action.kind();
        let before = api.version();
        let started = Instant::now();

        debug!(store = api.label(), action = kind, version = before, "dispatching");

        next.run(action);

        debug!(
            store = api.label(),
            action = kind,
            from = before,
            to = api.version(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "dispatched"
        );
    }
}
