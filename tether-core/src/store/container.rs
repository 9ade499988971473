//! Store Implementation
//!
//! The store owns the canonical state value and is the only thing that can
//! replace it.
//!
//! # How Dispatch Works
//!
//! 1. The dispatching thread takes the store's writer lock. Dispatches from
//!    other threads wait here, so reducer applications never interleave.
//!
//! 2. The action runs through the middleware chain in registration order.
//!
//! 3. The terminal step runs the reducer against the current snapshot and
//!    swaps the result in as the new snapshot.
//!
//! 4. Subscribers are notified synchronously, in registration order.
//!
//! 5. Any dispatch issued on this thread while steps 2-4 were running (by a
//!    middleware or a subscriber) was deferred; those actions now run, in
//!    order, before the lock is released.
//!
//! A dispatch issued from inside the reducer is a programming error. Strict
//! stores panic; lenient stores log it and return
//! [`StoreError::ReentrantDispatch`].
//!
//! # Thread Safety
//!
//! The state lives behind an `RwLock<Arc<S>>`. Replacing it is a pointer swap,
//! so readers always see a fully applied value and never hold the lock for
//! longer than an `Arc` clone.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{error, trace, warn};

use super::action::Action;
use super::context::{DispatchContext, Phase};
use super::middleware::{Middleware, Next};
use super::reducer::Reducer;
use super::subscription::{Listeners, Subscription};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Unique identifier for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    /// Generate a new unique store ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

struct Shared<S, A> {
    id: StoreId,
    config: StoreConfig,

    /// The current snapshot.
    state: RwLock<Arc<S>>,

    /// Number of reductions applied.
    version: AtomicU64,

    reducer: Box<dyn Reducer<S, A>>,
    middleware: Vec<Arc<dyn Middleware<S, A>>>,
    listeners: Arc<Listeners<S>>,

    /// Held for the whole of a dispatch, deferred cascade included.
    writer: Mutex<()>,

    /// Actions dispatched on the dispatching thread mid-dispatch.
    deferred: Mutex<VecDeque<A>>,
}

/// A single-writer state container.
///
/// Cloning a `Store` produces another handle to the same container.
///
/// # Example
///
/// ```rust,ignore
/// let store = Store::new(Counter { count: 0 }, reduce);
///
/// let _subscription = store.subscribe(|state| println!("count = {}", state.count));
///
/// store.dispatch(CounterAction::Increment)?;
/// assert_eq!(store.state().count, 1);
/// ```
pub struct Store<S, A> {
    shared: Arc<Shared<S, A>>,
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a store with no middleware and the default config.
    pub fn new<R>(initial: S, reducer: R) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        Self::builder(initial, reducer).build()
    }

    /// Start building a store.
    pub fn builder<R>(initial: S, reducer: R) -> StoreBuilder<S, A>
    where
        R: Reducer<S, A> + 'static,
    {
        StoreBuilder {
            initial,
            reducer: Box::new(reducer),
            middleware: Vec::new(),
            config: StoreConfig::default(),
        }
    }

    pub fn id(&self) -> StoreId {
        self.shared.id
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    pub fn label(&self) -> &str {
        &self.shared.config.label
    }

    /// The last fully applied state.
    pub fn state(&self) -> Arc<S> {
        Arc::clone(&*self.shared.state.read())
    }

    /// Number of reductions applied since the store was created.
    pub fn version(&self) -> u64 {
        self.shared.version.load(Ordering::Acquire)
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Register a listener for every later state change.
    ///
    /// The current state is not delivered; use
    /// [`subscribe_immediate`](Self::subscribe_immediate) for that.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.shared.listeners.register(callback)
    }

    /// Deliver the current state to `callback`, then register it.
    ///
    /// Both steps happen without a dispatch in between, so the listener sees
    /// every state exactly once.
    pub fn subscribe_immediate<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.serialized(|| {
            callback(&*self.state());
            self.shared.listeners.register(callback)
        })
    }

    /// A dispatch-only handle.
    pub fn dispatcher(&self) -> Dispatcher<S, A> {
        Dispatcher {
            store: self.clone(),
        }
    }

    /// Run `action` through the middleware chain and the reducer, then notify
    /// subscribers.
    ///
    /// Called from a middleware or subscriber of this store on the
    /// dispatching thread, the action is deferred until the current dispatch
    /// completes and `Ok(())` is returned right away.
    ///
    /// # Panics
    ///
    /// Panics if called from inside this store's reducer and the store is
    /// strict. Panics from the reducer or a middleware propagate to the
    /// caller.
    pub fn dispatch(&self, action: A) -> StoreResult<()> {
        if let Some(phase) = DispatchContext::phase(self.id()) {
            return self.dispatch_nested(phase, action);
        }

        let _writer = self.shared.writer.lock();
        let _deferred = DeferredGuard { store: self };
        self.run(action);
        self.drain_deferred()
    }

    fn dispatch_nested(&self, phase: Phase, action: A) -> StoreResult<()> {
        match phase {
            Phase::Reducing => {
                if self.shared.config.strict {
                    panic!(
                        "store `{}`: dispatch of `{}` from inside a reducer",
                        self.label(),
                        action.kind()
                    );
                }

                error!(
                    store = self.label(),
                    action = action.kind(),
                    "dispatch called from inside a reducer; action dropped"
                );
                Err(StoreError::ReentrantDispatch {
                    store: self.label().to_string(),
                })
            }
            Phase::Middleware | Phase::Notifying => {
                trace!(
                    store = self.label(),
                    action = action.kind(),
                    ?phase,
                    "deferring nested dispatch"
                );
                self.shared.deferred.lock().push_back(action);
                Ok(())
            }
        }
    }

    fn drain_deferred(&self) -> StoreResult<()> {
        let limit = self.shared.config.max_cascade;
        let mut drained = 0usize;

        loop {
            let Some(action) = self.shared.deferred.lock().pop_front() else {
                return Ok(());
            };

            if drained == limit {
                let dropped = {
                    let mut deferred = self.shared.deferred.lock();
                    let dropped = deferred.len() + 1;
                    deferred.clear();
                    dropped
                };

                warn!(
                    store = self.label(),
                    limit,
                    dropped,
                    "deferred dispatch cascade hit its limit"
                );
                return Err(StoreError::CascadeLimit {
                    store: self.label().to_string(),
                    limit,
                });
            }

            drained += 1;
            self.run(action);
        }
    }

    /// One pass through middleware, reducer and subscribers.
    fn run(&self, action: A) {
        let context = DispatchContext::enter(self.id());
        let terminal = |action: A| self.apply(&context, action);

        Next::new(self, &self.shared.middleware, &terminal).run(action);
    }

    fn apply(&self, context: &DispatchContext, action: A) {
        let current = self.state();

        let next = {
            let _reducing = context.enter_phase(Phase::Reducing);
            Arc::new(self.shared.reducer.reduce(&current, &action))
        };

        let version = {
            let mut slot = self.shared.state.write();
            *slot = Arc::clone(&next);
            self.shared.version.fetch_add(1, Ordering::AcqRel) + 1
        };

        trace!(
            store = self.label(),
            action = action.kind(),
            version,
            "state replaced"
        );

        let _notifying = context.enter_phase(Phase::Notifying);
        self.shared.listeners.notify(&next);
    }

    /// Run `f` with no dispatch in flight.
    ///
    /// Takes the writer lock unless this thread is already inside a dispatch
    /// of this store, in which case it already holds it.
    pub(crate) fn serialized<R>(&self, f: impl FnOnce() -> R) -> R {
        if DispatchContext::is_dispatching(self.id()) {
            return f();
        }

        let _writer = self.shared.writer.lock();
        f()
    }
}

/// Empties the deferred queue when a top-level dispatch ends.
///
/// A completed dispatch has already drained it. One that unwound out of a
/// middleware, reducer or subscriber may have left actions behind, and those
/// belong to the failed dispatch, not the next one.
struct DeferredGuard<'a, S, A> {
    store: &'a Store<S, A>,
}

impl<S, A> Drop for DeferredGuard<'_, S, A> {
    fn drop(&mut self) {
        let discarded = {
            let mut deferred = self.store.shared.deferred.lock();
            let discarded = deferred.len();
            deferred.clear();
            discarded
        };

        if discarded > 0 {
            warn!(
                store = %self.store.shared.config.label,
                discarded,
                "discarding actions deferred by a failed dispatch"
            );
        }
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.shared.id)
            .field("label", &self.shared.config.label)
            .field("version", &self.shared.version.load(Ordering::Acquire))
            .field("subscribers", &self.shared.listeners.len())
            .finish()
    }
}

/// Builder returned by [`Store::builder`].
pub struct StoreBuilder<S, A> {
    initial: S,
    reducer: Box<dyn Reducer<S, A>>,
    middleware: Vec<Arc<dyn Middleware<S, A>>>,
    config: StoreConfig,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Append a middleware. The first one registered runs first.
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<S, A> + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Store<S, A> {
        Store {
            shared: Arc::new(Shared {
                id: StoreId::new(),
                config: self.config,
                state: RwLock::new(Arc::new(self.initial)),
                version: AtomicU64::new(0),
                reducer: self.reducer,
                middleware: self.middleware,
                listeners: Listeners::new(),
                writer: Mutex::new(()),
                deferred: Mutex::new(VecDeque::new()),
            }),
        }
    }
}

/// A handle that can only dispatch.
///
/// This is what a component's action props are built from, so components
/// never see the state type or the rest of the store API.
pub struct Dispatcher<S, A> {
    store: Store<S, A>,
}

impl<S, A> Dispatcher<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub fn dispatch(&self, action: A) -> StoreResult<()> {
        self.store.dispatch(action)
    }
}

impl<S, A> Clone for Dispatcher<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S, A> fmt::Debug for Dispatcher<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("store", &self.store.shared.id)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
