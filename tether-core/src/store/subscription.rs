//! Subscriptions.
//!
//! A [`Subscription`] is the handle a listener holds for its registration
//! with a store. It has two states, active and cancelled:
//!
//! ```text
//! active --cancel()--> cancelled
//! ```
//!
//! Cancelling is idempotent and irreversible. Dropping the handle cancels it,
//! so a caller keeps exactly one handle per logical binding.
//!
//! # Notification
//!
//! Listeners are kept in registration order. A notification pass works on a
//! snapshot of the registry, so callbacks may subscribe or cancel without
//! contending for the registry lock. Each entry re-checks its active flag
//! right before it is invoked, which means a listener cancelled earlier in
//! the same pass is skipped.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::trace;

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Generate a new unique subscription ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Something a registration can be removed from.
pub(crate) trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Shared between the handle and the registry entry.
struct Registration {
    id: SubscriptionId,
    active: AtomicBool,
    source: Weak<dyn Unsubscribe>,
}

impl Registration {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }

        // The source may already be gone if the store was dropped first.
        if let Some(source) = self.source.upgrade() {
            source.unsubscribe(self.id);
        }

        trace!(subscription = %self.id, "subscription cancelled");
    }
}

/// A cancellable registration for state-change notifications.
///
/// # Example
///
/// ```rust,ignore
/// let subscription = store.subscribe(|state| println!("{state:?}"));
///
/// store.dispatch(CounterAction::Increment)?;  // prints
/// subscription.cancel();
/// store.dispatch(CounterAction::Increment)?;  // silent
/// ```
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    /// `None` for the noop placeholder.
    registration: Option<Arc<Registration>>,
}

impl Subscription {
    /// The placeholder subscription.
    ///
    /// It is never registered with a store; `cancel()` does nothing. Use it
    /// where a `Subscription` value is required but no real listener exists,
    /// for example in component tests.
    pub fn noop() -> Self {
        Self { registration: None }
    }

    /// The ID of this registration, or `None` for the noop placeholder.
    pub fn id(&self) -> Option<SubscriptionId> {
        self.registration.as_ref().map(|r| r.id)
    }

    /// Whether this is the noop placeholder.
    pub fn is_noop(&self) -> bool {
        self.registration.is_none()
    }

    /// Whether notifications are still delivered. Always `false` for noop.
    pub fn is_active(&self) -> bool {
        self.registration.as_ref().is_some_and(|r| r.is_active())
    }

    /// Stop receiving notifications.
    ///
    /// Calling this more than once has the same effect as calling it once.
    pub fn cancel(&self) {
        if let Some(registration) = &self.registration {
            registration.cancel();
        }
    }

    /// A non-owning reference that can cancel this subscription later.
    pub(crate) fn downgrade(&self) -> WeakSubscription {
        WeakSubscription(
            self.registration
                .as_ref()
                .map(Arc::downgrade)
                .unwrap_or_default(),
        )
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.registration {
            None => f.write_str("Subscription(noop)"),
            Some(r) => f
                .debug_struct("Subscription")
                .field("id", &r.id)
                .field("active", &r.is_active())
                .finish(),
        }
    }
}

/// Cancels a subscription it does not own.
#[derive(Clone)]
pub(crate) struct WeakSubscription(Weak<Registration>);

impl WeakSubscription {
    pub(crate) fn is_live(&self) -> bool {
        self.0.upgrade().is_some_and(|r| r.is_active())
    }

    /// Cancel the subscription if it still exists. Returns whether this call
    /// did the cancelling.
    pub(crate) fn cancel(&self) -> bool {
        match self.0.upgrade() {
            Some(registration) if registration.is_active() => {
                registration.cancel();
                true
            }
            _ => false,
        }
    }
}

// ----------------------------------------------------------------------------
// Listener registry
// ----------------------------------------------------------------------------

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    registration: Arc<Registration>,
    callback: Callback<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            registration: Arc::clone(&self.registration),
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Ordered set of callbacks notified with a `&T`.
pub(crate) struct Listeners<T> {
    entries: RwLock<IndexMap<SubscriptionId, Entry<T>>>,
}

impl<T: 'static> Listeners<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(IndexMap::new()),
        })
    }

    /// Register a callback and hand back its subscription.
    pub(crate) fn register<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let source: Weak<dyn Unsubscribe> = Arc::downgrade(self) as Weak<dyn Unsubscribe>;
        let registration = Arc::new(Registration {
            id: SubscriptionId::new(),
            active: AtomicBool::new(true),
            source,
        });

        self.entries.write().insert(
            registration.id,
            Entry {
                registration: Arc::clone(&registration),
                callback: Arc::new(callback),
            },
        );

        trace!(subscription = %registration.id, "subscription registered");

        Subscription {
            registration: Some(registration),
        }
    }
}

impl<T> Listeners<T> {
    /// Invoke every active callback, in registration order.
    pub(crate) fn notify(&self, value: &T) {
        let snapshot: SmallVec<[Entry<T>; 8]> = self.entries.read().values().cloned().collect();

        for entry in snapshot {
            if entry.registration.is_active() {
                (entry.callback)(value);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

impl<T: 'static> Unsubscribe for Listeners<T> {
    fn unsubscribe(&self, id: SubscriptionId) {
        // Drop the callback after the lock is released; its captures may hold
        // subscriptions of their own.
        let removed = self.entries.write().shift_remove(&id);
        drop(removed);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
