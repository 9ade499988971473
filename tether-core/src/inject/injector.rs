//! Prop Injector
//!
//! The injector connects store state to components without the components
//! depending on the full state type or on dispatch mechanics.
//!
//! # How Injection Works
//!
//! 1. `inject` builds the component's action props once, from a
//!    [`Dispatcher`].
//!
//! 2. It maps the current state to state props, pushes them, and subscribes
//!    to the store. Both happen with no dispatch in between.
//!
//! 3. On every later state change the binding maps the new state again and
//!    compares the result with the last props it pushed. Equal props are not
//!    pushed, so components only re-render when their slice changed.
//!
//! 4. If the mapping or the component panics, the binding cancels its own
//!    subscription and reports the failure to the injector's
//!    [`DiagnosticSink`]. The store and other bindings carry on.
//!
//! The injector never owns components. Each binding is owned by the
//! [`StaticProps`] handed back from `inject`, and holds its component weakly:
//! a component may keep its own `StaticProps` without keeping itself alive.
//! Once the component is dropped the binding cancels its subscription on
//! the next state change.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::identifier::{BindingId, GlobalIds, IdProvider};
use super::sink::{DiagnosticSink, TracingSink};
use super::static_props::StaticProps;
use crate::error::InjectError;
use crate::store::{Action, Dispatcher, Store, WeakSubscription};

/// What a component receives on every push.
#[derive(Debug)]
pub struct Props<SP, AP> {
    /// True on the first push of a binding.
    pub first_instance: bool,

    /// Props derived from store state.
    pub state: SP,

    /// Props built once from the dispatcher, typically callbacks.
    pub action: Arc<AP>,
}

impl<SP: Clone, AP> Clone for Props<SP, AP> {
    fn clone(&self) -> Self {
        Self {
            first_instance: self.first_instance,
            state: self.state.clone(),
            action: Arc::clone(&self.action),
        }
    }
}

/// A UI component that can be driven by a [`PropInjector`].
///
/// # Example
///
/// ```rust,ignore
/// struct CounterLabel {
///     text: Mutex<String>,
/// }
///
/// impl PropContainer for CounterLabel {
///     type StateProps = i64;
///     type ActionProps = CounterActions;
///
///     fn receive_props(&self, props: Props<i64, CounterActions>) {
///         *self.text.lock() = format!("count: {}", props.state);
///     }
/// }
/// ```
pub trait PropContainer: Send + Sync + 'static {
    /// The slice of state this component renders from.
    type StateProps: Clone + PartialEq + Send + Sync + 'static;

    /// Whatever the component uses to dispatch.
    type ActionProps: Send + Sync + 'static;

    fn receive_props(&self, props: Props<Self::StateProps, Self::ActionProps>);
}

/// Maps store state to component props and keeps the mapping live.
pub struct PropInjector<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    store: Store<S, A>,
    ids: Arc<dyn IdProvider>,
    sink: Arc<dyn DiagnosticSink>,

    /// Subscriptions of the bindings this injector created, for teardown.
    live: DashMap<BindingId, WeakSubscription>,
}

impl<S, A> PropInjector<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create an injector for `store` with global IDs and a tracing sink.
    pub fn new(store: Store<S, A>) -> Self {
        Self {
            store,
            ids: Arc::new(GlobalIds),
            sink: Arc::new(TracingSink),
            live: DashMap::new(),
        }
    }

    /// Use a different identifier provider.
    pub fn with_ids(mut self, ids: impl IdProvider + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Use a different diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn store(&self) -> &Store<S, A> {
        &self.store
    }

    /// Draw the next binding ID from this injector's provider.
    pub fn next_id(&self) -> BindingId {
        self.ids.next_id()
    }

    /// Number of bindings still receiving props.
    pub fn live_bindings(&self) -> usize {
        self.live.retain(|_, subscription| subscription.is_live());
        self.live.len()
    }

    /// Bind `component` to the store.
    ///
    /// `map_state` must be pure. `map_dispatch` runs once, here. The binding
    /// only holds `component` weakly; the caller keeps it alive.
    pub fn inject<C, MS, MD>(
        self: &Arc<Self>,
        component: Arc<C>,
        map_state: MS,
        map_dispatch: MD,
    ) -> StaticProps<S, A>
    where
        C: PropContainer,
        MS: Fn(&S) -> C::StateProps + Send + Sync + 'static,
        MD: FnOnce(Dispatcher<S, A>) -> C::ActionProps,
    {
        let id = self.next_id();
        let binding = Arc::new(Binding {
            id,
            component: Arc::downgrade(&component),
            map_state,
            action: Arc::new(map_dispatch(self.store.dispatcher())),
            last: Mutex::new(None),
            stopped: AtomicBool::new(false),
            subscription: OnceLock::new(),
            sink: Arc::clone(&self.sink),
        });

        let subscription = self.store.serialized(|| {
            binding.refresh(&*self.store.state());

            let observer = Arc::clone(&binding);
            let subscription = self.store.subscribe(move |state| observer.refresh(state));

            let _ = binding.subscription.set(subscription.downgrade());
            if binding.stopped.load(Ordering::Acquire) {
                subscription.cancel();
            }
            subscription
        });

        if subscription.is_active() {
            self.live.insert(id, subscription.downgrade());
        }

        debug!(
            store = self.store.label(),
            binding = %id,
            active = subscription.is_active(),
            "component injected"
        );

        StaticProps::from_parts(id, Arc::clone(self), subscription)
    }

    /// Detach a binding. Idempotent.
    ///
    /// Once this returns the component receives no further props, even if a
    /// dispatch was in flight on another thread.
    pub fn eject(&self, props: &StaticProps<S, A>) {
        let was_active = props.subscription().is_active();

        self.store.serialized(|| props.subscription().cancel());
        self.live.remove(&props.id());

        if was_active {
            debug!(store = self.store.label(), binding = %props.id(), "component ejected");
        }
    }

    /// Cancel every binding this injector created that is still live.
    ///
    /// Runs automatically when the injector is dropped.
    pub fn shutdown(&self) {
        let cancelled = self.store.serialized(|| {
            self.live
                .iter()
                .filter(|entry| entry.value().cancel())
                .count()
        });
        self.live.clear();

        if cancelled > 0 {
            debug!(store = self.store.label(), cancelled, "prop injector shut down");
        }
    }
}

impl<S, A> Drop for PropInjector<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S, A> fmt::Debug for PropInjector<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropInjector")
            .field("store", &self.store)
            .field("tracked", &self.live.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Binding
// ----------------------------------------------------------------------------

/// The live link between one component and the store.
struct Binding<C: PropContainer, MS> {
    id: BindingId,
    component: Weak<C>,
    map_state: MS,
    action: Arc<C::ActionProps>,

    /// Last state props pushed, `None` before the first push.
    last: Mutex<Option<C::StateProps>>,

    /// Set once the binding stops pushing for good.
    stopped: AtomicBool,
    subscription: OnceLock<WeakSubscription>,
    sink: Arc<dyn DiagnosticSink>,
}

impl<C: PropContainer, MS> Binding<C, MS> {
    /// Map `state` and push the result if it changed.
    fn refresh<S>(&self, state: &S)
    where
        MS: Fn(&S) -> C::StateProps,
    {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }

        let props = match panic::catch_unwind(AssertUnwindSafe(|| (self.map_state)(state))) {
            Ok(props) => props,
            Err(payload) => {
                return self.fail(InjectError::MappingPanicked {
                    binding: self.id,
                    message: panic_message(payload.as_ref()),
                })
            }
        };

        let first_instance = {
            let mut last = self.last.lock();
            if last.as_ref() == Some(&props) {
                trace!(binding = %self.id, "props unchanged; push skipped");
                return;
            }
            let first_instance = last.is_none();
            *last = Some(props.clone());
            first_instance
        };

        let Some(component) = self.component.upgrade() else {
            return self.detach();
        };

        let pushed = panic::catch_unwind(AssertUnwindSafe(|| {
            component.receive_props(Props {
                first_instance,
                state: props,
                action: Arc::clone(&self.action),
            })
        }));

        if let Err(payload) = pushed {
            self.fail(InjectError::ComponentPanicked {
                binding: self.id,
                message: panic_message(payload.as_ref()),
            });
        }
    }

    fn fail(&self, failure: InjectError) {
        if self.stop() {
            self.sink.report(&failure);
        }
    }

    /// The component was dropped without ejecting.
    fn detach(&self) {
        if self.stop() {
            debug!(binding = %self.id, "component dropped; binding detached");
        }
    }

    /// Stop pushing and cancel the subscription. Returns whether this call
    /// did the stopping.
    fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }

        if let Some(subscription) = self.subscription.get() {
            subscription.cancel();
        }
        true
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
