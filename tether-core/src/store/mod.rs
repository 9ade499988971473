//! Store, Actions and Middleware
//!
//! This module implements the state container and everything that feeds it.
//!
//! # Concepts
//!
//! ## Actions and Reducers
//!
//! An [`Action`] describes an intended change. A [`Reducer`] turns the
//! current state and an action into the next state. Reducers are pure; the
//! store is the only place the result is stored.
//!
//! ## Middleware
//!
//! [`Middleware`] wraps dispatch. Each middleware sees the action before the
//! reducer does and can forward, rewrite or drop it, and can run code after
//! the reducer and subscribers have finished.
//!
//! ## Subscriptions
//!
//! [`Store::subscribe`] registers a callback and returns a [`Subscription`].
//! The callback runs after every applied action until the subscription is
//! cancelled or dropped.
//!
//! # Implementation Notes
//!
//! Dispatch is single-writer. A thread-local dispatch context lets the store
//! recognise nested dispatches on the dispatching thread and defer them
//! instead of deadlocking on its own writer lock.

mod action;
mod container;
mod context;
pub mod middleware;
mod preset;
mod queue;
mod reducer;
mod subscription;

pub use action::Action;
pub use container::{Dispatcher, Store, StoreBuilder, StoreId};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareApi, Next};
pub use preset::{preset_reducer, PresetAction};
pub use queue::DispatchQueue;
pub use reducer::{identity, Reducer};
pub use subscription::{Subscription, SubscriptionId};

pub(crate) use subscription::WeakSubscription;
