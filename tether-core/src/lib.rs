//! Tether Core
//!
//! This crate provides a single-writer state container in the Redux style,
//! and the glue that keeps UI components in sync with it. It implements:
//!
//! - A store with a middleware pipeline and ordered subscriptions
//! - Cancellable subscription handles, including a noop placeholder
//! - A prop injector that maps state slices to component props and only
//!   pushes props that changed
//! - A tokio-backed dispatch queue for actions produced by async work
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `store`: actions, reducers, middleware, subscriptions and the store
//! - `inject`: prop containers, the injector and binding records
//!
//! There is no global store. Every injector and middleware gets the store it
//! works with at construction time.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether_core::inject::{PropInjector, PropContainer, Props};
//! use tether_core::store::{Action, Store};
//!
//! let store = Store::new(Counter { count: 0 }, reduce);
//! let injector = Arc::new(PropInjector::new(store.clone()));
//!
//! // Push `count` into the label whenever it changes
//! let binding = injector.inject(label.clone(), |s: &Counter| s.count, counter_actions);
//!
//! store.dispatch(CounterAction::Increment)?;
//! // label received Props { first_instance: false, state: 1, .. }
//!
//! binding.eject();
//! ```

pub mod config;
pub mod error;
pub mod inject;
pub mod store;

pub use config::StoreConfig;
pub use error::{ConfigError, InjectError, StoreError, StoreResult};
