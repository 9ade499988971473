//! Prop Injection
//!
//! Bridges store state to UI components.
//!
//! A component implements [`PropContainer`]: it declares the slice of state
//! it renders from (`StateProps`) and the callbacks it dispatches through
//! (`ActionProps`). [`PropInjector::inject`] binds it to the store and hands
//! back a [`StaticProps`] that owns the binding's subscription.

mod identifier;
mod injector;
mod sink;
mod static_props;

pub use identifier::{BindingId, GlobalIds, IdProvider, SequentialIds};
pub use injector::{PropContainer, PropInjector, Props};
pub use sink::{DiagnosticSink, RecordingSink, TracingSink};
pub use static_props::{StaticPropContainer, StaticProps};
