//! Error types.
//!
//! Store errors are returned from `dispatch` and the dispatch queue. Inject
//! errors never reach a dispatch caller: the injector contains them and hands
//! them to a [`DiagnosticSink`](crate::inject::DiagnosticSink).

use thiserror::Error;

use crate::inject::BindingId;

/// Errors surfaced by a [`Store`](crate::store::Store) or its dispatch queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `dispatch` was called from inside the reducer of the same store.
    #[error("store `{store}`: dispatch called from inside a reducer")]
    ReentrantDispatch { store: String },

    /// Deferred dispatches kept cascading past the configured limit.
    #[error("store `{store}`: more than {limit} deferred dispatches in one cascade")]
    CascadeLimit { store: String, limit: usize },

    /// The dispatch queue task has stopped.
    #[error("dispatch queue is closed")]
    QueueClosed,

    /// The dispatch queue is at capacity.
    #[error("dispatch queue is full")]
    QueueFull,
}

/// A contained failure of a single prop binding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectError {
    /// The state-to-props mapping panicked.
    #[error("binding {binding}: state mapping panicked: {message}")]
    MappingPanicked { binding: BindingId, message: String },

    /// The component panicked while receiving props.
    #[error("binding {binding}: component panicked while receiving props: {message}")]
    ComponentPanicked { binding: BindingId, message: String },
}

impl InjectError {
    /// The binding that failed.
    pub fn binding(&self) -> BindingId {
        match self {
            Self::MappingPanicked { binding, .. } | Self::ComponentPanicked { binding, .. } => {
                *binding
            }
        }
    }
}

/// Errors loading a [`StoreConfig`](crate::config::StoreConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid store config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid store config: {field} must be greater than zero")]
    Invalid { field: &'static str },
}

pub type StoreResult<T> = Result<T, StoreError>;
