//! Binding identifiers.
//!
//! Every binding between a component and the store is tagged with a
//! [`BindingId`] so concurrent bindings can be told apart in logs and tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one component binding. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    /// Build an ID from a raw value, e.g. to pin one in a test.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding#{}", self.0)
    }
}

/// Source of binding identifiers.
pub trait IdProvider: Send + Sync {
    fn next_id(&self) -> BindingId;
}

/// Process-wide monotonically increasing IDs. The default provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalIds;

impl IdProvider for GlobalIds {
    fn next_id(&self) -> BindingId {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        BindingId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Instance-local counter, for deterministic IDs in tests.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    /// Start counting at `first`. Zero is bumped to one.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdProvider for SequentialIds {
    fn next_id(&self) -> BindingId {
        BindingId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
