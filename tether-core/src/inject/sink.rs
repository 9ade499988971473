//! Diagnostic sinks.
//!
//! A broken binding is a programming error, but it must not take the store
//! or other bindings down with it. The injector cancels the binding and
//! reports the failure here instead.

use parking_lot::Mutex;
use tracing::error;

use crate::error::InjectError;

/// Receives contained binding failures.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, error: &InjectError);
}

/// Logs failures at `error` level. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, failure: &InjectError) {
        error!(
            binding = %failure.binding(),
            error = %failure,
            "prop binding failed; subscription cancelled"
        );
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<InjectError>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, oldest first.
    pub fn reports(&self) -> Vec<InjectError> {
        self.reports.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, failure: &InjectError) {
        self.reports.lock().push(failure.clone());
    }
}
