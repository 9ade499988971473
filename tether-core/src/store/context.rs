//! Dispatch Context
//!
//! Tracks which stores are dispatching on the current thread, and in which
//! phase. This is how the store tells a nested dispatch (from a middleware,
//! a subscriber or a reducer) apart from a dispatch arriving from another
//! thread.
//!
//! # Implementation
//!
//! A thread-local stack holds one frame per store that is mid-dispatch on
//! this thread. Entering a dispatch pushes a frame; dropping the returned
//! guard pops it, so the stack stays balanced even if a reducer panics.

use std::cell::RefCell;

use smallvec::SmallVec;

use super::container::StoreId;

thread_local! {
    static DISPATCH_STACK: RefCell<SmallVec<[Frame; 4]>> = RefCell::new(SmallVec::new());
}

/// Where a dispatch currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Running the middleware chain.
    Middleware,
    /// Inside the reducer.
    Reducing,
    /// Invoking subscribers.
    Notifying,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    store: StoreId,
    phase: Phase,
}

/// Guard that pops the frame when dropped.
pub(crate) struct DispatchContext {
    store: StoreId,
}

impl DispatchContext {
    /// Push a frame for `store`, starting in the middleware phase.
    pub(crate) fn enter(store: StoreId) -> Self {
        DISPATCH_STACK.with(|stack| {
            stack.borrow_mut().push(Frame {
                store,
                phase: Phase::Middleware,
            });
        });

        Self { store }
    }

    /// The phase of the innermost frame for `store` on this thread.
    pub(crate) fn phase(store: StoreId) -> Option<Phase> {
        DISPATCH_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|frame| frame.store == store)
                .map(|frame| frame.phase)
        })
    }

    /// Whether `store` is mid-dispatch on this thread.
    pub(crate) fn is_dispatching(store: StoreId) -> bool {
        Self::phase(store).is_some()
    }

    /// Switch this frame to `phase` until the returned guard drops.
    pub(crate) fn enter_phase(&self, phase: Phase) -> PhaseGuard {
        let previous = set_phase(self.store, phase);
        PhaseGuard {
            store: self.store,
            previous,
        }
    }
}

fn set_phase(store: StoreId, phase: Phase) -> Phase {
    DISPATCH_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let frame = stack
            .iter_mut()
            .rev()
            .find(|frame| frame.store == store);

        match frame {
            Some(frame) => std::mem::replace(&mut frame.phase, phase),
            None => {
                debug_assert!(false, "no dispatch frame for {store}");
                phase
            }
        }
    })
}

impl Drop for DispatchContext {
    fn drop(&mut self) {
        DISPATCH_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(frame) = popped {
                debug_assert_eq!(
                    frame.store, self.store,
                    "DispatchContext mismatch: expected {:?}, got {:?}",
                    self.store, frame.store
                );
            }
        });
    }
}

/// Restores the previous phase when dropped.
pub(crate) struct PhaseGuard {
    store: StoreId,
    previous: Phase,
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        set_phase(self.store, self.previous);
    }
}
