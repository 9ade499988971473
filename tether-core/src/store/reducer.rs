//! Reducers.
//!
//! A reducer computes the next state from the current state and an action.
//! It must be pure and total: no I/O, no side effects, and every variant it
//! does not care about returns the state unchanged.

/// A pure `(state, action) -> state` transition.
///
/// Any `Fn(&S, &A) -> S + Send + Sync` is a reducer, so plain functions work:
///
/// ```rust,ignore
/// fn reduce(state: &Counter, action: &CounterAction) -> Counter {
///     match action {
///         CounterAction::Increment => Counter { count: state.count + 1 },
///     }
/// }
///
/// let store = Store::new(Counter::default(), reduce);
/// ```
pub trait Reducer<S, A>: Send + Sync {
    /// Compute the state that follows `state` once `action` is applied.
    fn reduce(&self, state: &S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> S + Send + Sync,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        self(state, action)
    }
}

/// The identity reducer: returns the state unchanged.
///
/// Reducers should fall back to this for variants they do not handle.
pub fn identity<S: Clone, A>(state: &S, _action: &A) -> S {
    state.clone()
}
