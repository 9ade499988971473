//! Preset action and reducer.
//!
//! `PresetAction::Noop` paired with [`preset_reducer`] is the template every
//! reducer follows for variants it does not act on: return the state as is.

use super::action::Action;
use super::reducer::identity;

/// Built-in actions every store understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetAction {
    /// Does nothing. Dispatching it still notifies subscribers.
    Noop,
}

impl Action for PresetAction {
    fn kind(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
        }
    }
}

/// Reducer for [`PresetAction`]: the identity on every variant.
pub fn preset_reducer<S: Clone>(state: &S, action: &PresetAction) -> S {
    match action {
        PresetAction::Noop => identity(state, action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_is_identity() {
        let states = [
            vec![],
            vec![1, 2, 3],
            vec![i32::MIN, 0, i32::MAX],
        ];

        for state in states {
            assert_eq!(preset_reducer(&state, &PresetAction::Noop), state);
        }
    }

    #[test]
    fn noop_kind() {
        assert_eq!(PresetAction::Noop.kind(), "noop");
    }
}
