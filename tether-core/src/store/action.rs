//! Actions.
//!
//! An action is a transient value describing an intended state change. It is
//! created at dispatch time, handed through the middleware chain, read by the
//! reducer and then dropped.

use std::fmt::Debug;

/// A value that can be dispatched to a [`Store`](super::Store).
///
/// Applications implement this on a closed enum and match it exhaustively in
/// their reducer.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug)]
/// enum CounterAction {
///     Increment,
///     Add(i64),
/// }
///
/// impl Action for CounterAction {
///     fn kind(&self) -> &'static str {
///         match self {
///             Self::Increment => "increment",
///             Self::Add(_) => "add",
///         }
///     }
/// }
/// ```
pub trait Action: Debug + Send + 'static {
    /// Short name of the variant, used in log lines and diagnostics.
    ///
    /// Defaults to the Rust type name, which is rarely what you want for an
    /// enum with several variants.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping;

    impl Action for Ping {}

    #[derive(Debug)]
    enum Toggle {
        On,
        Off,
    }

    impl Action for Toggle {
        fn kind(&self) -> &'static str {
            match self {
                Self::On => "on",
                Self::Off => "off",
            }
        }
    }

    #[test]
    fn default_kind_is_type_name() {
        assert!(Ping.kind().ends_with("Ping"));
    }

    #[test]
    fn kind_can_name_variants() {
        assert_eq!(Toggle::On.kind(), "on");
        assert_eq!(Toggle::Off.kind(), "off");
    }
}
