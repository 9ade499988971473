//! Static props.
//!
//! [`StaticProps`] is the per-component record of a binding: its identifier,
//! the injector that created it, and the subscription it owns. Dropping it
//! cancels the subscription.
//!
//! There is one binding type. Whether the subscription is a real store
//! registration or the noop placeholder depends only on which constructor
//! built it: [`PropInjector::inject`] for the real thing, [`StaticProps::mock`]
//! for tests that exercise prop logic without store wiring.

use std::fmt;
use std::sync::Arc;

use super::identifier::BindingId;
use super::injector::PropInjector;
use crate::store::{Action, Subscription};

/// The live binding between one component instance and the store.
pub struct StaticProps<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    id: BindingId,
    injector: Arc<PropInjector<S, A>>,
    subscription: Subscription,
}

/// Older name for [`StaticProps`].
pub type StaticPropContainer<S, A> = StaticProps<S, A>;

impl<S, A> StaticProps<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn from_parts(
        id: BindingId,
        injector: Arc<PropInjector<S, A>>,
        subscription: Subscription,
    ) -> Self {
        Self {
            id,
            injector,
            subscription,
        }
    }

    /// A binding with a noop subscription and the injector's next ID.
    pub fn mock(injector: Arc<PropInjector<S, A>>) -> Self {
        let id = injector.next_id();
        Self::mock_with_id(injector, id)
    }

    /// A binding with a noop subscription and a fixed ID.
    pub fn mock_with_id(injector: Arc<PropInjector<S, A>>, id: BindingId) -> Self {
        Self::from_parts(id, injector, Subscription::noop())
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn injector(&self) -> &Arc<PropInjector<S, A>> {
        &self.injector
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Whether the component still receives props.
    pub fn is_live(&self) -> bool {
        self.subscription.is_active()
    }

    /// Detach from the store. Same as `injector().eject(self)`.
    pub fn eject(&self) {
        self.injector.eject(self);
    }
}

impl<S, A> fmt::Debug for StaticProps<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticProps")
            .field("id", &self.id)
            .field("subscription", &self.subscription)
            .finish()
    }
}
