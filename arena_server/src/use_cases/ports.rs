use crate::use_cases::types::{Audience, SessionEvent};
use std::sync::Arc;

/// Outbound seam of the session engine.
///
/// Delivery is fire-and-forget: implementations must not block and may drop events for slow or
/// departed connections.
pub trait Broadcaster {
    fn dispatch(&self, audience: &Audience, event: &SessionEvent);
}

impl<T: Broadcaster + ?Sized> Broadcaster for Arc<T> {
    fn dispatch(&self, audience: &Audience, event: &SessionEvent) {
        (**self).dispatch(audience, event);
    }
}
