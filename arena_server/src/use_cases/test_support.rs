use std::sync::{Arc, Mutex};

use crate::domain::ConnectionId;
use crate::use_cases::ports::Broadcaster;
use crate::use_cases::types::{Audience, SessionEvent};

pub(crate) type DispatchLog = Arc<Mutex<Vec<(Audience, SessionEvent)>>>;

// Captures every dispatch so tests can assert on audience and payload.
#[derive(Clone, Default)]
pub(crate) struct RecordingBroadcaster {
    log: DispatchLog,
}

impl RecordingBroadcaster {
    pub(crate) fn take(&self) -> Vec<(Audience, SessionEvent)> {
        let mut guard = self.log.lock().expect("dispatch log mutex poisoned");
        std::mem::take(&mut *guard)
    }

    // Events a given connection would have received, in order.
    pub(crate) fn received_by(&self, conn_id: &ConnectionId) -> Vec<SessionEvent> {
        let guard = self.log.lock().expect("dispatch log mutex poisoned");
        guard
            .iter()
            .filter(|(audience, _)| match audience {
                Audience::All => true,
                Audience::Connections(ids) => ids.contains(conn_id),
            })
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn dispatch(&self, audience: &Audience, event: &SessionEvent) {
        let mut guard = self.log.lock().expect("dispatch log mutex poisoned");
        guard.push((audience.clone(), event.clone()));
    }
}
