// Fan-out of session events to live WebSocket connections.

use crate::domain::ConnectionId;
use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::{Audience, Broadcaster, SessionEvent};

use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, warn};

const DROP_LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Receivers handed to a connection when it registers with the hub.
pub struct Subscription {
    /// Events addressed to this connection (lobby traffic, error notices).
    pub outbox_rx: mpsc::Receiver<Utf8Bytes>,
    /// Events addressed to every connection (enemy updates).
    pub global_rx: broadcast::Receiver<Utf8Bytes>,
    /// Latest global frame, used to resync after lagging.
    pub global_latest_rx: watch::Receiver<Utf8Bytes>,
}

/// Routes serialized events to connections.
///
/// Per-connection traffic goes through bounded outboxes that are never awaited on; a full or
/// closed outbox loses the message. Global traffic uses a broadcast channel shared by everyone.
pub struct ConnectionHub {
    outboxes: RwLock<HashMap<ConnectionId, mpsc::Sender<Utf8Bytes>>>,
    outbox_capacity: usize,
    global_tx: broadcast::Sender<Utf8Bytes>,
    global_latest_tx: watch::Sender<Utf8Bytes>,
    last_drop_log: Mutex<Instant>,
}

impl ConnectionHub {
    pub fn new(outbox_capacity: usize, global_capacity: usize) -> Self {
        let (global_tx, _global_rx) = broadcast::channel::<Utf8Bytes>(global_capacity);
        let (global_latest_tx, _global_latest_rx) = watch::channel(Utf8Bytes::from(""));
        Self {
            outboxes: RwLock::new(HashMap::new()),
            outbox_capacity,
            global_tx,
            global_latest_tx,
            last_drop_log: Mutex::new(Instant::now() - DROP_LOG_THROTTLE),
        }
    }

    /// Registers a connection's outbox. Subscribe before sending any command so no broadcast
    /// triggered by this connection is missed.
    pub fn register(&self, conn_id: ConnectionId) -> Subscription {
        let (outbox_tx, outbox_rx) = mpsc::channel(self.outbox_capacity);
        let global_rx = self.global_tx.subscribe();
        let global_latest_rx = self.global_latest_tx.subscribe();

        self.outboxes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conn_id, outbox_tx);

        Subscription {
            outbox_rx,
            global_rx,
            global_latest_rx,
        }
    }

    pub fn unregister(&self, conn_id: &ConnectionId) {
        self.outboxes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(conn_id);
    }

    pub fn connection_count(&self) -> usize {
        self.outboxes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn should_log_drop(&self) -> bool {
        let mut last = self
            .last_drop_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.elapsed() >= DROP_LOG_THROTTLE {
            *last = Instant::now();
            true
        } else {
            false
        }
    }
}

impl Broadcaster for ConnectionHub {
    fn dispatch(&self, audience: &Audience, event: &SessionEvent) {
        // Serialize once and share the bytes across every recipient.
        let msg = ServerMessage::from(event);
        let bytes = match serde_json::to_string(&msg) {
            Ok(txt) => Utf8Bytes::from(txt),
            Err(e) => {
                error!(error = ?e, "failed to serialize session event");
                return;
            }
        };

        match audience {
            Audience::All => {
                // Keep the latest frame even when nobody is listening yet.
                self.global_latest_tx.send_replace(bytes.clone());
                let _ = self.global_tx.send(bytes);
            }
            Audience::Connections(ids) => {
                let outboxes = self.outboxes.read().unwrap_or_else(PoisonError::into_inner);
                for conn_id in ids {
                    let Some(outbox) = outboxes.get(conn_id) else {
                        debug!(conn_id = %conn_id, "no outbox for recipient; dropping");
                        continue;
                    };
                    match outbox.try_send(bytes.clone()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            if self.should_log_drop() {
                                warn!(conn_id = %conn_id, "outbox full; dropping message");
                            }
                        }
                        Err(TrySendError::Closed(_)) => {
                            debug!(conn_id = %conn_id, "outbox closed; dropping message");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_event(message: &str) -> SessionEvent {
        SessionEvent::Error {
            message: message.to_string(),
        }
    }

    #[test]
    fn when_event_targets_connections_then_only_they_receive_it() {
        let hub = ConnectionHub::new(8, 8);
        let mut a = hub.register(ConnectionId::from("a"));
        let mut b = hub.register(ConnectionId::from("b"));

        hub.dispatch(
            &Audience::Connections(vec![ConnectionId::from("a")]),
            &error_event("nope"),
        );

        let frame = a.outbox_rx.try_recv().expect("a receives");
        assert_eq!(frame.as_str(), r#"{"type":"error","data":"nope"}"#);
        assert!(b.outbox_rx.try_recv().is_err());
    }

    #[test]
    fn when_event_targets_everyone_then_global_channel_and_latest_are_updated() {
        let hub = ConnectionHub::new(8, 8);
        let mut a = hub.register(ConnectionId::from("a"));

        hub.dispatch(&Audience::All, &error_event("all"));

        assert!(a.outbox_rx.try_recv().is_err());
        let frame = a.global_rx.try_recv().expect("global frame");
        assert_eq!(frame.as_str(), r#"{"type":"error","data":"all"}"#);
        assert_eq!(a.global_latest_rx.borrow().as_str(), frame.as_str());
    }

    #[test]
    fn when_outbox_is_full_then_extra_messages_are_dropped_without_blocking() {
        let hub = ConnectionHub::new(1, 8);
        let mut a = hub.register(ConnectionId::from("a"));
        let audience = Audience::Connections(vec![ConnectionId::from("a")]);

        hub.dispatch(&audience, &error_event("first"));
        hub.dispatch(&audience, &error_event("second"));

        let frame = a.outbox_rx.try_recv().expect("first kept");
        assert!(frame.as_str().contains("first"));
        assert!(a.outbox_rx.try_recv().is_err());
    }

    #[test]
    fn when_connection_unregisters_then_it_is_skipped() {
        let hub = ConnectionHub::new(8, 8);
        let mut a = hub.register(ConnectionId::from("a"));
        let mut b = hub.register(ConnectionId::from("b"));
        hub.unregister(&ConnectionId::from("a"));

        hub.dispatch(
            &Audience::Connections(vec![ConnectionId::from("a"), ConnectionId::from("b")]),
            &error_event("gone"),
        );

        assert_eq!(hub.connection_count(), 1);
        assert!(a.outbox_rx.try_recv().is_err());
        assert!(b.outbox_rx.try_recv().is_ok());
    }
}
