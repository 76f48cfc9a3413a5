use crate::domain::{ConnectionId, LobbyId};
use crate::interface_adapters::hub::{ConnectionHub, Subscription};
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{MoveRequest, SessionCommand};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    // The session task is gone; nothing this connection sends can be applied.
    SessionClosed,
    GlobalUpdatesClosed,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        // The connection id doubles as the player id once the client joins a lobby.
        let conn_id = ConnectionId::generate();
        let span = info_span!("conn", conn_id = %conn_id);
        handle_socket(socket, state, conn_id).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, conn_id: ConnectionId) {
    // Register before the identity goes out so no broadcast caused by this client is missed.
    let subscription = state.hub.register(conn_id.clone());

    let identity = ServerMessage::Identity {
        id: conn_id.to_string(),
    };
    let identity_len = match send_message(&mut socket, &identity).await {
        Ok(len) => len,
        Err(e) => {
            warn!(error = ?e, "failed to send identity");
            state.hub.unregister(&conn_id);
            let _ = socket.close().await;
            return;
        }
    };

    info!(connections = state.hub.connection_count(), "client connected");

    let mut ctx = ConnCtx::new(conn_id, &state, subscription);
    ctx.stats.msgs_out = 1;
    ctx.stats.bytes_out = identity_len as u64;

    if let Err(e) = ctx.run(&mut socket).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let len = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(len)
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    lag_recoveries: u64,
}

struct ConnCtx {
    conn_id: ConnectionId,
    hub: Arc<ConnectionHub>,
    command_tx: mpsc::Sender<SessionCommand>,
    // Lobby traffic and error notices for this connection only.
    outbox_rx: mpsc::Receiver<Utf8Bytes>,
    // Enemy updates shared by every connection.
    global_rx: broadcast::Receiver<Utf8Bytes>,
    global_latest_rx: watch::Receiver<Utf8Bytes>,

    stats: ConnStats,

    last_move_full_log: Instant,
    last_global_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

impl ConnCtx {
    fn new(conn_id: ConnectionId, state: &AppState, subscription: Subscription) -> Self {
        let Subscription {
            outbox_rx,
            global_rx,
            global_latest_rx,
        } = subscription;
        // Start throttles in the past so the first occurrence is always logged.
        let long_ago = Instant::now()
            .checked_sub(LOG_THROTTLE)
            .unwrap_or_else(Instant::now);

        Self {
            conn_id,
            hub: state.hub.clone(),
            command_tx: state.command_tx.clone(),
            outbox_rx,
            global_rx,
            global_latest_rx,
            stats: ConnStats::default(),
            last_move_full_log: long_ago,
            last_global_lag_log: long_ago,
            last_invalid_input_log: long_ago,
            close_frame: None,
        }
    }

    async fn run(&mut self, socket: &mut WebSocket) -> Result<(), NetError> {
        let mut fatal: Option<NetError> = None;

        loop {
            let control = tokio::select! {
                incoming = socket.recv() => match self.handle_incoming(incoming).await {
                    Ok(control) => control,
                    Err(e) => {
                        fatal = Some(e);
                        LoopControl::Disconnect
                    }
                },

                outgoing = self.outbox_rx.recv() => match outgoing {
                    Some(frame) => self.forward(socket, frame).await,
                    None => {
                        warn!("outbox closed; disconnecting");
                        LoopControl::Disconnect
                    }
                },

                global = self.global_rx.recv() => match global {
                    Ok(frame) => self.forward(socket, frame).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        self.recover_from_lag(socket, missed).await
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::GlobalUpdatesClosed);
                        LoopControl::Disconnect
                    }
                },
            };

            if let LoopControl::Disconnect = control {
                break;
            }
        }

        if let Some(frame) = self.close_frame.take() {
            let _ = socket.send(Message::Close(Some(frame))).await;
        }
        if let Err(e) = socket.close().await {
            debug!(error = ?e, "socket close error");
        }

        if let Err(e) = self.cleanup().await {
            warn!(error = ?e, "error during disconnect cleanup");
            fatal.get_or_insert(e);
        }

        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn handle_incoming(
        &mut self,
        incoming: Option<Result<Message, axum::Error>>,
    ) -> Result<LoopControl, NetError> {
        let msg = match incoming {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                warn!(error = %e, "websocket recv error");
                return Ok(LoopControl::Disconnect);
            }
            None => {
                info!("websocket closed");
                return Ok(LoopControl::Disconnect);
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Binary(_) => {
                self.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                return Ok(LoopControl::Disconnect);
            }
            Message::Ping(_) | Message::Pong(_) => return Ok(LoopControl::Continue),
            Message::Close(_) => return Ok(LoopControl::Disconnect),
        };

        self.stats.msgs_in += 1;
        self.stats.bytes_in += text.len() as u64;

        match serde_json::from_str::<ClientMessage>(&text) {
            // Any string names a lobby, the empty one included.
            Ok(ClientMessage::JoinLobby(raw)) => {
                let conn_id = self.conn_id.clone();
                let lobby_id = LobbyId::from(raw);
                self.submit(SessionCommand::JoinLobby { conn_id, lobby_id })
                    .await
            }
            Ok(ClientMessage::PlayerReady(raw)) => {
                let conn_id = self.conn_id.clone();
                let lobby_id = LobbyId::from(raw);
                self.submit(SessionCommand::Ready { conn_id, lobby_id })
                    .await
            }
            Ok(ClientMessage::Move(payload)) => self.submit_move(payload.into()),
            Err(e) => {
                self.stats.invalid_json += 1;
                if should_log(&mut self.last_invalid_input_log) {
                    warn!(bytes = text.len(), error = %e, "failed to parse client message");
                }
                if self.stats.invalid_json > MAX_INVALID_JSON {
                    self.close_frame = Some(CloseFrame {
                        code: close_code::POLICY,
                        reason: "too many invalid messages".into(),
                    });
                    return Ok(LoopControl::Disconnect);
                }
                Ok(LoopControl::Continue)
            }
        }
    }

    // Joins and ready signals must not be lost, so wait for room in the command channel.
    async fn submit(&self, command: SessionCommand) -> Result<LoopControl, NetError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| NetError::SessionClosed)?;
        Ok(LoopControl::Continue)
    }

    // Moves are superseded by the next one, so drop them when the session task is backed up.
    fn submit_move(&mut self, request: MoveRequest) -> Result<LoopControl, NetError> {
        let command = SessionCommand::Move {
            conn_id: self.conn_id.clone(),
            request,
        };
        match self.command_tx.try_send(command) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(TrySendError::Full(_)) => {
                if should_log(&mut self.last_move_full_log) {
                    warn!("session command channel full; dropping move");
                }
                Ok(LoopControl::Continue)
            }
            Err(TrySendError::Closed(_)) => Err(NetError::SessionClosed),
        }
    }

    async fn forward(&mut self, socket: &mut WebSocket, frame: Utf8Bytes) -> LoopControl {
        let len = frame.len();
        match socket.send(Message::Text(frame)).await {
            Ok(()) => {
                self.stats.msgs_out += 1;
                self.stats.bytes_out += len as u64;
                LoopControl::Continue
            }
            Err(e) => {
                warn!(error = ?e, "failed to send frame");
                LoopControl::Disconnect
            }
        }
    }

    // A lagging client skips the backlog and gets only the newest enemy frame.
    async fn recover_from_lag(&mut self, socket: &mut WebSocket, missed: u64) -> LoopControl {
        if should_log(&mut self.last_global_lag_log) {
            warn!(missed, "global updates lagged; sending latest");
        }

        let latest = self.global_latest_rx.borrow_and_update().clone();
        if latest.is_empty() {
            return LoopControl::Continue;
        }

        self.stats.lag_recoveries += 1;
        self.forward(socket, latest).await
    }

    async fn cleanup(&self) -> Result<(), NetError> {
        // Stop delivery first so the departure broadcast only reaches the remaining members.
        self.hub.unregister(&self.conn_id);

        let result = self
            .command_tx
            .send(SessionCommand::Disconnect {
                conn_id: self.conn_id.clone(),
            })
            .await
            .map_err(|_| NetError::SessionClosed);

        let ConnStats {
            msgs_in,
            msgs_out,
            bytes_in,
            bytes_out,
            invalid_json,
            lag_recoveries,
        } = self.stats;
        debug!(
            msgs_in,
            msgs_out,
            bytes_in,
            bytes_out,
            invalid_json,
            lag_recoveries,
            "connection stats"
        );
        info!(
            connections = self.hub.connection_count(),
            "client disconnected"
        );
        result
    }
}
