use crate::interface_adapters::http::json_error;
use crate::interface_adapters::protocol::LobbySummaryDto;
use crate::interface_adapters::state::AppState;
use crate::use_cases::SessionCommand;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::warn;

pub async fn list_lobbies_handler(State(state): State<Arc<AppState>>) -> Response {
    // Ask the session task so the listing reflects a single consistent state.
    let (reply_tx, reply_rx) = oneshot::channel();
    if state
        .command_tx
        .send(SessionCommand::ListLobbies { reply: reply_tx })
        .await
        .is_err()
    {
        warn!("session task unavailable for lobby listing");
        return json_error(StatusCode::SERVICE_UNAVAILABLE, "session unavailable");
    }

    match reply_rx.await {
        Ok(summaries) => {
            let body: Vec<LobbySummaryDto> =
                summaries.into_iter().map(LobbySummaryDto::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(_) => json_error(StatusCode::SERVICE_UNAVAILABLE, "session unavailable"),
    }
}
