// Framework bootstrap for the arena server runtime.

use crate::domain::tuning::enemy::EnemyTuning;
use crate::domain::tuning::player::PlayerTuning;
use crate::frameworks::config;
use crate::interface_adapters::hub::ConnectionHub;
use crate::interface_adapters::net::{list_lobbies_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{SessionCommand, SessionEngine, session_task};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc, time::Duration};
use tokio::sync::mpsc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Serves the arena on an already bound listener until the server stops.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    run_with_tick(listener, config::enemy_tick_interval()).await
}

pub async fn run_with_tick(
    listener: tokio::net::TcpListener,
    enemy_tick_interval: Duration,
) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(enemy_tick_interval);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/lobbies", get(list_lobbies_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state(enemy_tick_interval: Duration) -> Arc<AppState> {
    let hub = Arc::new(ConnectionHub::new(
        config::OUTBOX_CAPACITY,
        config::GLOBAL_BROADCAST_CAPACITY,
    ));

    // All connection commands funnel into the single session task.
    let (command_tx, command_rx) =
        mpsc::channel::<SessionCommand>(config::COMMAND_CHANNEL_CAPACITY);

    let engine = SessionEngine::new(
        hub.clone(),
        PlayerTuning::default(),
        EnemyTuning::default(),
    );
    tracing::debug!(
        enemy_tick_ms = enemy_tick_interval.as_millis(),
        "session task starting"
    );
    tokio::spawn(session_task(command_rx, engine, enemy_tick_interval));

    Arc::new(AppState { command_tx, hub })
}
