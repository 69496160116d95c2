//! Binds the websocket and HTTP routes, wires config/board loading, and
//! spawns the broadcaster and liveness watchdog — the counterpart of the
//! teacher's `relay-server/src/main.rs`.

mod board_loader;
mod broadcaster;
mod config;
mod connection;
mod error;
mod pinger;
mod routing;
mod socket;
mod time;
mod world;

use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use world::AppState;

const DEFAULT_CONFIG_PATH: &str = "ServerConfig.json";
const DEFAULT_BOARD_PATH: &str = "board.json";
const WATCHDOG_INTERVAL_SECS: u64 = 30;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let config_path = std::env::var("ASCII_ARENA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let board_path = std::env::var("ASCII_ARENA_BOARD").unwrap_or_else(|_| DEFAULT_BOARD_PATH.to_string());

    let initial_config = config::load_config(&config_path).await.unwrap_or_else(|err| {
        tracing::warn!(%err, "using default config, could not load from disk");
        protocol::Config::default()
    });

    let board = board_loader::load_board(&board_path)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(%err, "failed to load board, refusing to start");
            panic!("failed to load board: {err}");
        });

    let listen_addr = format!("{}:{}", initial_config.websocket.host, initial_config.websocket.port);
    let state = Arc::new(AppState::new(board, initial_config, config_path));

    let watchdog_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(WATCHDOG_INTERVAL_SECS));
        loop {
            interval.tick().await;
            sweep_dead_connections(&watchdog_state).await;
        }
    });

    let broadcaster_state = state.clone();
    tokio::spawn(broadcaster::run(broadcaster_state));

    let pinger_state = state.clone();
    tokio::spawn(pinger::run(pinger_state));

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/status", get(status_handler))
        .route("/reload", get(reload_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .unwrap_or_else(|source| panic!("bind failed on {listen_addr}: {source}"));

    tracing::info!(addr = %listen_addr, "listening");
    axum::serve(listener, app).await.unwrap();
}

/// Fallback cleanup for connections that stopped answering pings without a
/// clean close (teacher: `cleanup_dead_rooms`).
async fn sweep_dead_connections(state: &Arc<AppState>) {
    let timeout_ms = state.config.read().await.websocket.liveness_timeout_ms;
    let now = time::now_ms();
    let dead: Vec<_> = {
        let world = state.world.lock().await;
        world.connections.dead_connections(now, timeout_ms)
    };
    for client_id in dead {
        tracing::info!(?client_id, "removing dead connection");
        routing::handle_disconnect(state, client_id).await;
    }
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| socket::handle(socket, state))
}

/// Operational visibility endpoint (teacher: `/enlist`), generalized from a
/// per-room listing to the single authoritative world.
async fn status_handler(State(state): State<Arc<AppState>>) -> String {
    let world = state.world.lock().await;
    format!(
        "connections: {}\nwait_queue: {}\nboard: {}x{}",
        world.connections.len(),
        world.spawn.wait_queue_len(),
        state.board.width(),
        state.board.height(),
    )
}

async fn reload_handler(State(state): State<Arc<AppState>>) -> String {
    match config::reload_config(&state.config, &state.config_path).await {
        Ok(()) => "config reloaded".to_string(),
        Err(err) => format!("config reload failed: {err}"),
    }
}
