//! Actively drives the liveness check spec.md §4.5 requires: a periodic
//! `PING` to every connection, so a silent-but-healthy peer's `last_activity`
//! timestamp gets refreshed by its `PONG` reply even if it never moves.
//! Same collect-under-lock / send-outside-lock split as `broadcaster::tick`.

use axum::extract::ws::Message as WsMessage;
use protocol::{Envelope, Message};
use std::time::Duration;
use std::sync::Arc;

use crate::time::now_ms;
use crate::world::AppState;

pub async fn run(state: Arc<AppState>) {
    loop {
        let interval_ms = state.config.read().await.websocket.ping_interval_ms;
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        tick(&state).await;
    }
}

async fn tick(state: &Arc<AppState>) {
    let now = now_ms();
    let encoded = Envelope::new(Message::Ping, now).encode();
    let recipients: Vec<_> = {
        let world = state.world.lock().await;
        world.connections.all().map(|conn| conn.sender.clone()).collect()
    };
    for sender in recipients {
        if sender.send(WsMessage::Text(encoded.clone().into())).await.is_err() {
            tracing::debug!("dropped ping send to a connection that already closed");
        }
    }
}
