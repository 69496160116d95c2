//! Periodic tick (spec.md §4.6): serialize state under the lock, collect
//! connection senders under the lock, then send with the lock released —
//! the broadcaster never holds `world` while doing socket I/O.

use axum::extract::ws::Message as WsMessage;
use protocol::{Envelope, Message};
use std::sync::Arc;
use std::time::Duration;

use crate::time::now_ms;
use crate::world::AppState;

pub async fn run(state: Arc<AppState>) {
    loop {
        let interval_ms = state.config.read().await.websocket.update_interval_ms;
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        tick(&state).await;
    }
}

async fn tick(state: &Arc<AppState>) {
    let now = now_ms();
    let (encoded, recipients) = {
        let world = state.world.lock().await;
        let snapshot = world.game.serialize(now);
        let envelope = Envelope::new(Message::StateUpdate(snapshot), now);
        let encoded = envelope.encode();
        let recipients: Vec<_> = world
            .connections
            .all()
            .map(|conn| conn.sender.clone())
            .collect();
        (encoded, recipients)
    };

    for sender in recipients {
        if sender.send(WsMessage::Text(encoded.clone().into())).await.is_err() {
            tracing::debug!("dropped snapshot send to a connection that already closed");
        }
    }
}
