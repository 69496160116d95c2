//! Per-connection handling: splits the websocket, spawns a send task and a
//! receive task, and aborts whichever loses when the other finishes —
//! directly the teacher's `processing_module::handle_server_logic` shape,
//! generalized from a binary relay protocol to the textual envelope here.

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientId, Envelope, Message};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::routing;
use crate::world::AppState;

pub async fn handle(socket: WebSocket, state: Arc<AppState>) {
    let (sink, stream) = socket.split();
    let (tx, rx) = mpsc::channel::<WsMessage>(64);

    let client_id = {
        let mut world = state.world.lock().await;
        world.connections.add(tx, crate::time::now_ms())
    };
    tracing::info!(?client_id, "connection accepted");

    routing::handle_accept(&state, client_id).await;

    let mut send_task = tokio::spawn(send_loop(sink, rx));
    let mut receive_task = tokio::spawn(receive_loop(stream, state.clone(), client_id));

    tokio::select! {
        _ = &mut send_task => { receive_task.abort(); }
        _ = &mut receive_task => { send_task.abort(); }
    }

    routing::handle_disconnect(&state, client_id).await;
    tracing::info!(?client_id, "connection closed");
}

async fn send_loop(mut sink: SplitSink<WebSocket, WsMessage>, mut rx: mpsc::Receiver<WsMessage>) {
    while let Some(message) = rx.recv().await {
        if let Err(err) = sink.send(message).await {
            tracing::debug!(?err, "send failed, connection closing");
            return;
        }
    }
}

async fn receive_loop(mut stream: SplitStream<WebSocket>, state: Arc<AppState>, client_id: ClientId) {
    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(_) => return,
        };
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => return,
            _ => continue,
        };

        {
            let mut world = state.world.lock().await;
            world.connections.touch(client_id, crate::time::now_ms());
        }

        match Envelope::decode(&text) {
            Ok(envelope) => dispatch(&state, client_id, envelope.message).await,
            Err(err) => {
                tracing::warn!(?client_id, ?err, "dropping malformed message");
                let payload = err.to_error_payload();
                let reply = Envelope::new(Message::Error(payload), crate::time::now_ms());
                send_reply(&state, client_id, reply).await;
            }
        }
    }
}

async fn send_reply(state: &Arc<AppState>, client_id: ClientId, envelope: Envelope) {
    let sender = {
        let world = state.world.lock().await;
        world.connections.by_client_id(client_id).map(|c| c.sender.clone())
    };
    if let Some(sender) = sender {
        let _ = sender.send(WsMessage::Text(envelope.encode().into())).await;
    }
}

async fn dispatch(state: &Arc<AppState>, client_id: ClientId, message: Message) {
    match message {
        Message::Connect(payload) => routing::handle_connect(state, client_id, payload).await,
        Message::SetPlayerName { name } => routing::handle_set_player_name(state, client_id, name).await,
        Message::Move(delta) => routing::handle_move(state, client_id, delta).await,
        Message::Ping => routing::handle_ping(state, client_id).await,
        Message::Pong => routing::handle_pong(state, client_id).await,
        // Server-bound-only envelopes that a well-behaved client never sends;
        // ignored rather than treated as a protocol violation.
        Message::StateUpdate(_) | Message::PlayerJoined { .. } | Message::PlayerLeft { .. } | Message::Error(_) => {
            tracing::debug!(?client_id, "ignoring server-direction message from client");
        }
    }
}
