//! Inbound message routing (spec.md §4.7): join/move/disconnect/reconnect.
//! Each handler takes the shared `AppState`, does its own locking, and
//! replies or broadcasts directly — there is no central dispatch loop
//! beyond the per-connection receive task that calls into here.

use axum::extract::ws::Message as WsMessage;
use game_core::{MoveError, PlayerState};
use protocol::{
    ClientId, ConnectPayload, Envelope, ErrorCode, ErrorContext, ErrorPayload, Message,
    MoveDelta, PlayerId,
};
use std::sync::Arc;
use std::time::Duration;

use crate::time::now_ms;
use crate::world::AppState;

async fn send_to(state: &Arc<AppState>, client_id: ClientId, envelope: Envelope) {
    let sender = {
        let world = state.world.lock().await;
        world.connections.by_client_id(client_id).map(|c| c.sender.clone())
    };
    if let Some(sender) = sender {
        let encoded = envelope.encode();
        if sender.send(WsMessage::Text(encoded.into())).await.is_err() {
            tracing::debug!(?client_id, "reply send failed, connection already closed");
        }
    }
}

async fn broadcast(state: &Arc<AppState>, envelope: Envelope) {
    let encoded = envelope.encode();
    let recipients: Vec<_> = {
        let world = state.world.lock().await;
        world.connections.all().map(|c| c.sender.clone()).collect()
    };
    for sender in recipients {
        let _ = sender.send(WsMessage::Text(encoded.clone().into())).await;
    }
}

/// Called right after the websocket handshake completes: issues a
/// `clientId` and sends the accept `CONNECT` without a `playerId` yet.
pub async fn handle_accept(state: &Arc<AppState>, client_id: ClientId) {
    let now = now_ms();
    let snapshot = {
        let world = state.world.lock().await;
        world.game.serialize(now)
    };
    let payload = ConnectPayload {
        client_id: Some(client_id),
        player_id: None,
        player_name: None,
        game_state: Some(snapshot),
        wait_message: None,
    };
    send_to(state, client_id, Envelope::new(Message::Connect(payload), now)).await;
}

enum JoinOutcome {
    Spawned { player_id: PlayerId, x: i32, y: i32 },
    Waiting,
}

/// Asks `SpawnManager` for an available spawn; either places the player and
/// binds the connection, or defers into the wait queue (spec.md §4.7).
async fn attempt_join(state: &Arc<AppState>, client_id: ClientId, player_name: String) -> JoinOutcome {
    let now = now_ms();
    let mut world = state.world.lock().await;
    let player_id = world.game.add_player(player_name, client_id);
    let occupied = world.game.occupied_positions_excluding(None);
    let board = world.game.board().clone();

    if let Some((x, y)) = world.spawn.find_spawn(&board, &occupied) {
        world.game.place_player(player_id, x, y, now);
        world.connections.bind(client_id, player_id);
        JoinOutcome::Spawned { player_id, x, y }
    } else {
        world.spawn.enqueue_wait(player_id);
        JoinOutcome::Waiting
    }
}

pub async fn handle_set_player_name(state: &Arc<AppState>, client_id: ClientId, name: String) {
    let now = now_ms();
    match attempt_join(state, client_id, name.clone()).await {
        JoinOutcome::Spawned { player_id, x, y } => {
            tracing::info!(?client_id, ?player_id, x, y, "player spawned");
            let snapshot = {
                let world = state.world.lock().await;
                world.game.serialize(now)
            };
            let payload = ConnectPayload {
                client_id: Some(client_id),
                player_id: Some(player_id),
                player_name: None,
                game_state: Some(snapshot),
                wait_message: None,
            };
            send_to(state, client_id, Envelope::new(Message::Connect(payload), now)).await;
            broadcast(
                state,
                Envelope::new(
                    Message::PlayerJoined { player_id, player_name: name, x, y },
                    now,
                ),
            )
            .await;
        }
        JoinOutcome::Waiting => {
            let wait_message = state.config.read().await.spawn_points.wait_message.clone();
            let payload = ConnectPayload {
                client_id: Some(client_id),
                player_id: None,
                player_name: None,
                game_state: None,
                wait_message: Some(wait_message),
            };
            send_to(state, client_id, Envelope::new(Message::Connect(payload), now)).await;
        }
    }
}

/// A `CONNECT` carrying a known `playerId` is a reconnect (spec.md §4.5):
/// rebind the client without allocating a new spawn. An unknown `playerId`
/// falls back to a fresh join if a `playerName` was supplied.
pub async fn handle_connect(state: &Arc<AppState>, client_id: ClientId, payload: ConnectPayload) {
    let now = now_ms();
    let Some(requested_player_id) = payload.player_id else {
        if let Some(name) = payload.player_name {
            handle_set_player_name(state, client_id, name).await;
        }
        return;
    };

    let known = {
        let world = state.world.lock().await;
        world.game.player(requested_player_id).is_some()
    };
    if !known {
        if let Some(name) = payload.player_name {
            handle_set_player_name(state, client_id, name).await;
        }
        return;
    }

    {
        let mut world = state.world.lock().await;
        world.game.rebind_client(requested_player_id, client_id);
        world.connections.bind(client_id, requested_player_id);
    }
    tracing::info!(?client_id, ?requested_player_id, "player reconnected");

    let snapshot = {
        let world = state.world.lock().await;
        world.game.serialize(now)
    };
    let reply = ConnectPayload {
        client_id: Some(client_id),
        player_id: Some(requested_player_id),
        player_name: None,
        game_state: Some(snapshot),
        wait_message: None,
    };
    send_to(state, client_id, Envelope::new(Message::Connect(reply), now)).await;
}

pub async fn handle_move(state: &Arc<AppState>, client_id: ClientId, delta: MoveDelta) {
    let now = now_ms();
    let player_id = {
        let world = state.world.lock().await;
        world.connections.by_client_id(client_id).and_then(|c| c.player_id)
    };
    let Some(player_id) = player_id else {
        tracing::debug!(?client_id, "MOVE received before join, ignoring");
        return;
    };

    let result = {
        let mut world = state.world.lock().await;
        world.game.move_player(player_id, delta.dx as i32, delta.dy as i32, now)
    };

    match result {
        Ok(_) => {}
        Err(MoveError::NotActive) => {
            tracing::debug!(?client_id, ?player_id, "MOVE for an inactive player, ignoring");
        }
        Err(MoveError::Rejected(reason)) => {
            let current = {
                let world = state.world.lock().await;
                world.game.player(player_id).and_then(|p| p.position())
            };
            let attempted = current.map(|(x, y)| (x + delta.dx as i32, y + delta.dy as i32));
            let payload = ErrorPayload {
                code: ErrorCode::InvalidMove,
                message: format!("move rejected: {reason:?}"),
                context: ErrorContext {
                    attempted_position: attempted,
                    current_position: current,
                    reason: Some(reason),
                },
            };
            send_to(state, client_id, Envelope::new(Message::Error(payload), now)).await;
        }
    }
}

pub async fn handle_ping(state: &Arc<AppState>, client_id: ClientId) {
    let now = now_ms();
    {
        let mut world = state.world.lock().await;
        world.connections.touch(client_id, now);
    }
    send_to(state, client_id, Envelope::new(Message::Pong, now)).await;
}

pub async fn handle_pong(state: &Arc<AppState>, client_id: ClientId) {
    let now = now_ms();
    let mut world = state.world.lock().await;
    world.connections.touch(client_id, now);
}

/// Disconnect path: grace window, then removal, `PLAYER_LEFT`, and a wait
/// queue drain (spec.md §4.7). With `graceMs == 0` (the default) this runs
/// the removal synchronously.
pub async fn handle_disconnect(state: &Arc<AppState>, client_id: ClientId) {
    let now = now_ms();
    let player_id = {
        let mut world = state.world.lock().await;
        world.connections.remove(client_id);
        world.game.find_by_client(client_id).map(|p| p.player_id)
    };
    let Some(player_id) = player_id else {
        return;
    };

    let grace_ms = state.config.read().await.disconnect.grace_ms;
    {
        let mut world = state.world.lock().await;
        world.game.mark_disconnected_grace(player_id, now);
    }

    if grace_ms > 0 {
        let state = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(grace_ms)).await;
            finish_disconnect(&state, player_id).await;
        });
    } else {
        finish_disconnect(state, player_id).await;
    }
}

async fn finish_disconnect(state: &Arc<AppState>, player_id: PlayerId) {
    let now = now_ms();
    let still_in_grace = {
        let world = state.world.lock().await;
        matches!(
            world.game.player(player_id).map(|p| p.state),
            Some(PlayerState::DisconnectedGrace)
        )
    };
    if !still_in_grace {
        // The player reconnected during the grace window; nothing to clean up.
        return;
    }

    {
        let mut world = state.world.lock().await;
        world.game.remove_player(player_id);
    }
    broadcast(state, Envelope::new(Message::PlayerLeft { player_id }, now)).await;
    drain_wait_queue(state).await;
}

/// Drains the FIFO wait queue while spawns remain available, stopping at
/// the first waiting player who still cannot be placed (spec.md §4.7).
async fn drain_wait_queue(state: &Arc<AppState>) {
    loop {
        let now = now_ms();
        let placed = {
            let mut world = state.world.lock().await;
            let Some(waiting_id) = world.spawn.dequeue_next_waiting() else {
                return;
            };
            let occupied = world.game.occupied_positions_excluding(None);
            let board = world.game.board().clone();
            match world.spawn.find_spawn(&board, &occupied) {
                Some((x, y)) => {
                    world.game.place_player(waiting_id, x, y, now);
                    if let Some(client_id) = world.game.player(waiting_id).map(|p| p.client_id) {
                        world.connections.bind(client_id, waiting_id);
                    }
                    Some((waiting_id, x, y))
                }
                None => {
                    world.spawn.enqueue_wait(waiting_id);
                    None
                }
            }
        };

        match placed {
            Some((player_id, x, y)) => {
                let (snapshot, player_name, client_id) = {
                    let world = state.world.lock().await;
                    let player = world.game.player(player_id);
                    (
                        world.game.serialize(now),
                        player.map(|p| p.player_name.clone()).unwrap_or_default(),
                        player.map(|p| p.client_id),
                    )
                };
                if let Some(client_id) = client_id {
                    let payload = ConnectPayload {
                        client_id: Some(client_id),
                        player_id: Some(player_id),
                        player_name: None,
                        game_state: Some(snapshot),
                        wait_message: None,
                    };
                    send_to(state, client_id, Envelope::new(Message::Connect(payload), now)).await;
                }
                broadcast(
                    state,
                    Envelope::new(Message::PlayerJoined { player_id, player_name, x, y }, now),
                )
                .await;
            }
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;
    use game_core::Board;
    use protocol::Config;
    use tokio::sync::{mpsc, Mutex, RwLock};

    fn test_state(board: Board, config: Config) -> Arc<AppState> {
        let board = Arc::new(board);
        let world = World::new(board.clone(), config.spawn_points.max_count, config.spawn_points.clear_radius);
        Arc::new(AppState {
            world: Mutex::new(world),
            config: Arc::new(RwLock::new(config)),
            board,
            config_path: "unused.json".to_string(),
        })
    }

    fn open_board(w: u32, h: u32, spawns: Vec<(i32, i32)>) -> Board {
        Board::new(w, h, vec![vec![' '; w as usize]; h as usize], spawns)
    }

    async fn connect_client(state: &Arc<AppState>) -> (ClientId, mpsc::Receiver<WsMessage>) {
        let (tx, rx) = mpsc::channel(16);
        let client_id = {
            let mut world = state.world.lock().await;
            world.connections.add(tx, now_ms())
        };
        (client_id, rx)
    }

    fn decode_text(msg: WsMessage) -> Envelope {
        match msg {
            WsMessage::Text(text) => Envelope::decode(&text).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn s1_join_on_empty_board_spawns_at_first_point() {
        let board = open_board(20, 20, vec![(3, 3), (10, 10), (17, 17)]);
        let state = test_state(board, Config::default());
        let (client_id, mut rx) = connect_client(&state).await;

        handle_set_player_name(&state, client_id, "alice".to_string()).await;

        let reply = decode_text(rx.recv().await.unwrap());
        match reply.message {
            Message::Connect(payload) => {
                assert_eq!(payload.player_id, Some(PlayerId(1)));
            }
            other => panic!("expected CONNECT, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn s2_sequential_joins_skip_occupied_spawn() {
        let board = open_board(20, 20, vec![(3, 3), (10, 10), (17, 17)]);
        let state = test_state(board, Config::default());

        let (c1, mut rx1) = connect_client(&state).await;
        handle_set_player_name(&state, c1, "alice".to_string()).await;
        let _ = rx1.recv().await.unwrap();

        let (c2, mut rx2) = connect_client(&state).await;
        handle_set_player_name(&state, c2, "bob".to_string()).await;
        let reply = decode_text(rx2.recv().await.unwrap());
        match reply.message {
            Message::Connect(payload) => {
                let snapshot = payload.game_state.unwrap();
                let bob = snapshot.players.iter().find(|p| p.player_name == "bob").unwrap();
                assert_eq!((bob.x, bob.y), (10, 10));
            }
            other => panic!("expected CONNECT, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn s3_wait_and_release_drains_queue_on_disconnect() {
        let board = open_board(11, 11, vec![(5, 5)]);
        let mut config = Config::default();
        config.disconnect.grace_ms = 0;
        let state = test_state(board, config);

        let (c1, mut rx1) = connect_client(&state).await;
        handle_set_player_name(&state, c1, "p1".to_string()).await;
        let _ = rx1.recv().await.unwrap();

        let (c2, mut rx2) = connect_client(&state).await;
        handle_set_player_name(&state, c2, "p2".to_string()).await;
        let deferred = decode_text(rx2.recv().await.unwrap());
        match deferred.message {
            Message::Connect(payload) => {
                assert!(payload.player_id.is_none());
                assert!(payload.wait_message.is_some());
            }
            other => panic!("expected deferred CONNECT, got {other:?}"),
        }

        handle_disconnect(&state, c1).await;

        let placed = decode_text(rx2.recv().await.unwrap());
        match placed.message {
            Message::Connect(payload) => {
                assert_eq!(payload.player_id, Some(PlayerId(2)));
            }
            other => panic!("expected CONNECT after drain, got {other:?}"),
        }

        // A player placed via the wait-queue drain must be able to move —
        // its connection has to come out of the drain already bound.
        handle_move(&state, c2, MoveDelta::new(1, 0).unwrap()).await;
        let moved = {
            let world = state.world.lock().await;
            world.game.player(PlayerId(2)).and_then(|p| p.position())
        };
        assert_eq!(moved, Some((6, 5)));
    }

    #[tokio::test]
    async fn move_into_a_wall_sends_invalid_move_error() {
        let grid = vec![vec![' ', '#'], vec![' ', ' ']];
        let board = Board::new(2, 2, grid, vec![(0, 0)]);
        let mut config = Config::default();
        config.spawn_points.clear_radius = 0;
        let state = test_state(board, config);
        let (client_id, mut rx) = connect_client(&state).await;

        handle_set_player_name(&state, client_id, "alice".to_string()).await;
        let _ = rx.recv().await.unwrap();

        handle_move(&state, client_id, MoveDelta::new(1, 0).unwrap()).await;
        let reply = decode_text(rx.recv().await.unwrap());
        match reply.message {
            Message::Error(payload) => assert_eq!(payload.code, ErrorCode::InvalidMove),
            other => panic!("expected ERROR, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reconnect_rebinds_without_reallocating_spawn() {
        let board = open_board(20, 20, vec![(3, 3)]);
        let mut config = Config::default();
        config.disconnect.grace_ms = 60_000;
        let state = test_state(board, config);
        let (c1, mut rx1) = connect_client(&state).await;
        handle_set_player_name(&state, c1, "alice".to_string()).await;
        let _ = rx1.recv().await.unwrap();

        handle_disconnect(&state, c1).await;

        let (c2, mut rx2) = connect_client(&state).await;
        let resume = ConnectPayload {
            client_id: None,
            player_id: Some(PlayerId(1)),
            player_name: None,
            game_state: None,
            wait_message: None,
        };
        handle_connect(&state, c2, resume).await;
        let reply = decode_text(rx2.recv().await.unwrap());
        match reply.message {
            Message::Connect(payload) => {
                let snapshot = payload.game_state.unwrap();
                let alice = snapshot.players.iter().find(|p| p.player_name == "alice").unwrap();
                assert_eq!((alice.x, alice.y), (3, 3));
            }
            other => panic!("expected CONNECT, got {other:?}"),
        }
    }
}
