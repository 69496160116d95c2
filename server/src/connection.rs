//! Connection registry (spec.md §4.5). Tracks connections by a freshly
//! issued, opaque `ClientId`; the mapping to a `PlayerId` is established
//! only once a join (or reconnect) succeeds.

use axum::extract::ws::Message as WsMessage;
use protocol::{ClientId, PlayerId};
use std::collections::HashMap;
use tokio::sync::mpsc;

pub struct Connection {
    pub client_id: ClientId,
    pub sender: mpsc::Sender<WsMessage>,
    pub connected_at_ms: u64,
    pub last_activity_ms: u64,
    pub player_id: Option<PlayerId>,
}

pub struct ConnectionManager {
    connections: HashMap<ClientId, Connection>,
    next_client_id: u64,
}

impl ConnectionManager {
    pub fn new() -> Self {
        ConnectionManager {
            connections: HashMap::new(),
            next_client_id: 1,
        }
    }

    pub fn add(&mut self, sender: mpsc::Sender<WsMessage>, now_ms: u64) -> ClientId {
        let client_id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        self.connections.insert(
            client_id,
            Connection {
                client_id,
                sender,
                connected_at_ms: now_ms,
                last_activity_ms: now_ms,
                player_id: None,
            },
        );
        client_id
    }

    pub fn remove(&mut self, client_id: ClientId) -> Option<Connection> {
        self.connections.remove(&client_id)
    }

    pub fn bind(&mut self, client_id: ClientId, player_id: PlayerId) {
        if let Some(conn) = self.connections.get_mut(&client_id) {
            conn.player_id = Some(player_id);
        }
    }

    pub fn by_client_id(&self, client_id: ClientId) -> Option<&Connection> {
        self.connections.get(&client_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn touch(&mut self, client_id: ClientId, now_ms: u64) {
        if let Some(conn) = self.connections.get_mut(&client_id) {
            conn.last_activity_ms = now_ms;
        }
    }

    /// Connections whose last activity is older than `timeout_ms` — the
    /// fallback to a missed pong response (spec.md §4.5 liveness).
    pub fn dead_connections(&self, now_ms: u64, timeout_ms: u64) -> Vec<ClientId> {
        self.connections
            .values()
            .filter(|conn| now_ms.saturating_sub(conn.last_activity_ms) > timeout_ms)
            .map(|conn| conn.client_id)
            .collect()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
