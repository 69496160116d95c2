//! `Player` and its lifecycle states (spec.md §3).

use protocol::{ClientId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Joined but no spawn has been allocated yet; sitting in the wait queue.
    Waiting,
    Active,
    /// Socket closed; kept around for `graceMs` in case of reconnect.
    DisconnectedGrace,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub player_id: PlayerId,
    pub player_name: String,
    pub client_id: ClientId,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub last_x: Option<i32>,
    pub last_y: Option<i32>,
    pub last_moved_at_ms: Option<u64>,
    pub state: PlayerState,
    pub disconnected_at_ms: Option<u64>,
}

impl Player {
    pub fn new(player_id: PlayerId, player_name: String, client_id: ClientId) -> Self {
        Player {
            player_id,
            player_name,
            client_id,
            x: None,
            y: None,
            last_x: None,
            last_y: None,
            last_moved_at_ms: None,
            state: PlayerState::Waiting,
            disconnected_at_ms: None,
        }
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == PlayerState::Active
    }

    /// Active players and players in their post-disconnect grace window both
    /// still hold their cell — a grace player might reconnect, so its spawn
    /// point must not be handed to anyone else in the meantime.
    pub fn occupies_cell(&self) -> bool {
        matches!(self.state, PlayerState::Active | PlayerState::DisconnectedGrace)
    }
}
