//! `GameState`: players, score, movement application, serialization
//! (spec.md §4.4). The server is the sole mutator; every read handed out
//! across a component boundary is a value copy (`serialize`), never a
//! reference into live state.

use crate::board::Board;
use crate::entity::Entity;
use crate::player::{Player, PlayerState};
use crate::validate::{validate_move, ValidationWorld};
use protocol::{ClientId, EntityWire, MoveRejectionReason, PlayerId, PlayerWire, StateUpdatePayload};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Why a `movePlayer` call did not result in a position change, beyond the
/// four validation reasons that travel over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// The player has no position yet (still `Waiting`) or is unknown.
    NotActive,
    Rejected(MoveRejectionReason),
}

pub struct GameState {
    board: Arc<Board>,
    players: HashMap<PlayerId, Player>,
    entities: Vec<Entity>,
    score: i64,
    next_player_id: u64,
}

impl GameState {
    pub fn new(board: Arc<Board>) -> Self {
        GameState {
            board,
            players: HashMap::new(),
            entities: Vec::new(),
            score: 0,
            next_player_id: 1,
        }
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn set_entities(&mut self, entities: Vec<Entity>) {
        self.entities = entities;
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn find_by_client(&self, client_id: ClientId) -> Option<&Player> {
        self.players.values().find(|p| p.client_id == client_id)
    }

    /// Creates a player in `Waiting` state. Not yet positioned on the board.
    pub fn add_player(&mut self, player_name: String, client_id: ClientId) -> PlayerId {
        let player_id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        self.players
            .insert(player_id, Player::new(player_id, player_name, client_id));
        player_id
    }

    /// Sets position and activates; stamps `last_moved_at` so velocity is
    /// zero until the next move (spec.md §6: "zero when no previous position").
    pub fn place_player(&mut self, player_id: PlayerId, x: i32, y: i32, now_ms: u64) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.x = Some(x);
            player.y = Some(y);
            player.last_x = Some(x);
            player.last_y = Some(y);
            player.last_moved_at_ms = Some(now_ms);
            player.state = PlayerState::Active;
        }
    }

    /// All positions still held by a player — active or mid-grace-window —
    /// optionally excluding one (used so a player's own cell doesn't block
    /// its own move). Grace-window players are included so their spawn point
    /// isn't handed to a new join or a wait-queue drain while they might
    /// still reconnect (spec.md §8 invariant 1).
    pub fn occupied_positions_excluding(&self, exclude: Option<PlayerId>) -> HashSet<(i32, i32)> {
        self.players
            .values()
            .filter(|p| p.occupies_cell() && Some(p.player_id) != exclude)
            .filter_map(|p| p.position())
            .collect()
    }

    /// Atomic move application: validates via the shared `validate_move`,
    /// then on success updates `last*` (for velocity) and the position.
    pub fn move_player(&mut self, player_id: PlayerId, dx: i32, dy: i32, now_ms: u64) -> Result<(i32, i32), MoveError> {
        let Some(player) = self.players.get(&player_id) else {
            return Err(MoveError::NotActive);
        };
        let Some(current) = player.position() else {
            return Err(MoveError::NotActive);
        };
        if !player.is_active() {
            return Err(MoveError::NotActive);
        }

        let others = self.occupied_positions_excluding(Some(player_id));
        let world = ValidationWorld {
            board: &self.board,
            entities: &self.entities,
            other_player_positions: &others,
        };
        let new_pos = validate_move(&world, current, dx, dy).map_err(MoveError::Rejected)?;

        let player = self.players.get_mut(&player_id).expect("checked above");
        player.last_x = Some(current.0);
        player.last_y = Some(current.1);
        player.last_moved_at_ms = Some(now_ms);
        player.x = Some(new_pos.0);
        player.y = Some(new_pos.1);
        Ok(new_pos)
    }

    pub fn remove_player(&mut self, player_id: PlayerId) {
        self.players.remove(&player_id);
    }

    pub fn mark_disconnected_grace(&mut self, player_id: PlayerId, now_ms: u64) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.state = PlayerState::DisconnectedGrace;
            player.disconnected_at_ms = Some(now_ms);
        }
    }

    /// Rebinds a reconnecting player's connection without touching position
    /// (spec.md §4.5).
    pub fn rebind_client(&mut self, player_id: PlayerId, new_client_id: ClientId) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.client_id = new_client_id;
            player.state = PlayerState::Active;
            player.disconnected_at_ms = None;
        }
    }

    /// Full snapshot, with `vx`/`vy` derived per spec.md §6:
    /// `(x - lastX) / dt`, zero when there is no previous position or
    /// `dt == 0`.
    pub fn serialize(&self, now_ms: u64) -> StateUpdatePayload {
        let players: Vec<PlayerWire> = self
            .players
            .values()
            .filter(|p| p.is_active())
            .filter_map(|p| {
                let (x, y) = p.position()?;
                let (vx, vy) = velocity(p, now_ms);
                Some(PlayerWire {
                    player_id: p.player_id,
                    player_name: p.player_name.clone(),
                    client_id: p.client_id,
                    x,
                    y,
                    vx: Some(vx),
                    vy: Some(vy),
                })
            })
            .collect();

        let entities = self
            .entities
            .iter()
            .map(|e| EntityWire {
                entity_id: e.entity_id,
                x: e.x,
                y: e.y,
                glyph: e.glyph,
                color: e.color.clone(),
                solid: e.solid,
                z_order: e.z_order,
                entity_type: e.entity_type.clone(),
            })
            .collect();

        StateUpdatePayload {
            board: self.board.serialize(),
            players,
            entities,
            score: self.score,
        }
    }
}

fn velocity(player: &Player, now_ms: u64) -> (f32, f32) {
    let (Some(x), Some(y), Some(last_x), Some(last_y), Some(last_moved_at)) =
        (player.x, player.y, player.last_x, player.last_y, player.last_moved_at_ms)
    else {
        return (0.0, 0.0);
    };
    let dt_ms = now_ms.saturating_sub(last_moved_at);
    if dt_ms == 0 {
        return (0.0, 0.0);
    }
    let dt = dt_ms as f32 / 1000.0;
    (
        (x - last_x) as f32 / dt,
        (y - last_y) as f32 / dt,
    )
}
