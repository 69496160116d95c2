//! The single logical writer (spec.md §5): `GameState`, `SpawnManager`, and
//! `ConnectionManager` live behind one mutex rather than three, since every
//! operation that needs more than one of them (a join, a disconnect-drain)
//! would otherwise need to take several locks in a consistent order anyway.

use game_core::{Board, GameState, SpawnManager};
use protocol::Config;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::connection::ConnectionManager;

pub struct World {
    pub game: GameState,
    pub spawn: SpawnManager,
    pub connections: ConnectionManager,
}

impl World {
    pub fn new(board: Arc<Board>, max_count: usize, clear_radius: i32) -> Self {
        let spawn = SpawnManager::new(&board, max_count, clear_radius);
        World {
            game: GameState::new(board),
            spawn,
            connections: ConnectionManager::new(),
        }
    }
}

pub struct AppState {
    pub world: Mutex<World>,
    pub config: Arc<RwLock<Config>>,
    pub board: Arc<Board>,
    pub config_path: String,
}

impl AppState {
    pub fn new(board: Arc<Board>, config: Config, config_path: String) -> Self {
        let world = World::new(
            board.clone(),
            config.spawn_points.max_count,
            config.spawn_points.clear_radius,
        );
        AppState {
            world: Mutex::new(world),
            config: crate::config::shared(config),
            board,
            config_path,
        }
    }
}
