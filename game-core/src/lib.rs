//! Shared game logic: the board, spawn allocation, player/world state, and
//! the single movement-validation routine the server and the client
//! `Predictor` both call, so "matches client prediction exactly"
//! (spec.md §4.9) is a property of the code, not a convention.

pub mod board;
pub mod entity;
pub mod player;
pub mod spawn;
pub mod state;
pub mod validate;

pub use board::Board;
pub use entity::Entity;
pub use player::{Player, PlayerState};
pub use spawn::SpawnManager;
pub use state::{GameState, MoveError};
pub use validate::{validate_move, ValidationWorld};
