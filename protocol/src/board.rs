//! Wire shape of the board, as it travels inside `STATE_UPDATE`.
//!
//! The board itself (cell lookups, wall tests) lives in `game-core`; this is
//! just the serialized form the two sides agree on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardWire {
    pub width: u32,
    pub height: u32,
    pub grid: Vec<Vec<char>>,
}
