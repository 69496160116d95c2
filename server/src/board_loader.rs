//! The board/map file format is explicitly out of scope (spec.md §1): the
//! core "receives an already-decoded board". This loader is the thin
//! external adapter that does that decoding once at startup, so the binary
//! is actually runnable — it is not part of the core and does no parsing
//! beyond JSON.

use game_core::Board;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct DecodedBoard {
    width: u32,
    height: u32,
    grid: Vec<Vec<char>>,
    #[serde(default, rename = "spawnPoints")]
    spawn_points: Vec<(i32, i32)>,
}

pub async fn load_board(path: &str) -> Result<Arc<Board>, crate::error::ServerError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| crate::error::ServerError::BoardRead {
            path: path.to_string(),
            source,
        })?;
    let decoded: DecodedBoard =
        serde_json::from_str(&text).map_err(|source| crate::error::ServerError::BoardParse {
            path: path.to_string(),
            source,
        })?;
    Ok(Arc::new(Board::new(
        decoded.width,
        decoded.height,
        decoded.grid,
        decoded.spawn_points,
    )))
}
