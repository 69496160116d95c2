//! The single movement-validation routine shared, verbatim, between the
//! server's `GameState::move_player` and the client's `Predictor`
//! (spec.md §4.4 / §4.9 — "matches client prediction exactly"). Keeping one
//! function rather than two parallel implementations is what makes that
//! guarantee checkable instead of aspirational.

use crate::board::Board;
use crate::entity::Entity;
use protocol::MoveRejectionReason;
use std::collections::HashSet;

/// Everything `validate_move` needs to know about, borrowed rather than
/// owned so both the server (borrowing live `GameState` fields) and the
/// client (borrowing its latest cached snapshot) can call it without a copy.
pub struct ValidationWorld<'a> {
    pub board: &'a Board,
    pub entities: &'a [Entity],
    pub other_player_positions: &'a HashSet<(i32, i32)>,
}

/// Applies the four-step check in order and returns the new position on
/// success. One cell per call — no pathing, diagonals permitted.
pub fn validate_move(
    world: &ValidationWorld,
    current: (i32, i32),
    dx: i32,
    dy: i32,
) -> Result<(i32, i32), MoveRejectionReason> {
    let new_pos = (current.0 + dx, current.1 + dy);

    if !world.board.in_bounds(new_pos.0, new_pos.1) {
        return Err(MoveRejectionReason::Bounds);
    }
    if world.board.is_wall(new_pos.0, new_pos.1) {
        return Err(MoveRejectionReason::Wall);
    }
    if world
        .entities
        .iter()
        .any(|e| e.solid && (e.x, e.y) == new_pos)
    {
        return Err(MoveRejectionReason::Entity);
    }
    if world.other_player_positions.contains(&new_pos) {
        return Err(MoveRejectionReason::Player);
    }

    Ok(new_pos)
}
