//! Client-side movement prediction (spec.md §4.9). Calls the exact same
//! `validate_move` the server uses, so a predicted step either matches the
//! server's eventual answer or gets corrected by the `Reconciler` — never a
//! second, divergent copy of the movement rules.

use game_core::{validate_move, Board, Entity, ValidationWorld};
use std::collections::HashSet;

pub struct Predictor {
    predicted: Option<(i32, i32)>,
}

impl Predictor {
    pub fn new() -> Self {
        Predictor { predicted: None }
    }

    /// Seeds the predicted position from the first authoritative snapshot
    /// naming the local player. No prediction exists before this is called.
    pub fn initialize(&mut self, server_pos: (i32, i32)) {
        self.predicted = Some(server_pos);
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        self.predicted
    }

    pub fn reset(&mut self) {
        self.predicted = None;
    }

    /// Applies one step of input locally. The `MOVE` is always sent to the
    /// server regardless of what this returns (spec.md §4.9) — this only
    /// decides what to render in the meantime. Returns the new predicted
    /// position, or `None` if prediction has not been initialized yet or the
    /// move fails the same checks the server would apply.
    pub fn on_input(
        &mut self,
        dx: i32,
        dy: i32,
        board: &Board,
        entities: &[Entity],
        other_positions: &HashSet<(i32, i32)>,
    ) -> Option<(i32, i32)> {
        let current = self.predicted?;
        let world = ValidationWorld {
            board,
            entities,
            other_player_positions: other_positions,
        };
        match validate_move(&world, current, dx, dy) {
            Ok(new_pos) => {
                self.predicted = Some(new_pos);
                Some(new_pos)
            }
            Err(_) => None,
        }
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Predictor::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::EntityId;

    fn open_board() -> Board {
        let grid = vec![
            vec!['#', '#', '#', '#', '#'],
            vec!['#', ' ', ' ', ' ', '#'],
            vec!['#', ' ', ' ', ' ', '#'],
            vec!['#', '#', '#', '#', '#'],
        ];
        Board::new(5, 4, grid, vec![])
    }

    #[test]
    fn uninitialized_predictor_yields_nothing() {
        let mut predictor = Predictor::new();
        let board = open_board();
        let result = predictor.on_input(1, 0, &board, &[], &HashSet::new());
        assert!(result.is_none());
        assert!(predictor.position().is_none());
    }

    #[test]
    fn valid_step_advances_prediction() {
        let mut predictor = Predictor::new();
        predictor.initialize((1, 1));
        let board = open_board();
        let result = predictor.on_input(1, 0, &board, &[], &HashSet::new());
        assert_eq!(result, Some((2, 1)));
        assert_eq!(predictor.position(), Some((2, 1)));
    }

    #[test]
    fn step_into_wall_leaves_prediction_unchanged() {
        let mut predictor = Predictor::new();
        predictor.initialize((1, 1));
        let board = open_board();
        let result = predictor.on_input(-1, 0, &board, &[], &HashSet::new());
        assert!(result.is_none());
        assert_eq!(predictor.position(), Some((1, 1)));
    }

    #[test]
    fn step_into_solid_entity_is_rejected() {
        let mut predictor = Predictor::new();
        predictor.initialize((1, 1));
        let board = open_board();
        let entities = vec![Entity {
            entity_id: EntityId(1),
            x: 2,
            y: 1,
            glyph: 'x',
            color: "red".into(),
            solid: true,
            z_order: 0,
            entity_type: "crate".into(),
        }];
        let result = predictor.on_input(1, 0, &board, &entities, &HashSet::new());
        assert!(result.is_none());
    }
}
