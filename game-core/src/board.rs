//! The read-only decoded grid (spec.md §4.1). Immutable for the lifetime of
//! a session and cheap to share behind an `Arc` — `GameState` and
//! `SpawnManager` both hold a reference rather than a copy.

use protocol::BoardWire;

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    width: u32,
    height: u32,
    grid: Vec<Vec<char>>,
    spawn_points: Vec<(i32, i32)>,
}

impl Board {
    pub fn new(width: u32, height: u32, grid: Vec<Vec<char>>, spawn_points: Vec<(i32, i32)>) -> Self {
        debug_assert_eq!(grid.len() as u32, height, "grid row count must match height");
        Board {
            width,
            height,
            grid,
            spawn_points,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn spawn_points(&self) -> &[(i32, i32)] {
        &self.spawn_points
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// `None` for out-of-bounds cells.
    pub fn get_cell(&self, x: i32, y: i32) -> Option<char> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.grid.get(y as usize)?.get(x as usize).copied()
    }

    /// Out-of-bounds counts as a wall, as a convenience for callers that
    /// would otherwise have to check bounds separately (spec.md §4.1).
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        match self.get_cell(x, y) {
            Some(cell) => cell == '#',
            None => true,
        }
    }

    pub fn serialize(&self) -> BoardWire {
        BoardWire {
            width: self.width,
            height: self.height,
            grid: self.grid.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_board() -> Board {
        // 4x3, walls around the border.
        let grid = vec![
            vec!['#', '#', '#', '#'],
            vec!['#', ' ', ' ', '#'],
            vec!['#', '#', '#', '#'],
        ];
        Board::new(4, 3, grid, vec![(1, 1), (2, 1)])
    }

    #[test]
    fn out_of_bounds_is_wall_and_none() {
        let board = small_board();
        assert!(board.is_wall(-1, 0));
        assert!(board.is_wall(4, 0));
        assert_eq!(board.get_cell(-1, 0), None);
        assert_eq!(board.get_cell(100, 100), None);
    }

    #[test]
    fn interior_passable_cell() {
        let board = small_board();
        assert!(!board.is_wall(1, 1));
        assert_eq!(board.get_cell(1, 1), Some(' '));
    }

    #[test]
    fn border_cell_is_wall() {
        let board = small_board();
        assert!(board.is_wall(0, 0));
    }

    #[test]
    fn serialize_round_trips_grid() {
        let board = small_board();
        let wire = board.serialize();
        assert_eq!(wire.width, 4);
        assert_eq!(wire.height, 3);
        assert_eq!(wire.grid[1][1], ' ');
    }
}
