//! Spawn list and FIFO wait queue (spec.md §4.3).

use crate::board::Board;
use protocol::PlayerId;
use std::collections::{HashSet, VecDeque};

pub struct SpawnManager {
    spawn_list: Vec<(i32, i32)>,
    clear_radius: i32,
    wait_queue: VecDeque<PlayerId>,
}

impl SpawnManager {
    /// Builds the effective spawn list: the first `max_count` entries of
    /// `board.spawn_points()`, or — if the board has none — a single
    /// synthetic center point, per spec.md §3.
    pub fn new(board: &Board, max_count: usize, clear_radius: i32) -> Self {
        let mut spawn_list: Vec<(i32, i32)> =
            board.spawn_points().iter().take(max_count).copied().collect();
        if spawn_list.is_empty() {
            spawn_list.push(((board.width() / 2) as i32, (board.height() / 2) as i32));
        }
        SpawnManager {
            spawn_list,
            clear_radius,
            wait_queue: VecDeque::new(),
        }
    }

    pub fn spawn_list(&self) -> &[(i32, i32)] {
        &self.spawn_list
    }

    /// True iff every in-board cell within Manhattan distance `clear_radius`
    /// of `p` is non-wall and unoccupied. Out-of-board cells inside the disk
    /// are skipped rather than treated as blocking — a spawn at or near a
    /// board corner only needs its partial, in-board disk clear (spec.md
    /// §4.3: "for every cell (x,y) inside the board with ... <= R ...").
    pub fn is_available(&self, board: &Board, p: (i32, i32), occupied: &HashSet<(i32, i32)>) -> bool {
        for dx in -self.clear_radius..=self.clear_radius {
            let remaining = self.clear_radius - dx.abs();
            for dy in -remaining..=remaining {
                let cell = (p.0 + dx, p.1 + dy);
                if !board.in_bounds(cell.0, cell.1) {
                    continue;
                }
                if board.is_wall(cell.0, cell.1) {
                    return false;
                }
                if occupied.contains(&cell) {
                    return false;
                }
            }
        }
        true
    }

    pub fn find_spawn(&self, board: &Board, occupied: &HashSet<(i32, i32)>) -> Option<(i32, i32)> {
        self.spawn_list
            .iter()
            .copied()
            .find(|p| self.is_available(board, *p, occupied))
    }

    pub fn enqueue_wait(&mut self, player_id: PlayerId) {
        self.wait_queue.push_back(player_id);
    }

    pub fn dequeue_next_waiting(&mut self) -> Option<PlayerId> {
        self.wait_queue.pop_front()
    }

    pub fn wait_queue_len(&self) -> usize {
        self.wait_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn open_board(w: u32, h: u32) -> Board {
        let grid = vec![vec![' '; w as usize]; h as usize];
        Board::new(w, h, grid, vec![(3, 3), (10, 10), (17, 17)])
    }

    #[test]
    fn radius_zero_only_the_cell_itself_must_be_clear() {
        let board = open_board(20, 20);
        let manager = SpawnManager::new(&board, 25, 0);
        let occupied = HashSet::from([(3, 3)]);
        assert!(!manager.is_available(&board, (3, 3), &occupied));
        assert!(manager.is_available(&board, (4, 4), &occupied));
    }

    #[test]
    fn s1_join_on_empty_board() {
        let board = open_board(20, 20);
        let manager = SpawnManager::new(&board, 25, 3);
        let occupied = HashSet::new();
        assert_eq!(manager.find_spawn(&board, &occupied), Some((3, 3)));
    }

    #[test]
    fn s2_sequential_joins_skip_occupied_spawn() {
        let board = open_board(20, 20);
        let manager = SpawnManager::new(&board, 25, 3);
        let occupied = HashSet::from([(3, 3)]);
        assert_eq!(manager.find_spawn(&board, &occupied), Some((10, 10)));
    }

    #[test]
    fn s3_single_spawn_defers_then_drains() {
        let grid = vec![vec![' '; 11]; 11];
        let board = Board::new(11, 11, grid, vec![(5, 5)]);
        let manager = SpawnManager::new(&board, 25, 3);
        let occupied = HashSet::from([(5, 5)]);
        assert_eq!(manager.find_spawn(&board, &occupied), None);
        assert_eq!(manager.find_spawn(&board, &HashSet::new()), Some((5, 5)));
    }

    #[test]
    fn wait_queue_is_fifo() {
        let board = open_board(5, 5);
        let mut manager = SpawnManager::new(&board, 25, 3);
        manager.enqueue_wait(PlayerId(1));
        manager.enqueue_wait(PlayerId(2));
        assert_eq!(manager.dequeue_next_waiting(), Some(PlayerId(1)));
        assert_eq!(manager.dequeue_next_waiting(), Some(PlayerId(2)));
        assert_eq!(manager.dequeue_next_waiting(), None);
    }

    #[test]
    fn empty_spawn_points_use_synthetic_center() {
        let grid = vec![vec![' '; 8]; 6];
        let board = Board::new(8, 6, grid, vec![]);
        let manager = SpawnManager::new(&board, 0, 3);
        assert_eq!(manager.spawn_list(), &[(4, 3)]);
    }

    #[test]
    fn corner_spawn_partial_disk_must_be_fully_clear() {
        // Board where (0,0) is a valid spawn corner; only in-board cells of the
        // disk need to be clear, but any wall among them still blocks it.
        let mut grid = vec![vec![' '; 6]; 6];
        grid[0][1] = '#'; // Wall adjacent to the corner spawn.
        let board = Board::new(6, 6, grid, vec![(0, 0)]);
        let manager = SpawnManager::new(&board, 25, 3);
        assert!(!manager.is_available(&board, (0, 0), &HashSet::new()));
    }

    #[test]
    fn corner_spawn_with_clear_partial_disk_passes() {
        // Same corner, no wall this time: the disk's out-of-board cells are
        // skipped rather than counted as blocking, so the spawn is available.
        let grid = vec![vec![' '; 6]; 6];
        let board = Board::new(6, 6, grid, vec![(0, 0)]);
        let manager = SpawnManager::new(&board, 25, 3);
        assert!(manager.is_available(&board, (0, 0), &HashSet::new()));
    }
}
