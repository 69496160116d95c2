//! The three collaborator capabilities spec.md §1/§6 deliberately keep out
//! of this core: rendering, input capture, and the board/map file format.
//! Interfaces only — no implementation ships here.

use game_core::Board;
use protocol::{BoardWire, EntityWire, PlayerWire};

pub trait Renderer {
    fn draw_cell(&mut self, x: i32, y: i32, glyph: char, color: &str);
    fn restore_cell(&mut self, x: i32, y: i32, board: &Board, other_players: &[PlayerWire], entities: &[EntityWire]);
    fn render_status(&mut self, score: i64, pos: (i32, i32), board_height: u32);
}

pub trait Input {
    fn on_move(&mut self, callback: Box<dyn FnMut(i32, i32) + Send>);
    fn on_quit(&mut self, callback: Box<dyn FnMut() + Send>);
}

pub trait BoardSource {
    fn load(&self) -> BoardWire;
}
