//! Wires inbound envelopes into the predictor/interpolator pair (spec.md
//! §4.12). Deliberately not an `impl NetClientEvents` itself — `Renderer` is
//! an unconstrained type parameter here and piling a `Send` bound through it
//! just to satisfy `NetClientEvents: Send` is more trouble than it's worth.
//! The embedding application calls `handle_envelope` from its own
//! `NetClientEvents::on_message`.

use game_core::Board;
use protocol::{Envelope, Message, PlayerId, StateUpdatePayload};
use std::collections::HashSet;
use std::sync::Arc;

use crate::collab::Renderer;
use crate::interpolator::{Interpolator, SnapshotEntry};
use crate::predictor::Predictor;

pub struct ClientLoop<R: Renderer> {
    renderer: Option<R>,
    board: Arc<Board>,
    local_player_id: Option<PlayerId>,
    predictor: Predictor,
    interpolator: Interpolator,
    last_snapshot: Option<StateUpdatePayload>,
    known_remote_ids: HashSet<PlayerId>,
    /// `server_timestamp - local_arrival_ms` of the most recent snapshot,
    /// used to translate a local clock reading into the server's clock
    /// basis so it can be compared against buffer entries (see
    /// `server_time_now`) — the buffer itself is stamped with the server's
    /// own `STATE_UPDATE` timestamp (spec.md §3), not arrival time.
    clock_offset_ms: Option<i64>,
}

impl<R: Renderer> ClientLoop<R> {
    pub fn new(board: Arc<Board>, interpolator: Interpolator) -> Self {
        ClientLoop {
            renderer: None,
            board,
            local_player_id: None,
            predictor: Predictor::new(),
            interpolator,
            last_snapshot: None,
            known_remote_ids: HashSet::new(),
            clock_offset_ms: None,
        }
    }

    pub fn attach_renderer(&mut self, renderer: R) {
        self.renderer = Some(renderer);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn local_player_id(&self) -> Option<PlayerId> {
        self.local_player_id
    }

    pub fn predictor(&mut self) -> &mut Predictor {
        &mut self.predictor
    }

    pub fn interpolator(&mut self) -> &mut Interpolator {
        &mut self.interpolator
    }

    pub fn last_snapshot(&self) -> Option<&StateUpdatePayload> {
        self.last_snapshot.as_ref()
    }

    /// Translates a local clock reading into the server's clock basis using
    /// the offset observed at the last snapshot, so the caller can pass a
    /// value comparable to the buffer's server-stamped timestamps into
    /// `Interpolator::tick`. Returns `local_now_ms` unchanged until the
    /// first snapshot has been ingested.
    pub fn server_time_now(&self, local_now_ms: u64) -> u64 {
        match self.clock_offset_ms {
            Some(offset) => (local_now_ms as i64 + offset).max(0) as u64,
            None => local_now_ms,
        }
    }

    /// Dispatches one envelope from the server. `arrival_ms` is when this
    /// envelope was received locally — used only to update the clock-offset
    /// estimate (`server_time_now`), never as a buffer timestamp. The
    /// interpolation buffer is stamped with the envelope's own `timestamp`
    /// field, the server-stamped time spec.md §3 specifies.
    pub fn handle_envelope(&mut self, envelope: Envelope, arrival_ms: u64) {
        let server_ts = envelope.timestamp;
        match envelope.message {
            Message::Connect(payload) => {
                if let Some(player_id) = payload.player_id {
                    if self.local_player_id.is_none() {
                        self.local_player_id = Some(player_id);
                    }
                }
                if let Some(snapshot) = payload.game_state {
                    self.ingest_snapshot(snapshot, server_ts, arrival_ms);
                }
            }
            Message::StateUpdate(snapshot) => {
                self.ingest_snapshot(snapshot, server_ts, arrival_ms);
            }
            Message::PlayerLeft { player_id } => {
                self.interpolator.drop_player(player_id);
                self.known_remote_ids.remove(&player_id);
            }
            _ => {}
        }
    }

    fn ingest_snapshot(&mut self, snapshot: StateUpdatePayload, server_ts: u64, arrival_ms: u64) {
        self.clock_offset_ms = Some(server_ts as i64 - arrival_ms as i64);

        let mut present = HashSet::new();
        for player in &snapshot.players {
            present.insert(player.player_id);

            let is_local = self.local_player_id == Some(player.player_id);
            if is_local {
                continue;
            }

            self.known_remote_ids.insert(player.player_id);
            self.interpolator.ingest(
                player.player_id,
                SnapshotEntry {
                    t: server_ts,
                    x: player.x,
                    y: player.y,
                    vx: player.vx,
                    vy: player.vy,
                },
            );
        }

        let stale: Vec<PlayerId> = self
            .known_remote_ids
            .iter()
            .filter(|id| !present.contains(id))
            .copied()
            .collect();
        for id in stale {
            self.interpolator.drop_player(id);
            self.known_remote_ids.remove(&id);
        }

        if self.local_player_id.is_none() {
            if let Some(first) = snapshot.players.first() {
                self.local_player_id = Some(first.player_id);
            }
        }
        if let Some(local_id) = self.local_player_id {
            if self.predictor.position().is_none() {
                if let Some(player) = snapshot.players.iter().find(|p| p.player_id == local_id) {
                    self.predictor.initialize((player.x, player.y));
                }
            }
        }

        self.last_snapshot = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{BoardWire, ClientId, PlayerWire};

    struct NullRenderer;
    impl Renderer for NullRenderer {
        fn draw_cell(&mut self, _x: i32, _y: i32, _glyph: char, _color: &str) {}
        fn restore_cell(
            &mut self,
            _x: i32,
            _y: i32,
            _board: &Board,
            _other_players: &[PlayerWire],
            _entities: &[protocol::EntityWire],
        ) {
        }
        fn render_status(&mut self, _score: i64, _pos: (i32, i32), _board_height: u32) {}
    }

    fn board() -> Arc<Board> {
        Arc::new(Board::new(5, 5, vec![vec![' '; 5]; 5], vec![]))
    }

    fn snapshot(players: Vec<PlayerWire>) -> StateUpdatePayload {
        StateUpdatePayload {
            board: BoardWire { width: 5, height: 5, grid: vec![vec![' '; 5]; 5] },
            players,
            entities: vec![],
            score: 0,
        }
    }

    fn player(id: u64, x: i32, y: i32) -> PlayerWire {
        PlayerWire {
            player_id: PlayerId(id),
            player_name: format!("p{id}"),
            client_id: ClientId(id),
            x,
            y,
            vx: None,
            vy: None,
        }
    }

    #[test]
    fn first_snapshot_initializes_local_predictor() {
        let mut loop_ = ClientLoop::<NullRenderer>::new(board(), Interpolator::new(100, 20, 300));
        loop_.local_player_id = Some(PlayerId(1));
        let envelope = Envelope::new(
            Message::StateUpdate(snapshot(vec![player(1, 2, 2), player(2, 4, 4)])),
            1_000,
        );
        loop_.handle_envelope(envelope, 1_000);

        assert_eq!(loop_.predictor().position(), Some((2, 2)));
        assert!(loop_.interpolator().tick(1_100).contains_key(&PlayerId(2)));
        assert!(!loop_.interpolator().tick(1_100).contains_key(&PlayerId(1)));
    }

    #[test]
    fn player_left_drops_interpolation_buffer() {
        let mut loop_ = ClientLoop::<NullRenderer>::new(board(), Interpolator::new(100, 20, 300));
        loop_.local_player_id = Some(PlayerId(1));
        loop_.handle_envelope(
            Envelope::new(Message::StateUpdate(snapshot(vec![player(1, 0, 0), player(2, 1, 1)])), 1_000),
            1_000,
        );
        loop_.handle_envelope(Envelope::new(Message::PlayerLeft { player_id: PlayerId(2) }, 1_050), 1_050);

        assert!(loop_.interpolator().tick(1_100).is_empty());
    }

    #[test]
    fn snapshot_dropping_a_remote_player_clears_its_buffer() {
        let mut loop_ = ClientLoop::<NullRenderer>::new(board(), Interpolator::new(100, 20, 300));
        loop_.local_player_id = Some(PlayerId(1));
        loop_.handle_envelope(
            Envelope::new(Message::StateUpdate(snapshot(vec![player(1, 0, 0), player(2, 1, 1)])), 1_000),
            1_000,
        );
        loop_.handle_envelope(
            Envelope::new(Message::StateUpdate(snapshot(vec![player(1, 0, 0)])), 1_100),
            1_100,
        );

        assert!(loop_.interpolator().tick(1_200).is_empty());
    }

    #[test]
    fn server_time_now_tracks_offset_between_clocks() {
        let mut loop_ = ClientLoop::<NullRenderer>::new(board(), Interpolator::new(100, 20, 300));
        loop_.local_player_id = Some(PlayerId(1));
        // Server clock runs 5_000ms ahead of the local clock at receipt time.
        loop_.handle_envelope(
            Envelope::new(Message::StateUpdate(snapshot(vec![player(1, 0, 0)])), 6_000),
            1_000,
        );
        assert_eq!(loop_.server_time_now(1_200), 6_200);
    }
}
