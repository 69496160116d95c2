//! Periodic reconciliation against the authoritative snapshot (spec.md §4.9
//! / §8). Runs on a timer rather than on every `STATE_UPDATE`, matching the
//! `reconciliationIntervalMs` config knob, and is idempotent: calling
//! `reconcile` twice in a row with no new input between them leaves the
//! predictor wherever the first call put it.

use protocol::{PlayerId, StateUpdatePayload};
use std::time::Duration;

use crate::predictor::Predictor;

pub struct Reconciler {
    interval: Duration,
    since_last_ms: u64,
}

impl Reconciler {
    pub fn new(interval_ms: u64) -> Self {
        Reconciler {
            interval: Duration::from_millis(interval_ms),
            since_last_ms: 0,
        }
    }

    /// Advances the internal timer. Returns `true` once `elapsed_ms` of
    /// accumulated time has crossed the configured interval, resetting the
    /// accumulator — the caller is expected to call `reconcile` exactly when
    /// this returns `true`.
    pub fn tick(&mut self, elapsed_ms: u64) -> bool {
        self.since_last_ms += elapsed_ms;
        if self.since_last_ms >= self.interval.as_millis() as u64 {
            self.since_last_ms = 0;
            true
        } else {
            false
        }
    }

    /// Corrects `predictor` in place if its position disagrees with the
    /// authoritative snapshot's entry for `local_player_id`. Returns
    /// `Some((old, new))` when a correction was applied, `None` when the
    /// prediction already agreed (or the local player isn't in the snapshot,
    /// e.g. it hasn't spawned yet).
    pub fn reconcile(
        &self,
        predictor: &mut Predictor,
        local_player_id: PlayerId,
        snapshot: &StateUpdatePayload,
    ) -> Option<((i32, i32), (i32, i32))> {
        let authoritative = snapshot
            .players
            .iter()
            .find(|p| p.player_id == local_player_id)
            .map(|p| (p.x, p.y))?;

        let predicted = predictor.position();
        if predicted == Some(authoritative) {
            return None;
        }

        let old = predicted.unwrap_or(authoritative);
        predictor.initialize(authoritative);
        Some((old, authoritative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{BoardWire, ClientId, PlayerWire};

    fn snapshot(player_id: PlayerId, x: i32, y: i32) -> StateUpdatePayload {
        StateUpdatePayload {
            board: BoardWire {
                width: 5,
                height: 5,
                grid: vec![vec![' '; 5]; 5],
            },
            players: vec![PlayerWire {
                player_id,
                player_name: "alice".to_string(),
                client_id: ClientId(1),
                x,
                y,
                vx: None,
                vy: None,
            }],
            entities: vec![],
            score: 0,
        }
    }

    #[test]
    fn agreeing_prediction_is_left_untouched() {
        let mut predictor = Predictor::new();
        predictor.initialize((3, 3));
        let reconciler = Reconciler::new(1_000);
        let result = reconciler.reconcile(&mut predictor, PlayerId(1), &snapshot(PlayerId(1), 3, 3));
        assert!(result.is_none());
        assert_eq!(predictor.position(), Some((3, 3)));
    }

    #[test]
    fn disagreeing_prediction_is_corrected() {
        let mut predictor = Predictor::new();
        predictor.initialize((3, 3));
        let reconciler = Reconciler::new(1_000);
        let result = reconciler.reconcile(&mut predictor, PlayerId(1), &snapshot(PlayerId(1), 5, 5));
        assert_eq!(result, Some(((3, 3), (5, 5))));
        assert_eq!(predictor.position(), Some((5, 5)));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut predictor = Predictor::new();
        predictor.initialize((3, 3));
        let reconciler = Reconciler::new(1_000);
        let snap = snapshot(PlayerId(1), 5, 5);
        reconciler.reconcile(&mut predictor, PlayerId(1), &snap);
        let second = reconciler.reconcile(&mut predictor, PlayerId(1), &snap);
        assert!(second.is_none());
        assert_eq!(predictor.position(), Some((5, 5)));
    }

    #[test]
    fn tick_fires_once_interval_elapsed() {
        let mut reconciler = Reconciler::new(100);
        assert!(!reconciler.tick(60));
        assert!(reconciler.tick(60));
        assert!(!reconciler.tick(10));
    }
}
