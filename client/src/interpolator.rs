//! Remote-entity interpolation (spec.md §4.11). Each remote player's
//! positions are buffered with their arrival timestamp; rendering looks
//! `delayMs` into the past and linearly interpolates between the two
//! snapshots bracketing that render time, so remote motion stays smooth
//! between `STATE_UPDATE`s instead of snapping.

use protocol::PlayerId;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotEntry {
    pub t: u64,
    pub x: i32,
    pub y: i32,
    pub vx: Option<f32>,
    pub vy: Option<f32>,
}

pub struct Interpolator {
    delay_ms: u64,
    max_entries: usize,
    extrapolation_max_ms: u64,
    buffers: HashMap<PlayerId, VecDeque<SnapshotEntry>>,
}

impl Interpolator {
    pub fn new(delay_ms: u64, max_entries: usize, extrapolation_max_ms: u64) -> Self {
        Interpolator {
            delay_ms,
            max_entries,
            extrapolation_max_ms,
            buffers: HashMap::new(),
        }
    }

    /// Appends a freshly received position for `player_id`, dropping the
    /// oldest entry once the buffer exceeds `remoteEntityBufferMax`.
    pub fn ingest(&mut self, player_id: PlayerId, entry: SnapshotEntry) {
        let buffer = self.buffers.entry(player_id).or_default();
        buffer.push_back(entry);
        while buffer.len() > self.max_entries {
            buffer.pop_front();
        }
    }

    /// Stops tracking a player, e.g. once it leaves the latest snapshot.
    pub fn drop_player(&mut self, player_id: PlayerId) {
        self.buffers.remove(&player_id);
    }

    /// Computes the render position for every tracked player at `now_ms`.
    pub fn tick(&self, now_ms: u64) -> HashMap<PlayerId, (f32, f32)> {
        let render_time = now_ms.saturating_sub(self.delay_ms);
        let mut out = HashMap::new();
        for (player_id, buffer) in &self.buffers {
            if let Some(pos) = Self::sample(buffer, render_time, self.extrapolation_max_ms) {
                out.insert(*player_id, pos);
            }
        }
        out
    }

    fn sample(buffer: &VecDeque<SnapshotEntry>, render_time: u64, extrapolation_max_ms: u64) -> Option<(f32, f32)> {
        if buffer.is_empty() {
            return None;
        }
        if buffer.len() == 1 {
            let only = buffer[0];
            return Some((only.x as f32, only.y as f32));
        }

        // Find the bracketing pair A (<= render_time) / B (> render_time).
        let mut bracket = None;
        for window in buffer.iter().collect::<Vec<_>>().windows(2) {
            let (a, b) = (window[0], window[1]);
            if a.t <= render_time && render_time <= b.t {
                bracket = Some((*a, *b));
                break;
            }
        }

        if let Some((a, b)) = bracket {
            if b.t == a.t {
                return Some((b.x as f32, b.y as f32));
            }
            let alpha = (render_time - a.t) as f32 / (b.t - a.t) as f32;
            let x = a.x as f32 + (b.x as f32 - a.x as f32) * alpha;
            let y = a.y as f32 + (b.y as f32 - a.y as f32) * alpha;
            return Some((x, y));
        }

        let oldest = buffer.front().unwrap();
        if render_time <= oldest.t {
            return Some((oldest.x as f32, oldest.y as f32));
        }

        // Past the newest entry: extrapolate using its velocity (falling
        // back to the trailing two-entry slope), capped at
        // `extrapolation_max_ms`, then hold.
        let newest = buffer.back().unwrap();
        let elapsed_ms = render_time - newest.t;
        let capped_ms = elapsed_ms.min(extrapolation_max_ms);
        if capped_ms == 0 {
            return Some((newest.x as f32, newest.y as f32));
        }

        let (vx, vy) = match (newest.vx, newest.vy) {
            (Some(vx), Some(vy)) => (vx, vy),
            _ => {
                let prev = buffer.get(buffer.len() - 2).unwrap();
                let dt = (newest.t - prev.t).max(1) as f32 / 1000.0;
                (
                    (newest.x as f32 - prev.x as f32) / dt,
                    (newest.y as f32 - prev.y as f32) / dt,
                )
            }
        };

        if elapsed_ms > extrapolation_max_ms {
            let dt = capped_ms as f32 / 1000.0;
            return Some((newest.x as f32 + vx * dt, newest.y as f32 + vy * dt));
        }

        let dt = elapsed_ms as f32 / 1000.0;
        Some((newest.x as f32 + vx * dt, newest.y as f32 + vy * dt))
    }
}
