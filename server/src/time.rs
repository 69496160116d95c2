//! Wall-clock milliseconds, the single `now` used for velocity derivation,
//! liveness timeouts, and snapshot timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_millis() as u64
}
