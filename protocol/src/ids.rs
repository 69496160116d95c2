//! Opaque identifiers shared across the wire.
//!
//! `ClientId` is issued fresh on every socket accept and never survives a
//! reconnect. `PlayerId` is issued once per logical player and is stable
//! across reconnects — the server rebinds a `PlayerId` to a new `ClientId`
//! rather than creating a new player.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }
    };
}

opaque_id!(ClientId);
opaque_id!(PlayerId);
opaque_id!(EntityId);
