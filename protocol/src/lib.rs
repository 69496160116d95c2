//! Wire protocol for the authoritative ASCII arena: the message envelope,
//! its payloads, encode/decode/validation, and the configuration keys the
//! core recognizes. Shared verbatim between the server and the client.

pub mod board;
pub mod config;
pub mod ids;
pub mod message;

pub use board::BoardWire;
pub use config::Config;
pub use ids::{ClientId, EntityId, PlayerId};
pub use message::{
    ConnectPayload, DecodeError, Envelope, EntityWire, ErrorCode, ErrorContext, ErrorPayload,
    Message, MoveDelta, MoveRejectionReason, PlayerWire, StateUpdatePayload,
};
