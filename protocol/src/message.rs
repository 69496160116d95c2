//! The message envelope and its payloads.
//!
//! Encoding is textual and self-describing: every envelope carries its own
//! `type` tag, so a receiver can reject what it does not understand instead
//! of silently misinterpreting it. We decode in two steps — first into a
//! [`RawEnvelope`] that only looks at `type`/`payload`/`timestamp`, then into
//! a typed [`Message`] — so an unrecognized `type` produces a typed
//! [`DecodeError::UnknownType`] instead of a generic parse failure, matching
//! the `UNKNOWN_TYPE` error code the server is expected to reply with.

use crate::board::BoardWire;
use crate::ids::{ClientId, EntityId, PlayerId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single step of movement. Only values in `{-1, 0, 1}` are legal and
/// `(0, 0)` is rejected — see [`MoveDelta::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDelta {
    pub dx: i8,
    pub dy: i8,
}

impl MoveDelta {
    pub fn new(dx: i8, dy: i8) -> Result<Self, DecodeError> {
        let delta = MoveDelta { dx, dy };
        delta.validate()?;
        Ok(delta)
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        let in_range = |v: i8| (-1..=1).contains(&v);
        if !in_range(self.dx) || !in_range(self.dy) {
            return Err(DecodeError::InvalidMovePayload);
        }
        if self.dx == 0 && self.dy == 0 {
            return Err(DecodeError::InvalidMovePayload);
        }
        Ok(())
    }
}

/// Payload for `CONNECT`, used on both directions of the wire. Fields are
/// optional because the same message shape carries three different
/// meanings depending on who sends it and when (see spec.md §4.2):
/// server-accept-with-spawn, server-accept-deferred, and client-resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectPayload {
    #[serde(rename = "clientId", skip_serializing_if = "Option::is_none", default)]
    pub client_id: Option<ClientId>,
    #[serde(rename = "playerId", skip_serializing_if = "Option::is_none", default)]
    pub player_id: Option<PlayerId>,
    #[serde(rename = "playerName", skip_serializing_if = "Option::is_none", default)]
    pub player_name: Option<String>,
    #[serde(rename = "gameState", skip_serializing_if = "Option::is_none", default)]
    pub game_state: Option<StateUpdatePayload>,
    #[serde(rename = "waitMessage", skip_serializing_if = "Option::is_none", default)]
    pub wait_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerWire {
    #[serde(rename = "playerId")]
    pub player_id: PlayerId,
    #[serde(rename = "playerName")]
    pub player_name: String,
    #[serde(rename = "clientId")]
    pub client_id: ClientId,
    pub x: i32,
    pub y: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vy: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityWire {
    #[serde(rename = "entityId")]
    pub entity_id: EntityId,
    pub x: i32,
    pub y: i32,
    pub glyph: char,
    pub color: String,
    pub solid: bool,
    #[serde(rename = "zOrder")]
    pub z_order: i32,
    #[serde(rename = "entityType")]
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdatePayload {
    pub board: BoardWire,
    pub players: Vec<PlayerWire>,
    pub entities: Vec<EntityWire>,
    pub score: i64,
}

/// Why a `MOVE` was rejected. Mirrors the four-step validation order in
/// spec.md §4.4 exactly, so the same enum is produced by `game-core`'s
/// shared validator on both the server and the client `Predictor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveRejectionReason {
    Bounds,
    Wall,
    Entity,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidMove,
    UnknownType,
    Internal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    #[serde(rename = "attemptedPosition", skip_serializing_if = "Option::is_none", default)]
    pub attempted_position: Option<(i32, i32)>,
    #[serde(rename = "currentPosition", skip_serializing_if = "Option::is_none", default)]
    pub current_position: Option<(i32, i32)>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<MoveRejectionReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    pub context: ErrorContext,
}

/// The full set of message kinds the core protocol supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Message {
    #[serde(rename = "CONNECT")]
    Connect(ConnectPayload),
    #[serde(rename = "SET_PLAYER_NAME")]
    SetPlayerName { name: String },
    #[serde(rename = "MOVE")]
    Move(MoveDelta),
    #[serde(rename = "STATE_UPDATE")]
    StateUpdate(StateUpdatePayload),
    #[serde(rename = "PLAYER_JOINED")]
    PlayerJoined {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "playerName")]
        player_name: String,
        x: i32,
        y: i32,
    },
    #[serde(rename = "PLAYER_LEFT")]
    PlayerLeft {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    #[serde(rename = "ERROR")]
    Error(ErrorPayload),
    #[serde(rename = "PING")]
    Ping,
    #[serde(rename = "PONG")]
    Pong,
}

impl Message {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Message::Connect(_) => "CONNECT",
            Message::SetPlayerName { .. } => "SET_PLAYER_NAME",
            Message::Move(_) => "MOVE",
            Message::StateUpdate(_) => "STATE_UPDATE",
            Message::PlayerJoined { .. } => "PLAYER_JOINED",
            Message::PlayerLeft { .. } => "PLAYER_LEFT",
            Message::Error(_) => "ERROR",
            Message::Ping => "PING",
            Message::Pong => "PONG",
        }
    }
}

/// The envelope every message travels in: `{type, payload, timestamp, clientId?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub message: Message,
    pub timestamp: u64,
    #[serde(rename = "clientId", skip_serializing_if = "Option::is_none", default)]
    pub client_id: Option<ClientId>,
}

impl Envelope {
    pub fn new(message: Message, timestamp: u64) -> Self {
        Envelope {
            message,
            timestamp,
            client_id: None,
        }
    }

    pub fn with_client_id(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("envelope serialization is infallible")
    }

    /// Decodes the raw text of a message. An unknown `type` tag is reported
    /// as a typed [`DecodeError::UnknownType`] (never a hard parse failure)
    /// so the caller can reply with an `ERROR { code: UNKNOWN_TYPE }`
    /// instead of dropping the connection.
    pub fn decode(raw: &str) -> Result<Envelope, DecodeError> {
        let shell: RawEnvelope =
            serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let known = matches!(
            shell.kind.as_str(),
            "CONNECT"
                | "SET_PLAYER_NAME"
                | "MOVE"
                | "STATE_UPDATE"
                | "PLAYER_JOINED"
                | "PLAYER_LEFT"
                | "ERROR"
                | "PING"
                | "PONG"
        );
        if !known {
            return Err(DecodeError::UnknownType(shell.kind));
        }

        let envelope: Envelope =
            serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        if let Message::Move(delta) = &envelope.message {
            delta.validate()?;
        }

        Ok(envelope)
    }
}

/// A minimal shape used only to peek at `type` before committing to a full
/// typed decode.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[allow(dead_code)]
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    #[error("missing or unrecognized message type: {0}")]
    UnknownType(String),
    #[error("malformed message envelope: {0}")]
    Malformed(String),
    #[error("MOVE payload dx/dy must be in {{-1,0,1}} and not both zero")]
    InvalidMovePayload,
}

impl DecodeError {
    /// Turns a decode failure into the `ERROR` reply the server sends back,
    /// per spec.md §7 ("protocol error... server replies with ERROR").
    pub fn to_error_payload(&self) -> ErrorPayload {
        match self {
            DecodeError::UnknownType(kind) => ErrorPayload {
                code: ErrorCode::UnknownType,
                message: format!("unknown message type: {kind}"),
                context: ErrorContext::default(),
            },
            DecodeError::Malformed(detail) => ErrorPayload {
                code: ErrorCode::UnknownType,
                message: format!("malformed message: {detail}"),
                context: ErrorContext::default(),
            },
            DecodeError::InvalidMovePayload => ErrorPayload {
                code: ErrorCode::InvalidMove,
                message: "dx/dy must each be in {-1,0,1} and not both zero".to_string(),
                context: ErrorContext::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_move() {
        let envelope = Envelope::new(Message::Move(MoveDelta::new(1, 0).unwrap()), 42)
            .with_client_id(ClientId(7));
        let encoded = envelope.encode();
        let decoded = Envelope::decode(&encoded).unwrap();
        assert_eq!(decoded.timestamp, 42);
        assert_eq!(decoded.client_id, Some(ClientId(7)));
        match decoded.message {
            Message::Move(delta) => assert_eq!((delta.dx, delta.dy), (1, 0)),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_type() {
        let raw = r#"{"type":"TELEPORT","payload":{},"timestamp":1}"#;
        match Envelope::decode(raw) {
            Err(DecodeError::UnknownType(kind)) => assert_eq!(kind, "TELEPORT"),
            other => panic!("expected UnknownType, got {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_delta() {
        assert!(MoveDelta::new(0, 0).is_err());
    }

    #[test]
    fn rejects_out_of_range_delta() {
        assert!(MoveDelta::new(2, 0).is_err());
        assert!(MoveDelta::new(0, -2).is_err());
    }

    #[test]
    fn accepts_diagonal_delta() {
        assert!(MoveDelta::new(1, 1).is_ok());
        assert!(MoveDelta::new(-1, -1).is_ok());
    }

    #[test]
    fn decode_rejects_malformed_move_payload_embedded_in_valid_json() {
        let raw = r#"{"type":"MOVE","payload":{"dx":3,"dy":0},"timestamp":1}"#;
        match Envelope::decode(raw) {
            Err(DecodeError::InvalidMovePayload) => {}
            other => panic!("expected InvalidMovePayload, got {other:?}"),
        }
    }

    #[test]
    fn envelope_wire_shape_is_flat() {
        let envelope = Envelope::new(Message::Ping, 5);
        let value: Value = serde_json::from_str(&envelope.encode()).unwrap();
        assert_eq!(value["type"], "PING");
        assert_eq!(value["timestamp"], 5);
    }
}
