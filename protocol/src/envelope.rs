//! The two envelope shapes and their JSON encoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::identity::SessionId;
use crate::types::{BulletState, EnemyState, PlayerState};

const STATE: &str = "state";
const WORLD: &str = "world";

/// Client to server: the local simulation snapshot, rebuilt every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub player: PlayerState,
    #[serde(default)]
    pub bullets: Vec<BulletState>,
    #[serde(default)]
    pub zombies: Vec<EnemyState>,
}

/// A `"state"` envelope as the relay reads it.
///
/// Other clients may leave out the lists or send `null`; the relay then keeps
/// the lists it already has.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateReport {
    pub player: PlayerState,
    #[serde(default)]
    pub bullets: Option<Vec<BulletState>>,
    #[serde(default)]
    pub zombies: Option<Vec<EnemyState>>,
}

impl From<OutboundEnvelope> for StateReport {
    fn from(envelope: OutboundEnvelope) -> Self {
        Self {
            player: envelope.player,
            bullets: Some(envelope.bullets),
            zombies: Some(envelope.zombies),
        }
    }
}

/// Authoritative world state as broadcast by the relay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub players: BTreeMap<SessionId, PlayerState>,
    #[serde(default)]
    pub zombies: Vec<EnemyState>,
    #[serde(default)]
    pub bullets: Vec<BulletState>,
}

/// Server to client: the world plus the receiving connection's id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    #[serde(default)]
    pub id: Option<SessionId>,
    #[serde(default)]
    pub world: WorldSnapshot,
}

/// Either envelope, as distinguished by the `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    State(OutboundEnvelope),
    World(InboundEnvelope),
}

impl Envelope {
    /// Value of the `type` field for this envelope.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::State(_) => STATE,
            Self::World(_) => WORLD,
        }
    }

    /// Serializes the envelope with its `type` field.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        match self {
            Self::State(state) => encode_outbound(state),
            Self::World(world) => encode_world(world),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Tagged<'a> {
    State(&'a OutboundEnvelope),
    World(&'a InboundEnvelope),
}

#[derive(Deserialize)]
struct TypeTag {
    #[serde(rename = "type")]
    kind: String,
}

/// Serializes a `"state"` envelope.
pub fn encode_outbound(envelope: &OutboundEnvelope) -> ProtocolResult<Vec<u8>> {
    Ok(serde_json::to_vec(&Tagged::State(envelope))?)
}

/// Serializes a `"world"` envelope.
pub fn encode_world(envelope: &InboundEnvelope) -> ProtocolResult<Vec<u8>> {
    Ok(serde_json::to_vec(&Tagged::World(envelope))?)
}

/// Parses a payload of either kind.
///
/// The `type` field is read first and the payload is then parsed as the
/// matching struct; unknown fields are ignored.
pub fn decode_envelope(bytes: &[u8]) -> ProtocolResult<Envelope> {
    let tag: TypeTag = serde_json::from_slice(bytes)?;
    match tag.kind.as_str() {
        STATE => Ok(Envelope::State(serde_json::from_slice(bytes)?)),
        WORLD => Ok(Envelope::World(serde_json::from_slice(bytes)?)),
        _ => Err(ProtocolError::UnknownType { found: tag.kind }),
    }
}

/// Parses a payload that must be a `"world"` envelope.
pub fn decode_inbound(bytes: &[u8]) -> ProtocolResult<InboundEnvelope> {
    match decode_envelope(bytes)? {
        Envelope::World(world) => Ok(world),
        other => Err(ProtocolError::UnexpectedType {
            expected: WORLD,
            found: other.kind(),
        }),
    }
}

/// Parses a payload that must be a `"state"` envelope.
pub fn decode_outbound(bytes: &[u8]) -> ProtocolResult<OutboundEnvelope> {
    match decode_envelope(bytes)? {
        Envelope::State(state) => Ok(state),
        other => Err(ProtocolError::UnexpectedType {
            expected: STATE,
            found: other.kind(),
        }),
    }
}

/// Parses a payload that must be a `"state"` envelope, keeping absent and
/// `null` lists apart from empty ones.
pub fn decode_state_report(bytes: &[u8]) -> ProtocolResult<StateReport> {
    let tag: TypeTag = serde_json::from_slice(bytes)?;
    match tag.kind.as_str() {
        STATE => Ok(serde_json::from_slice(bytes)?),
        WORLD => Err(ProtocolError::UnexpectedType {
            expected: STATE,
            found: WORLD,
        }),
        _ => Err(ProtocolError::UnknownType { found: tag.kind }),
    }
}
