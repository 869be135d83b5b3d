//! JSON envelope schema exchanged between horde clients and the relay.
//!
//! Every frame payload is one JSON object with a `type` field:
//!
//! - `"state"` - client to server, the local simulation snapshot of one tick.
//! - `"world"` - server to client, the authoritative world plus the id the
//!   server assigned to the receiving connection.
//!
//! Field names and nesting are the compatibility surface with the relay and
//! must not be renamed.

mod envelope;
mod error;
mod identity;
mod types;

pub use envelope::{
    decode_envelope, decode_inbound, decode_outbound, decode_state_report, encode_outbound,
    encode_world, Envelope, InboundEnvelope, OutboundEnvelope, StateReport, WorldSnapshot,
};
pub use error::{ProtocolError, ProtocolResult};
pub use identity::{SessionId, SessionIdentity};
pub use types::{BulletState, EnemyState, PlayerState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = SessionId::new(1);
        let _ = SessionIdentity::default();
        let _ = PlayerState::at(0.0, 0.0);
        let _ = WorldSnapshot::default();
        let _: ProtocolResult<()> = Ok(());
    }

    #[test]
    fn state_envelope_shape() {
        let envelope = OutboundEnvelope {
            player: PlayerState::at(100.0, 100.0),
            bullets: Vec::new(),
            zombies: Vec::new(),
        };
        let bytes = encode_outbound(&envelope).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "state");
        assert_eq!(value["player"]["x"], 100.0);
        assert_eq!(value["player"]["y"], 100.0);
        assert!(value["bullets"].as_array().unwrap().is_empty());
        assert!(value["zombies"].as_array().unwrap().is_empty());
    }
}
