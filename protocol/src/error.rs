//! Error types for envelope encoding and decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while converting envelopes to and from JSON.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Payload is not UTF-8 JSON matching any envelope shape.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// The `type` field names no known envelope.
    #[error("unknown envelope type: {found}")]
    UnknownType { found: String },

    /// Envelope parsed but is the wrong kind for this direction.
    #[error("unexpected envelope type: expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_type_display() {
        let err = ProtocolError::UnexpectedType {
            expected: "world",
            found: "state",
        };
        let msg = err.to_string();
        assert!(msg.contains("expected world"));
        assert!(msg.contains("found state"));
    }

    #[test]
    fn json_error_display() {
        let err: ProtocolError = serde_json::from_str::<u8>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("malformed envelope"));
    }
}
