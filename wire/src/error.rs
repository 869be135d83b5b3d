//! Error types for frame decoding.

use std::fmt;

use thiserror::Error;

/// Result type for frame operations.
pub type FrameResult<T> = Result<T, FrameError>;

/// Errors raised while decoding frames.
///
/// Incomplete input is not an error; decoders report it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// A declared length or the pending buffer exceeded its limit.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: u64,
    },
}

/// Specific frame limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    PayloadBytes,
    BufferedBytes,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PayloadBytes => "payload bytes",
            Self::BufferedBytes => "buffered bytes",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_error_display_payload_limit() {
        let err = FrameError::LimitsExceeded {
            kind: LimitKind::PayloadBytes,
            limit: 4096,
            actual: 1 << 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("payload bytes"));
        assert!(msg.contains("4096"));
        assert!(msg.contains(&(1u64 << 40).to_string()));
    }

    #[test]
    fn frame_error_display_buffer_limit() {
        let err = FrameError::LimitsExceeded {
            kind: LimitKind::BufferedBytes,
            limit: 8,
            actual: 9,
        };
        assert!(err.to_string().contains("buffered bytes"));
    }
}
