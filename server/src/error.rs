//! Error types for the relay.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result type for relay operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the relay.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    #[error("bind {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("relay i/o failed: {0}")]
    Io(#[from] io::Error),

    /// A relay thread panicked.
    #[error("relay thread panicked")]
    ThreadPanicked,
}

/// Reasons an incoming connection was not upgraded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpgradeError {
    #[error("read upgrade request: {0}")]
    Io(#[from] io::Error),

    #[error("upgrade request exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error("connection closed before the request ended")]
    Closed,

    #[error("not a websocket upgrade (upgrade: {found:?})")]
    NotWebSocket { found: Option<String> },

    #[error("missing Sec-WebSocket-Key")]
    MissingKey,
}

impl UpgradeError {
    /// Returns `true` if the peer should receive `400 Bad Request`.
    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        matches!(self, Self::NotWebSocket { .. } | Self::MissingKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_classification() {
        assert!(UpgradeError::NotWebSocket { found: None }.is_bad_request());
        assert!(UpgradeError::MissingKey.is_bad_request());
        assert!(!UpgradeError::Closed.is_bad_request());
        assert!(!UpgradeError::RequestTooLarge { limit: 10 }.is_bad_request());
    }

    #[test]
    fn not_websocket_display() {
        let err = UpgradeError::NotWebSocket {
            found: Some("h2c".to_owned()),
        };
        assert!(err.to_string().contains("h2c"));
    }
}
