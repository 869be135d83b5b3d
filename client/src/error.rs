//! Error types for the client session.

use std::io;

use thiserror::Error;

use crate::session::ConnectionState;

/// Errors raised while opening a session.
///
/// Any of these leaves the session permanently offline; nothing retries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HandshakeError {
    /// The stream connection could not be opened.
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Sending the request or reading the response failed.
    #[error("handshake i/o failed: {0}")]
    Io(#[from] io::Error),

    /// The response did not contain `101`.
    #[error("websocket handshake failed: {status_line:?}")]
    Rejected { status_line: String },

    /// The response head did not end within the limit.
    #[error("handshake response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// The session already went through a handshake.
    #[error("cannot negotiate from state {state}")]
    InvalidState { state: ConnectionState },
}

/// Errors raised by [`ClientSession::send`](crate::ClientSession::send).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SendError {
    /// The envelope could not be serialized.
    #[error("encode envelope: {0}")]
    Encode(#[from] protocol::ProtocolError),

    /// The write failed; the session is now failed.
    #[error("write frame: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by [`ClientSession::poll_receive`](crate::ClientSession::poll_receive).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReceiveError {
    /// Reading from the transport failed; the session is now failed.
    #[error("read frame: {0}")]
    Io(#[from] io::Error),

    /// The byte stream broke a framing limit; the session is now failed.
    #[error("frame stream out of sync: {0}")]
    Frame(#[from] wire::FrameError),

    /// A complete frame held no usable world envelope. The session stays open.
    #[error("discarded frame: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    /// The relay closed the connection without sending a usable world
    /// envelope first; the session is now failed.
    #[error("relay closed the connection")]
    Closed,
}

impl ReceiveError {
    /// Returns `true` if the session survived this error.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}
