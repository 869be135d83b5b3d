//! Non-blocking WebSocket client session for the horde simulation.
//!
//! The session is a small state machine around one byte stream: it performs
//! the HTTP upgrade, writes `"state"` envelopes as text frames and polls for
//! `"world"` envelopes without ever blocking the frame loop. Any connection
//! problem degrades the session to offline mode; the simulation keeps running.
//!
//! ```no_run
//! use client::{ClientConfig, ClientSession};
//!
//! let mut session = ClientSession::connect(ClientConfig::default());
//! if let Ok(Some(world)) = session.poll_receive() {
//!     println!("{} players", world.world.players.len());
//! }
//! ```

mod config;
mod error;
mod handshake;
mod session;
mod transport;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{HandshakeError, ReceiveError, SendError};
pub use handshake::{negotiate, negotiate_over, Upgraded};
pub use session::{ClientSession, ConnectionState, SessionStats};
pub use transport::Transport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = ClientConfig::default();
        let _ = ConnectionState::Disconnected;
        let _ = SessionStats::default();
        let _: Option<HandshakeError> = None;
        let _: Option<SendError> = None;
        let _: Option<ReceiveError> = None;
        assert_eq!(DEFAULT_PORT, 8765);
        assert_eq!(DEFAULT_HOST, "localhost");
    }
}
