//! Relay that shares one world between horde clients.
//!
//! The relay is deliberately thin: it upgrades incoming connections, keeps
//! the last `"state"` each client sent, and every broadcast period pushes the
//! merged world back to every client as a `"world"` envelope tagged with the
//! receiver's own session id. Frames it sends are masked so clients that
//! always consume a mask key stay aligned with the stream.

mod config;
mod error;
mod relay;
mod server;
mod upgrade;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::{ServerError, ServerResult, UpgradeError};
pub use relay::RelayState;
pub use server::{Server, ServerHandle};
pub use upgrade::{read_request, switching_protocols, UpgradeRequest, BAD_REQUEST};
