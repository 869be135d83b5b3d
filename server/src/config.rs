//! Relay configuration.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use wire::Limits;

/// Port the relay listens on by default.
pub const DEFAULT_PORT: u16 = 8765;

/// Relay settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,

    /// Period between world broadcasts.
    pub broadcast_interval: Duration,

    /// Frame decoding limits for client streams.
    pub limits: Limits,

    /// Upper bound on the HTTP upgrade request.
    pub max_request_bytes: usize,

    /// How long a new connection may take to send its upgrade request.
    pub request_timeout: Duration,

    /// How long a broadcast write may block on one slow client before that
    /// client is dropped.
    pub write_timeout: Duration,

    /// How often blocked reads and accepts wake to check for shutdown.
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            broadcast_interval: Duration::from_millis(50),
            limits: Limits::default(),
            max_request_bytes: 8 * 1024,
            request_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(20),
        }
    }
}

impl ServerConfig {
    /// Loopback on an ephemeral port with small limits.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0)),
            limits: Limits::for_testing(),
            max_request_bytes: 2 * 1024,
            request_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(5),
            ..Self::default()
        }
    }
}
