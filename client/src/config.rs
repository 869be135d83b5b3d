//! Session configuration.

use wire::Limits;

/// Host the simulation connects to when nothing else is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Port the relay listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 8765;

/// Connection settings consumed when a session is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,

    /// Frame decoding limits.
    pub limits: Limits,

    /// Upper bound on bytes drained from the transport in one poll, so a
    /// flooding peer cannot stretch a tick.
    pub max_read_per_poll: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            limits: Limits::default(),
            max_read_per_poll: 256 * 1024,
        }
    }
}

impl ClientConfig {
    /// Default settings for another peer.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Small limits for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            limits: Limits::for_testing(),
            max_read_per_poll: 8 * 1024,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_local_relay() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8765);
        assert_eq!(config.limits, Limits::default());
    }

    #[test]
    fn new_overrides_peer_only() {
        let config = ClientConfig::new("10.0.0.2", 9000);
        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_read_per_poll, ClientConfig::default().max_read_per_poll);
    }

    #[test]
    fn testing_config_is_smaller() {
        let config = ClientConfig::for_testing();
        assert!(config.max_read_per_poll < ClientConfig::default().max_read_per_poll);
        assert_eq!(config.limits, Limits::for_testing());
    }
}
