//! Configurable limits for bounded decoding.

/// Wire-level limits for frame decoding.
///
/// These limits are enforced while decoding so that a corrupt or hostile
/// length field cannot make the decoder buffer unbounded memory. A length
/// beyond them means the stream is no longer in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum declared payload length of a single frame.
    pub max_payload_bytes: usize,

    /// Maximum number of undecoded bytes held between reads.
    pub max_buffered_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // A world snapshot with a few hundred zombies is well under this
            max_payload_bytes: 1024 * 1024,

            // Room for a full frame plus the start of the next one
            max_buffered_bytes: 4 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_payload_bytes: 4096,
            max_buffered_bytes: 16 * 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_payload_bytes: usize::MAX,
            max_buffered_bytes: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_payload_bytes() {
        let limits = Limits::default();
        assert_eq!(limits.max_payload_bytes, 1024 * 1024);
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();

        assert!(test_limits.max_payload_bytes < default_limits.max_payload_bytes);
        assert!(test_limits.max_buffered_bytes < default_limits.max_buffered_bytes);
    }

    #[test]
    fn unlimited_limits() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_payload_bytes, usize::MAX);
        assert_eq!(limits.max_buffered_bytes, usize::MAX);
    }

    #[test]
    fn limits_equality() {
        assert_eq!(Limits::default(), Limits::default());
        assert_ne!(Limits::default(), Limits::for_testing());
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_payload_bytes, 4096);
    }
}
