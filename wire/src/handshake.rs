//! HTTP Upgrade handshake text.
//!
//! Only the bytes are built and inspected here; opening the connection and
//! exchanging them is the client's job.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use sha1::{Digest, Sha1};

/// Protocol version sent in `Sec-WebSocket-Version`.
pub const WEBSOCKET_VERSION: u8 = 13;

/// GUID appended to the client key when computing `Sec-WebSocket-Accept`.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Maximum number of response bytes read when checking the upgrade.
pub const HANDSHAKE_RESPONSE_LIMIT: usize = 1024;

/// Generates a `Sec-WebSocket-Key`: 16 random bytes, base64 encoded.
pub fn generate_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut nonce = [0u8; 16];
    rng.fill(&mut nonce);
    STANDARD.encode(nonce)
}

/// Computes the `Sec-WebSocket-Accept` value for a client key.
#[must_use]
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.trim().as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// The client's upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    pub host: String,
    pub port: u16,
    pub key: String,
}

impl HandshakeRequest {
    /// Creates a request with a freshly generated key.
    pub fn new<R: Rng + ?Sized>(host: impl Into<String>, port: u16, rng: &mut R) -> Self {
        Self::with_key(host, port, generate_key(rng))
    }

    /// Creates a request with a caller supplied key.
    pub fn with_key(host: impl Into<String>, port: u16, key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            key: key.into(),
        }
    }

    /// Renders the request as bytes ready to send.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for HandshakeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GET / HTTP/1.1\r\n\
             Host: {}:{}\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {}\r\n\
             Sec-WebSocket-Version: {WEBSOCKET_VERSION}\r\n\
             \r\n",
            self.host, self.port, self.key
        )
    }
}

/// Returns `true` if the raw response contains the literal `101`.
///
/// The status line is not parsed and `Sec-WebSocket-Accept` is not checked;
/// any response carrying those three bytes anywhere counts as accepted.
#[must_use]
pub fn is_switching_protocols(response: &[u8]) -> bool {
    response.windows(3).any(|window| window == b"101")
}

/// First line of a raw response, for diagnostics.
#[must_use]
pub fn status_line(response: &[u8]) -> String {
    let end = response
        .windows(2)
        .position(|window| window == b"\r\n")
        .unwrap_or(response.len());
    String::from_utf8_lossy(&response[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn key_is_16_bytes_base64() {
        let mut rng = StdRng::seed_from_u64(7);
        let key = generate_key(&mut rng);
        assert_eq!(key.len(), 24);
        assert!(key.ends_with("=="));
        assert_eq!(STANDARD.decode(&key).unwrap().len(), 16);
    }

    #[test]
    fn keys_differ() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_ne!(generate_key(&mut rng), generate_key(&mut rng));
    }

    #[test]
    fn request_text_exact() {
        let request = HandshakeRequest::with_key("localhost", 8765, "dGhlIHNhbXBsZSBub25jZQ==");
        let expected = "GET / HTTP/1.1\r\n\
                        Host: localhost:8765\r\n\
                        Upgrade: websocket\r\n\
                        Connection: Upgrade\r\n\
                        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
                        Sec-WebSocket-Version: 13\r\n\
                        \r\n";
        assert_eq!(request.to_string(), expected);
        assert_eq!(request.to_bytes(), expected.as_bytes());
    }

    #[test]
    fn accept_key_rfc_sample() {
        // RFC 6455 section 1.3
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn switching_protocols_detected() {
        assert!(is_switching_protocols(
            b"HTTP/1.1 101 Switching Protocols\r\n\r\n"
        ));
    }

    #[test]
    fn not_found_rejected() {
        assert!(!is_switching_protocols(b"HTTP/1.1 404 Not Found\r\n\r\n"));
        assert!(!is_switching_protocols(b""));
    }

    #[test]
    fn substring_anywhere_counts() {
        // Faithful to the loose check: not a real status parse.
        assert!(is_switching_protocols(b"HTTP/1.1 400 Bad Request\r\nX-Id: 1010\r\n"));
    }

    #[test]
    fn status_line_extracted() {
        assert_eq!(
            status_line(b"HTTP/1.1 404 Not Found\r\nServer: x\r\n\r\n"),
            "HTTP/1.1 404 Not Found"
        );
        assert_eq!(status_line(b"garbage"), "garbage");
    }
}
