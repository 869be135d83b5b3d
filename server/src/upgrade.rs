//! Server side of the HTTP upgrade.

use std::io::{self, Read};

use wire::accept_key;

use crate::error::UpgradeError;

/// Response sent to requests that are not websocket upgrades.
pub const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\n\r\n";

/// The parts of an upgrade request the relay looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeRequest {
    pub request_line: String,
    pub upgrade: Option<String>,
    pub key: Option<String>,
}

impl UpgradeRequest {
    /// Parses the request line and headers. Header names are matched
    /// case-insensitively; values are trimmed.
    #[must_use]
    pub fn parse(head: &[u8]) -> Self {
        let text = String::from_utf8_lossy(head);
        let mut lines = text.split("\r\n");
        let mut request = Self {
            request_line: lines.next().unwrap_or_default().to_owned(),
            ..Self::default()
        };
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_owned();
            if name.trim().eq_ignore_ascii_case("upgrade") {
                request.upgrade = Some(value);
            } else if name.trim().eq_ignore_ascii_case("sec-websocket-key") {
                request.key = Some(value);
            }
        }
        request
    }

    /// Returns the client key if this is a websocket upgrade.
    pub fn websocket_key(&self) -> Result<&str, UpgradeError> {
        let is_websocket = self
            .upgrade
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("websocket"));
        if !is_websocket {
            return Err(UpgradeError::NotWebSocket {
                found: self.upgrade.clone(),
            });
        }
        self.key.as_deref().ok_or(UpgradeError::MissingKey)
    }
}

/// Reads the request head up to the blank line.
///
/// Returns the head (including the terminator) and any bytes that followed it
/// in the same read.
pub fn read_request<R: Read>(
    reader: &mut R,
    limit: usize,
) -> Result<(Vec<u8>, Vec<u8>), UpgradeError> {
    let mut buf = Vec::with_capacity(512);
    let mut chunk = [0u8; 512];
    loop {
        if let Some(end) = find_head_end(&buf) {
            let rest = buf.split_off(end);
            return Ok((buf, rest));
        }
        if buf.len() >= limit {
            return Err(UpgradeError::RequestTooLarge { limit });
        }
        match reader.read(&mut chunk) {
            Ok(0) => return Err(UpgradeError::Closed),
            Ok(read) => buf.extend_from_slice(&chunk[..read]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// The `101 Switching Protocols` response for `key`.
#[must_use]
pub fn switching_protocols(key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         \r\n",
        accept_key(key)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::HandshakeRequest;

    #[test]
    fn parses_client_request() {
        let request = HandshakeRequest::with_key("localhost", 8765, "abc==");
        let parsed = UpgradeRequest::parse(&request.to_bytes());
        assert_eq!(parsed.request_line, "GET / HTTP/1.1");
        assert_eq!(parsed.websocket_key().unwrap(), "abc==");
    }

    #[test]
    fn header_names_case_insensitive() {
        let parsed =
            UpgradeRequest::parse(b"GET / HTTP/1.1\r\nUPGRADE: WebSocket\r\nsec-websocket-key: k\r\n\r\n");
        assert_eq!(parsed.websocket_key().unwrap(), "k");
    }

    #[test]
    fn plain_http_is_not_websocket() {
        let parsed = UpgradeRequest::parse(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        let err = parsed.websocket_key().unwrap_err();
        assert!(matches!(err, UpgradeError::NotWebSocket { found: None }));
        assert!(err.is_bad_request());
    }

    #[test]
    fn upgrade_without_key() {
        let parsed = UpgradeRequest::parse(b"GET / HTTP/1.1\r\nUpgrade: websocket\r\n\r\n");
        assert!(matches!(
            parsed.websocket_key().unwrap_err(),
            UpgradeError::MissingKey
        ));
    }

    #[test]
    fn read_request_splits_trailing_bytes() {
        let mut input: &[u8] = b"GET / HTTP/1.1\r\nUpgrade: websocket\r\n\r\n\x81\x80";
        let (head, rest) = read_request(&mut input, 1024).unwrap();
        assert!(head.ends_with(b"\r\n\r\n"));
        assert_eq!(rest, b"\x81\x80");
    }

    #[test]
    fn read_request_enforces_limit() {
        let long = vec![b'a'; 4096];
        let mut input: &[u8] = &long;
        assert!(matches!(
            read_request(&mut input, 1024).unwrap_err(),
            UpgradeError::RequestTooLarge { limit: 1024 }
        ));
    }

    #[test]
    fn read_request_detects_hangup() {
        let mut input: &[u8] = b"GET / HTTP/1.1\r\n";
        assert!(matches!(
            read_request(&mut input, 1024).unwrap_err(),
            UpgradeError::Closed
        ));
    }

    #[test]
    fn switching_protocols_carries_accept() {
        let response = switching_protocols("dGhlIHNhbXBsZSBub25jZQ==");
        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
    }
}
