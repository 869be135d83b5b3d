//! Opening the connection and negotiating the upgrade.

use std::io;
use std::net::TcpStream;

use tracing::debug;
use wire::{is_switching_protocols, status_line, HandshakeRequest, HANDSHAKE_RESPONSE_LIMIT};

use crate::error::HandshakeError;
use crate::transport::Transport;

/// A transport that completed the upgrade.
#[derive(Debug)]
pub struct Upgraded<T> {
    /// The stream, already in non-blocking mode.
    pub transport: T,
    /// Bytes that arrived after the response headers in the same read.
    /// They belong to the first frame and must reach the frame decoder.
    pub pending: Vec<u8>,
}

/// Opens a blocking stream to `host:port` and negotiates the upgrade.
pub fn negotiate(host: &str, port: u16) -> Result<Upgraded<TcpStream>, HandshakeError> {
    let stream = TcpStream::connect((host, port)).map_err(|source| HandshakeError::Connect {
        host: host.to_owned(),
        port,
        source,
    })?;
    stream.set_nodelay(true)?;
    let key = wire::generate_key(&mut rand::rng());
    negotiate_over(stream, host, port, &key)
}

/// Negotiates the upgrade over an already open, blocking transport.
///
/// Sends the request, reads the response head up to its blank line (at most
/// [`HANDSHAKE_RESPONSE_LIMIT`] bytes, over as many reads as it takes) and
/// accepts it if the head contains `101`. `Sec-WebSocket-Accept` is not
/// verified. On any failure the transport is closed before the error is
/// returned.
pub fn negotiate_over<T: Transport>(
    mut transport: T,
    host: &str,
    port: u16,
    key: &str,
) -> Result<Upgraded<T>, HandshakeError> {
    let request = HandshakeRequest::with_key(host, port, key);
    let mut response = match exchange(&mut transport, &request.to_bytes()) {
        Ok(response) => response,
        Err(err) => {
            let _ = transport.close();
            return Err(err);
        }
    };

    let Some(end) = head_end(&response).filter(|&end| is_switching_protocols(&response[..end]))
    else {
        let _ = transport.close();
        return Err(HandshakeError::Rejected {
            status_line: status_line(&response),
        });
    };

    transport.set_nonblocking(true)?;
    let pending = response.split_off(end);
    debug!(
        status = %status_line(&response),
        pending = pending.len(),
        "websocket upgrade accepted"
    );

    Ok(Upgraded { transport, pending })
}

/// Writes the request and reads until the response head is complete, the
/// peer hangs up, or the head outgrows [`HANDSHAKE_RESPONSE_LIMIT`].
fn exchange<T: Transport>(transport: &mut T, request: &[u8]) -> Result<Vec<u8>, HandshakeError> {
    transport.write_all(request)?;
    transport.flush()?;
    let mut response = Vec::with_capacity(HANDSHAKE_RESPONSE_LIMIT);
    let mut chunk = [0u8; HANDSHAKE_RESPONSE_LIMIT];
    while head_end(&response).is_none() {
        if response.len() >= HANDSHAKE_RESPONSE_LIMIT {
            return Err(HandshakeError::ResponseTooLarge {
                limit: HANDSHAKE_RESPONSE_LIMIT,
            });
        }
        match transport.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => response.extend_from_slice(&chunk[..read]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(response)
}

/// Offset just past the blank line ending the response head.
fn head_end(response: &[u8]) -> Option<usize> {
    response
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}
