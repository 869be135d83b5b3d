//! Client session state machine.
//!
//! ```text
//! Disconnected --attach/connect--> Handshaking --101--> Open
//!                                       |                 |
//!                                       +--> Failed <-----+ (write/read error, EOF, desync)
//! ```
//!
//! The simulation loop owns the session and drives it synchronously: one
//! [`ClientSession::send`] and one [`ClientSession::poll_receive`] per tick.
//! Outside `Open` both are no-ops, so the loop runs offline without any
//! special casing. A failed session is never reconnected.

use std::fmt;
use std::io;
use std::mem;
use std::net::TcpStream;

use protocol::{InboundEnvelope, OutboundEnvelope, SessionId, SessionIdentity};
use tracing::{debug, info, trace, warn};
use wire::{FrameDecoder, MaskPolicy};

use crate::config::ClientConfig;
use crate::error::{HandshakeError, ReceiveError, SendError};
use crate::handshake::{negotiate, negotiate_over, Upgraded};
use crate::transport::Transport;

const READ_CHUNK: usize = 16 * 1024;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Handshaking,
    Open,
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Handshaking => "handshaking",
            Self::Open => "open",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Counters for what the session did with the traffic it saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    /// Complete world envelopes superseded by a newer one in the same poll.
    pub snapshots_dropped: u64,
    /// Complete frames whose payload was not a world envelope.
    pub frames_discarded: u64,
}

/// The single connection between the simulation and the relay.
#[derive(Debug)]
pub struct ClientSession<T: Transport = TcpStream> {
    config: ClientConfig,
    state: ConnectionState,
    transport: Option<T>,
    decoder: FrameDecoder,
    pending: Vec<u8>,
    identity: SessionIdentity,
    stats: SessionStats,
    read_buf: Vec<u8>,
    out_buf: Vec<u8>,
}

impl ClientSession<TcpStream> {
    /// Connects to the configured relay.
    ///
    /// Never fails: if the connection or the upgrade does not succeed, a
    /// single warning is logged and the session stays `Failed`, which keeps
    /// the simulation in offline mode for the rest of the run.
    #[must_use]
    pub fn connect(config: ClientConfig) -> Self {
        let mut session = Self::new(config);
        session.state = ConnectionState::Handshaking;
        let result = negotiate(&session.config.host, session.config.port);
        let _ = session.finish_handshake(result);
        session
    }
}

impl<T: Transport> ClientSession<T> {
    /// Creates a disconnected session.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let decoder = FrameDecoder::new(MaskPolicy::Always, config.limits.clone());
        Self {
            config,
            state: ConnectionState::Disconnected,
            transport: None,
            decoder,
            pending: Vec::new(),
            identity: SessionIdentity::default(),
            stats: SessionStats::default(),
            read_buf: vec![0; READ_CHUNK],
            out_buf: Vec::new(),
        }
    }

    /// Negotiates the upgrade over an already open transport.
    ///
    /// Only valid from `Disconnected`. On failure the session is `Failed`.
    pub fn attach(&mut self, transport: T) -> Result<(), HandshakeError> {
        if self.state != ConnectionState::Disconnected {
            return Err(HandshakeError::InvalidState { state: self.state });
        }
        self.state = ConnectionState::Handshaking;
        let key = wire::generate_key(&mut rand::rng());
        let result = negotiate_over(transport, &self.config.host, self.config.port, &key);
        self.finish_handshake(result)
    }

    fn finish_handshake(
        &mut self,
        result: Result<Upgraded<T>, HandshakeError>,
    ) -> Result<(), HandshakeError> {
        match result {
            Ok(upgraded) => {
                info!(host = %self.config.host, port = self.config.port, "connected to relay");
                self.transport = Some(upgraded.transport);
                self.pending = upgraded.pending;
                self.state = ConnectionState::Open;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "network disabled");
                self.state = ConnectionState::Failed;
                Err(err)
            }
        }
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// The id the relay assigned to this connection, once known.
    #[must_use]
    pub const fn identity(&self) -> Option<SessionId> {
        self.identity.get()
    }

    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The owned transport, if the session holds one.
    #[must_use]
    pub const fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Sends one `"state"` envelope.
    ///
    /// Does nothing unless the session is open. The frame is written in
    /// blocking mode; a slow peer can stall the tick. A write error closes
    /// the transport and fails the session.
    pub fn send(&mut self, envelope: &OutboundEnvelope) -> Result<(), SendError> {
        if self.state != ConnectionState::Open {
            return Ok(());
        }
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        let payload = protocol::encode_outbound(envelope)?;
        self.out_buf.clear();
        wire::encode_text_frame_into(&payload, &mut self.out_buf);

        if let Err(err) = write_blocking(transport, &self.out_buf) {
            warn!(error = %err, "send failed, network disabled");
            self.fail();
            return Err(err.into());
        }
        self.stats.frames_sent += 1;
        trace!(bytes = self.out_buf.len(), "sent state frame");
        Ok(())
    }

    /// Receives at most one world envelope without blocking.
    ///
    /// Drains whatever the transport has ready into the frame decoder and
    /// returns the newest complete world envelope; older complete ones from
    /// the same poll are dropped. A partial frame stays buffered for the next
    /// call. `Ok(None)` means nothing new arrived, including when the session
    /// is not open. Framing violations, read errors and end of stream fail the
    /// session; a bad frame right before end of stream is reported as
    /// [`ReceiveError::Closed`].
    pub fn poll_receive(&mut self) -> Result<Option<InboundEnvelope>, ReceiveError> {
        if self.state != ConnectionState::Open {
            return Ok(None);
        }
        let drained = match self.drain() {
            Ok(drained) => drained,
            Err(err) => {
                warn!(error = %err, "receive failed, network disabled");
                self.fail();
                return Err(err);
            }
        };
        if drained.eof {
            info!("relay closed the connection, network disabled");
            self.fail();
        }

        match (drained.latest, drained.discarded) {
            (Some(envelope), _) => {
                if self.identity.bind(envelope.id) {
                    info!(id = %envelope.id.map_or(0, SessionId::raw), "session identity assigned");
                }
                Ok(Some(envelope))
            }
            (None, Some(_)) if drained.eof => Err(ReceiveError::Closed),
            (None, Some(err)) => Err(err.into()),
            (None, None) => Ok(None),
        }
    }

    /// Closes the transport. Further sends and polls are no-ops.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            let _ = transport.close();
        }
        self.decoder.reset();
        self.pending.clear();
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Disconnected;
        }
    }

    fn fail(&mut self) {
        self.close();
        self.state = ConnectionState::Failed;
    }

    /// Reads what the transport has ready and decodes complete frames as
    /// they arrive, keeping the newest world envelope.
    ///
    /// Each read is capped by the room left under the decoder's buffer
    /// limit, so a burst of small frames never trips it.
    fn drain(&mut self) -> Result<Drained, ReceiveError> {
        let mut drained = Drained::default();
        if !self.pending.is_empty() {
            let pending = mem::take(&mut self.pending);
            self.decoder.feed(&pending)?;
            self.decode_ready(&mut drained)?;
        }
        let mut total = 0;
        while total < self.config.max_read_per_poll {
            let Some(transport) = self.transport.as_mut() else {
                drained.eof = true;
                break;
            };
            let room = self
                .config
                .limits
                .max_buffered_bytes
                .saturating_sub(self.decoder.buffered())
                .clamp(1, self.read_buf.len());
            match transport.read(&mut self.read_buf[..room]) {
                Ok(0) => {
                    drained.eof = true;
                    break;
                }
                Ok(read) => {
                    self.decoder.feed(&self.read_buf[..read])?;
                    total += read;
                    self.decode_ready(&mut drained)?;
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(drained)
    }

    fn decode_ready(&mut self, drained: &mut Drained) -> Result<(), ReceiveError> {
        while let Some(frame) = self.decoder.next_frame()? {
            self.stats.frames_received += 1;
            match protocol::decode_inbound(&frame.payload) {
                Ok(envelope) => {
                    if drained.latest.replace(envelope).is_some() {
                        self.stats.snapshots_dropped += 1;
                    }
                }
                Err(err) => {
                    self.stats.frames_discarded += 1;
                    debug!(error = %err, bytes = frame.payload.len(), "discarding frame");
                    drained.discarded = Some(err);
                }
            }
        }
        Ok(())
    }
}

/// Outcome of one poll's reads.
#[derive(Default)]
struct Drained {
    latest: Option<InboundEnvelope>,
    /// Last payload error, reported only when no frame was usable.
    discarded: Option<protocol::ProtocolError>,
    eof: bool,
}

fn write_blocking<T: Transport>(transport: &mut T, bytes: &[u8]) -> io::Result<()> {
    transport.set_nonblocking(false)?;
    transport.write_all(bytes)?;
    transport.flush()?;
    transport.set_nonblocking(true)
}
