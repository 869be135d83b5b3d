//! Thread-per-connection relay.
//!
//! One thread accepts connections, one thread per client reads its frames,
//! and one broadcaster thread writes the world to every client on a fixed
//! period. All of them share a [`RelayState`] and the client write halves
//! behind mutexes.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use protocol::{decode_state_report, encode_world, InboundEnvelope, ProtocolError, SessionId};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use wire::{encode_masked_text_frame, FrameDecoder, FrameError, MaskKey, MaskPolicy};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::relay::RelayState;
use crate::upgrade::{read_request, switching_protocols, UpgradeRequest, BAD_REQUEST};

const READ_CHUNK: usize = 16 * 1024;

#[derive(Debug, Error)]
enum ConnectionError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[derive(Debug)]
struct Shared {
    config: ServerConfig,
    relay: Mutex<RelayState>,
    clients: Mutex<BTreeMap<SessionId, TcpStream>>,
    shutdown: AtomicBool,
}

impl Shared {
    fn relay(&self) -> MutexGuard<'_, RelayState> {
        self.relay.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clients(&self) -> MutexGuard<'_, BTreeMap<SessionId, TcpStream>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn register(&self, id: SessionId, writer: TcpStream) {
        self.clients().insert(id, writer);
    }

    fn leave(&self, id: SessionId) {
        if let Some(writer) = self.clients().remove(&id) {
            let _ = writer.shutdown(Shutdown::Both);
        }
        self.relay().leave(id);
    }

    fn handle_payload(&self, id: SessionId, payload: &[u8]) {
        match decode_state_report(payload) {
            Ok(state) => {
                self.relay().apply_state(id, state);
            }
            Err(ProtocolError::UnexpectedType { found, .. }) => {
                debug!(%id, kind = found, "ignoring envelope");
            }
            Err(err) => warn!(%id, error = %err, "bad frame"),
        }
    }

    /// Writes the world to every client, each frame carrying the receiver's
    /// own id. Clients whose write fails are disconnected.
    fn broadcast<R: Rng>(&self, rng: &mut R) -> usize {
        let mut envelope = InboundEnvelope {
            id: None,
            world: self.relay().snapshot(),
        };
        let mut clients = self.clients();
        let mut failed = Vec::new();
        for (&id, writer) in clients.iter_mut() {
            envelope.id = Some(id);
            let payload = match encode_world(&envelope) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%id, error = %err, "encode world failed");
                    continue;
                }
            };
            let mut key: MaskKey = [0; 4];
            rng.fill(&mut key);
            if let Err(err) = writer.write_all(&encode_masked_text_frame(&payload, key)) {
                debug!(%id, error = %err, "dropping client after failed write");
                failed.push(id);
            }
        }
        for id in &failed {
            if let Some(writer) = clients.remove(id) {
                let _ = writer.shutdown(Shutdown::Both);
            }
        }
        clients.len()
    }
}

/// A bound relay that has not started serving yet.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl Server {
    pub fn bind(config: ServerConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(config.bind).map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            shared: Arc::new(Shared {
                config,
                relay: Mutex::new(RelayState::new()),
                clients: Mutex::new(BTreeMap::new()),
                shutdown: AtomicBool::new(false),
            }),
        })
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until shut down through a [`ServerHandle`].
    pub fn run(self) -> ServerResult<()> {
        info!(addr = %self.local_addr()?, "relay listening");
        let shared = Arc::clone(&self.shared);
        let broadcaster = thread::Builder::new()
            .name("horde-broadcast".to_owned())
            .spawn(move || broadcast_loop(&shared))?;

        let mut connections: Vec<JoinHandle<()>> = Vec::new();
        while !self.shared.is_shutting_down() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let shared = Arc::clone(&self.shared);
                    let handle = thread::Builder::new()
                        .name(format!("horde-conn-{peer}"))
                        .spawn(move || serve_connection(&shared, stream, peer))?;
                    connections.retain(|handle| !handle.is_finished());
                    connections.push(handle);
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(self.shared.config.poll_interval);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    thread::sleep(self.shared.config.poll_interval);
                }
            }
        }

        let mut panicked = broadcaster.join().is_err();
        for handle in connections {
            panicked |= handle.join().is_err();
        }
        info!("relay stopped");
        if panicked {
            return Err(ServerError::ThreadPanicked);
        }
        Ok(())
    }

    /// Runs the relay on a background thread.
    pub fn spawn(self) -> ServerResult<ServerHandle> {
        let addr = self.local_addr()?;
        let shared = Arc::clone(&self.shared);
        let thread = thread::Builder::new()
            .name("horde-relay".to_owned())
            .spawn(move || self.run())?;
        Ok(ServerHandle {
            addr,
            shared,
            thread,
        })
    }
}

/// Control for a relay started with [`Server::spawn`].
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shared: Arc<Shared>,
    thread: JoinHandle<ServerResult<()>>,
}

impl ServerHandle {
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Players currently present in the shared world.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.shared.relay().player_count()
    }

    /// Connections currently receiving broadcasts.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.shared.clients().len()
    }

    /// Stops accepting, disconnects every client and waits for all threads.
    pub fn shutdown(self) -> ServerResult<()> {
        self.shared.shutdown.store(true, Ordering::Release);
        self.thread
            .join()
            .map_err(|_| ServerError::ThreadPanicked)?
    }
}

fn broadcast_loop(shared: &Shared) {
    let interval = shared.config.broadcast_interval;
    let mut rng = rand::rng();
    let mut next = Instant::now() + interval;
    while !shared.is_shutting_down() {
        let now = Instant::now();
        if now < next {
            thread::sleep((next - now).min(shared.config.poll_interval));
            continue;
        }
        next = now + interval;
        let clients = shared.broadcast(&mut rng);
        trace!(clients, "broadcast world");
    }
}

fn serve_connection(shared: &Shared, mut stream: TcpStream, peer: SocketAddr) {
    let config = &shared.config;
    if let Err(err) = prepare(&stream, config) {
        debug!(%peer, error = %err, "configure connection failed");
        return;
    }

    let (head, rest) = match read_request(&mut stream, config.max_request_bytes) {
        Ok(request) => request,
        Err(err) => {
            debug!(%peer, error = %err, "upgrade request failed");
            let _ = stream.shutdown(Shutdown::Both);
            return;
        }
    };
    let request = UpgradeRequest::parse(&head);
    let key = match request.websocket_key() {
        Ok(key) => key.to_owned(),
        Err(err) => {
            if err.is_bad_request() {
                let _ = stream.write_all(BAD_REQUEST);
            }
            info!(%peer, error = %err, "rejected connection");
            let _ = stream.shutdown(Shutdown::Both);
            return;
        }
    };
    // The id is assigned before the response so ids follow upgrade order;
    // the client only receives broadcasts once the response is out.
    let id = shared.relay().join();
    if let Err(err) = stream.write_all(switching_protocols(&key).as_bytes()) {
        debug!(%peer, error = %err, "write upgrade response failed");
        shared.leave(id);
        return;
    }
    let writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(err) => {
            warn!(%peer, error = %err, "clone stream failed");
            shared.leave(id);
            return;
        }
    };
    shared.register(id, writer);
    info!(%peer, %id, "client joined");

    match read_frames(shared, &mut stream, id, &rest) {
        Ok(()) => {}
        Err(ConnectionError::Frame(err)) => warn!(%id, error = %err, "frame stream out of sync"),
        Err(ConnectionError::Io(err)) => debug!(%id, error = %err, "read failed"),
    }
    shared.leave(id);
    info!(%id, "client left");
}

fn prepare(stream: &TcpStream, config: &ServerConfig) -> io::Result<()> {
    // Accepted sockets may inherit the listener's non-blocking flag.
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(config.request_timeout))?;
    stream.set_write_timeout(Some(config.write_timeout))
}

fn read_frames(
    shared: &Shared,
    stream: &mut TcpStream,
    id: SessionId,
    pending: &[u8],
) -> Result<(), ConnectionError> {
    stream.set_read_timeout(Some(shared.config.poll_interval))?;
    let mut decoder = FrameDecoder::new(MaskPolicy::FromHeader, shared.config.limits.clone());
    let mut buf = vec![0u8; READ_CHUNK];
    decoder.feed(pending)?;
    loop {
        while let Some(frame) = decoder.next_frame()? {
            shared.handle_payload(id, &frame.payload);
        }
        if shared.is_shutting_down() {
            return Ok(());
        }
        match stream.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(read) => decoder.feed(&buf[..read])?,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(err) => return Err(err.into()),
        }
    }
}
