//! Byte stream the session owns.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// A bidirectional byte stream that can be switched to non-blocking mode.
///
/// Implemented for [`TcpStream`]; tests substitute scripted streams.
pub trait Transport: Read + Write {
    /// Switches reads (and writes) between blocking and non-blocking mode.
    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()>;

    /// Shuts the stream down in both directions.
    fn close(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        Self::set_nonblocking(self, nonblocking)
    }

    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}
