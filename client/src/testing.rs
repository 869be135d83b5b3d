//! Scripted transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use crate::transport::Transport;

/// One scripted outcome of a `read` call.
#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Error(io::ErrorKind),
    Eof,
}

#[derive(Debug, Default)]
struct Script {
    reads: VecDeque<Step>,
    written: Vec<u8>,
    nonblocking: bool,
    closed: bool,
    fail_writes: bool,
    mode_switches: usize,
}

/// Clones share one script so a test can inspect a transport it moved away.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport(Rc<RefCell<Script>>);

impl ScriptedTransport {
    pub fn new(reads: Vec<Step>) -> Self {
        let transport = Self::default();
        transport.0.borrow_mut().reads = reads.into();
        transport
    }

    pub fn push(&self, step: Step) {
        self.0.borrow_mut().reads.push_back(step);
    }

    pub fn written(&self) -> Vec<u8> {
        self.0.borrow().written.clone()
    }

    pub fn clear_written(&self) {
        self.0.borrow_mut().written.clear();
    }

    pub fn fail_writes(&self) {
        self.0.borrow_mut().fail_writes = true;
    }

    pub fn is_nonblocking(&self) -> bool {
        self.0.borrow().nonblocking
    }

    pub fn is_closed(&self) -> bool {
        self.0.borrow().closed
    }

    pub fn mode_switches(&self) -> usize {
        self.0.borrow().mode_switches
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut script = self.0.borrow_mut();
        if script.closed {
            return Err(io::ErrorKind::NotConnected.into());
        }
        match script.reads.pop_front() {
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    let rest = data.split_off(n);
                    script.reads.push_front(Step::Data(rest));
                }
                Ok(n)
            }
            Some(Step::Error(kind)) => Err(kind.into()),
            Some(Step::Eof) => Ok(0),
            None if script.nonblocking => Err(io::ErrorKind::WouldBlock.into()),
            None => Ok(0),
        }
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut script = self.0.borrow_mut();
        if script.closed || script.fail_writes {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        script.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedTransport {
    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        let mut script = self.0.borrow_mut();
        script.nonblocking = nonblocking;
        script.mode_switches += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.0.borrow_mut().closed = true;
        Ok(())
    }
}
