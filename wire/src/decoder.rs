//! Incremental inbound frame decoding.
//!
//! A non-blocking read hands over whatever bytes happen to be available,
//! which may end anywhere inside a frame. [`FrameDecoder`] buffers them and
//! walks an explicit state machine:
//!
//! ```text
//! Header --(126/127)--> Length --> Mask --> Payload --> Header
//!    \                     \________________/^
//!     \------(short)--------------/      (policy says no key)
//! ```
//!
//! Each state waits until its bytes are buffered, so a frame split across
//! any number of reads decodes exactly like one delivered in a single read.

use crate::error::{FrameError, FrameResult, LimitKind};
use crate::header::{FrameHeader, LengthClass, MaskPolicy};
use crate::limits::Limits;
use crate::mask::{apply_mask, MaskKey, MASK_KEY_SIZE};

/// A decoded frame with its payload already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    /// Key consumed from the stream, if any.
    pub mask_key: Option<MaskKey>,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Header,
    Length {
        first: u8,
        second: u8,
        class: LengthClass,
    },
    Mask {
        first: u8,
        second: u8,
        len: usize,
    },
    Payload {
        first: u8,
        second: u8,
        len: usize,
        key: Option<MaskKey>,
    },
}

/// Stateful decoder that survives partial reads.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    policy: MaskPolicy,
    limits: Limits,
    state: DecodeState,
    buf: Vec<u8>,
    pos: usize,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub const fn new(policy: MaskPolicy, limits: Limits) -> Self {
        Self {
            policy,
            limits,
            state: DecodeState::Header,
            buf: Vec::new(),
            pos: 0,
        }
    }

    /// Mask policy this decoder applies.
    #[must_use]
    pub const fn policy(&self) -> MaskPolicy {
        self.policy
    }

    /// Number of received bytes not yet returned as part of a frame.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns `true` if no partial frame is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == DecodeState::Header && self.buffered() == 0
    }

    /// Drops all buffered bytes and any partially decoded frame.
    pub fn reset(&mut self) {
        self.state = DecodeState::Header;
        self.buf.clear();
        self.pos = 0;
    }

    /// Appends freshly read bytes.
    pub fn feed(&mut self, bytes: &[u8]) -> FrameResult<()> {
        self.compact();
        let total = self.buf.len() + bytes.len();
        if total > self.limits.max_buffered_bytes {
            return Err(FrameError::LimitsExceeded {
                kind: LimitKind::BufferedBytes,
                limit: self.limits.max_buffered_bytes,
                actual: total as u64,
            });
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Decodes the next complete frame, or `Ok(None)` if more bytes are needed.
    pub fn next_frame(&mut self) -> FrameResult<Option<Frame>> {
        loop {
            match self.state {
                DecodeState::Header => {
                    let Some([first, second]) = self.take::<2>() else {
                        return Ok(None);
                    };
                    self.state = match LengthClass::from_marker(second) {
                        LengthClass::Short(len) => {
                            self.after_length(first, second, u64::from(len))?
                        }
                        class => DecodeState::Length {
                            first,
                            second,
                            class,
                        },
                    };
                }
                DecodeState::Length {
                    first,
                    second,
                    class,
                } => {
                    let len = match class {
                        LengthClass::Short(len) => Some(u64::from(len)),
                        LengthClass::Extended16 => {
                            self.take::<2>().map(|b| u64::from(u16::from_be_bytes(b)))
                        }
                        LengthClass::Extended64 => self.take::<8>().map(u64::from_be_bytes),
                    };
                    let Some(len) = len else {
                        return Ok(None);
                    };
                    self.state = self.after_length(first, second, len)?;
                }
                DecodeState::Mask { first, second, len } => {
                    let Some(key) = self.take::<MASK_KEY_SIZE>() else {
                        return Ok(None);
                    };
                    self.state = DecodeState::Payload {
                        first,
                        second,
                        len,
                        key: Some(key),
                    };
                }
                DecodeState::Payload {
                    first,
                    second,
                    len,
                    key,
                } => {
                    if self.buffered() < len {
                        return Ok(None);
                    }
                    let end = self.pos + len;
                    let mut payload = self.buf[self.pos..end].to_vec();
                    self.pos = end;
                    if let Some(key) = key {
                        apply_mask(&mut payload, key);
                    }
                    self.state = DecodeState::Header;
                    self.compact();
                    return Ok(Some(Frame {
                        header: FrameHeader::from_bytes(first, second, len as u64),
                        mask_key: key,
                        payload,
                    }));
                }
            }
        }
    }

    fn after_length(&self, first: u8, second: u8, len: u64) -> FrameResult<DecodeState> {
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= self.limits.max_payload_bytes)
            .ok_or(FrameError::LimitsExceeded {
                kind: LimitKind::PayloadBytes,
                limit: self.limits.max_payload_bytes,
                actual: len,
            })?;
        let header = FrameHeader::from_bytes(first, second, len as u64);
        Ok(if self.policy.expects_key(header.masked) {
            DecodeState::Mask { first, second, len }
        } else {
            DecodeState::Payload {
                first,
                second,
                len,
                key: None,
            }
        })
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos + N;
        let bytes = self.buf.get(self.pos..end)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Some(out)
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

/// Decodes one frame from the front of `bytes`.
///
/// Returns the frame and the number of bytes it occupied, or `Ok(None)` if
/// `bytes` ends before the frame does.
pub fn decode_frame(
    bytes: &[u8],
    policy: MaskPolicy,
    limits: &Limits,
) -> FrameResult<Option<(Frame, usize)>> {
    let limits = Limits {
        max_payload_bytes: limits.max_payload_bytes,
        max_buffered_bytes: usize::MAX,
    };
    let mut decoder = FrameDecoder::new(policy, limits);
    decoder.buf.extend_from_slice(bytes);
    Ok(decoder
        .next_frame()?
        .map(|frame| (frame, bytes.len() - decoder.buffered())))
}
