//! WebSocket text framing and upgrade handshake text for horde.
//!
//! This crate handles the bytes on the wire: the HTTP Upgrade request and
//! response check, text frame headers, masking, and incremental frame
//! decoding. It does not know about game state types or sockets, only the
//! structure of the byte stream.
//!
//! # Design Principles
//!
//! - **Wire compatible with the paired server** - Client frames are sent
//!   unmasked and, under [`MaskPolicy::Always`], every inbound frame is read
//!   with a 4-byte mask field regardless of its mask bit.
//! - **Bounded decoding** - Declared lengths are validated against [`Limits`]
//!   before any payload is buffered.
//! - **Partial input is normal** - [`FrameDecoder`] keeps its state between
//!   non-blocking reads and never loses a half-received frame.

mod decoder;
mod encode;
mod error;
mod handshake;
mod header;
mod limits;
mod mask;

pub use decoder::{decode_frame, Frame, FrameDecoder};
pub use encode::{encode_masked_text_frame, encode_text_frame, encode_text_frame_into};
pub use error::{FrameError, FrameResult, LimitKind};
pub use handshake::{
    accept_key, generate_key, is_switching_protocols, status_line, HandshakeRequest,
    HANDSHAKE_RESPONSE_LIMIT, WEBSOCKET_GUID, WEBSOCKET_VERSION,
};
pub use header::{
    FrameHeader, LengthClass, MaskPolicy, FIN_BIT, LEN_EXTENDED_16, LEN_EXTENDED_64, LEN_MASK,
    MASK_BIT, MAX_HEADER_SIZE, OPCODE_MASK, OPCODE_TEXT, TEXT_FINAL,
};
pub use limits::Limits;
pub use mask::{apply_mask, MaskKey, MASK_KEY_SIZE};
