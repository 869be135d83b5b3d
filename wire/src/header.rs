//! Frame header types and constants.

use crate::mask::MASK_KEY_SIZE;

/// Final-fragment bit in the first header byte.
pub const FIN_BIT: u8 = 0x80;

/// Opcode bits in the first header byte.
pub const OPCODE_MASK: u8 = 0x0F;

/// Text frame opcode.
pub const OPCODE_TEXT: u8 = 0x1;

/// First header byte of every outbound frame: final fragment, text opcode.
pub const TEXT_FINAL: u8 = FIN_BIT | OPCODE_TEXT;

/// Mask bit in the second header byte.
pub const MASK_BIT: u8 = 0x80;

/// Length bits in the second header byte.
pub const LEN_MASK: u8 = 0x7F;

/// Length marker announcing a 2-byte big-endian extended length.
pub const LEN_EXTENDED_16: u8 = 126;

/// Length marker announcing an 8-byte big-endian extended length.
pub const LEN_EXTENDED_64: u8 = 127;

/// Largest possible header in bytes (14 total).
pub const MAX_HEADER_SIZE: usize = 1 + 1 + 8 + MASK_KEY_SIZE;

/// How the payload length is carried in a frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthClass {
    /// Length below 126, stored directly in the second byte.
    Short(u8),
    /// Marker 126 followed by a big-endian `u16`.
    Extended16,
    /// Marker 127 followed by a big-endian `u64`.
    Extended64,
}

impl LengthClass {
    /// Picks the encoding branch for a payload of `len` bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn for_len(len: usize) -> Self {
        if len < LEN_EXTENDED_16 as usize {
            Self::Short(len as u8)
        } else if len <= u16::MAX as usize {
            Self::Extended16
        } else {
            Self::Extended64
        }
    }

    /// Interprets the low 7 bits of the second header byte.
    #[must_use]
    pub const fn from_marker(marker: u8) -> Self {
        match marker & LEN_MASK {
            LEN_EXTENDED_16 => Self::Extended16,
            LEN_EXTENDED_64 => Self::Extended64,
            len => Self::Short(len),
        }
    }

    /// Returns the 7-bit value written into the second header byte.
    #[must_use]
    pub const fn marker(self) -> u8 {
        match self {
            Self::Short(len) => len,
            Self::Extended16 => LEN_EXTENDED_16,
            Self::Extended64 => LEN_EXTENDED_64,
        }
    }

    /// Number of extended length bytes following the second header byte.
    #[must_use]
    pub const fn extension_len(self) -> usize {
        match self {
            Self::Short(_) => 0,
            Self::Extended16 => 2,
            Self::Extended64 => 8,
        }
    }
}

/// How the decoder treats the 4-byte mask field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskPolicy {
    /// Always consume 4 bytes after the length and XOR the payload with them,
    /// whatever the mask bit says. This is what the paired server expects.
    #[default]
    Always,
    /// Consume a mask key only when the mask bit is set.
    FromHeader,
}

impl MaskPolicy {
    /// Returns `true` if a 4-byte key follows the length for this mask bit.
    #[must_use]
    pub const fn expects_key(self, mask_bit: bool) -> bool {
        match self {
            Self::Always => true,
            Self::FromHeader => mask_bit,
        }
    }
}

/// Decoded frame header.
///
/// The fin bit and opcode are recorded as received; the decoder never
/// rejects a frame because of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Final-fragment bit.
    pub fin: bool,
    /// Opcode nibble.
    pub opcode: u8,
    /// Mask bit as sent by the peer.
    pub masked: bool,
    /// Declared payload length.
    pub payload_len: u64,
}

impl FrameHeader {
    /// Builds a header from the two leading bytes and the resolved length.
    #[must_use]
    pub const fn from_bytes(first: u8, second: u8, payload_len: u64) -> Self {
        Self {
            fin: first & FIN_BIT != 0,
            opcode: first & OPCODE_MASK,
            masked: second & MASK_BIT != 0,
            payload_len,
        }
    }

    /// Returns `true` for a final text frame, the only kind this protocol sends.
    #[must_use]
    pub const fn is_text_final(&self) -> bool {
        self.fin && self.opcode == OPCODE_TEXT
    }

    /// Length class used to carry `payload_len`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn length_class(&self) -> LengthClass {
        LengthClass::for_len(self.payload_len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_final_is_0x81() {
        assert_eq!(TEXT_FINAL, 0x81);
    }

    #[test]
    fn max_header_size_is_14() {
        assert_eq!(MAX_HEADER_SIZE, 14);
    }

    #[test]
    fn length_class_boundaries() {
        assert_eq!(LengthClass::for_len(0), LengthClass::Short(0));
        assert_eq!(LengthClass::for_len(1), LengthClass::Short(1));
        assert_eq!(LengthClass::for_len(125), LengthClass::Short(125));
        assert_eq!(LengthClass::for_len(126), LengthClass::Extended16);
        assert_eq!(LengthClass::for_len(127), LengthClass::Extended16);
        assert_eq!(LengthClass::for_len(65535), LengthClass::Extended16);
        assert_eq!(LengthClass::for_len(65536), LengthClass::Extended64);
    }

    #[test]
    fn length_class_markers() {
        assert_eq!(LengthClass::Short(42).marker(), 42);
        assert_eq!(LengthClass::Extended16.marker(), 126);
        assert_eq!(LengthClass::Extended64.marker(), 127);
    }

    #[test]
    fn from_marker_ignores_mask_bit() {
        assert_eq!(LengthClass::from_marker(0x80 | 5), LengthClass::Short(5));
        assert_eq!(LengthClass::from_marker(0x80 | 126), LengthClass::Extended16);
        assert_eq!(LengthClass::from_marker(127), LengthClass::Extended64);
    }

    #[test]
    fn extension_lengths() {
        assert_eq!(LengthClass::Short(3).extension_len(), 0);
        assert_eq!(LengthClass::Extended16.extension_len(), 2);
        assert_eq!(LengthClass::Extended64.extension_len(), 8);
    }

    #[test]
    fn mask_policy_expectations() {
        assert!(MaskPolicy::Always.expects_key(false));
        assert!(MaskPolicy::Always.expects_key(true));
        assert!(!MaskPolicy::FromHeader.expects_key(false));
        assert!(MaskPolicy::FromHeader.expects_key(true));
        assert_eq!(MaskPolicy::default(), MaskPolicy::Always);
    }

    #[test]
    fn header_from_bytes() {
        let header = FrameHeader::from_bytes(0x81, 0x80 | 10, 10);
        assert!(header.fin);
        assert_eq!(header.opcode, OPCODE_TEXT);
        assert!(header.masked);
        assert!(header.is_text_final());
        assert_eq!(header.length_class(), LengthClass::Short(10));
    }

    #[test]
    fn header_records_unexpected_opcode() {
        // binary, not final: recorded, not rejected
        let header = FrameHeader::from_bytes(0x02, 3, 3);
        assert!(!header.fin);
        assert_eq!(header.opcode, 0x2);
        assert!(!header.masked);
        assert!(!header.is_text_final());
    }

    #[test]
    fn header_const_constructible() {
        const HEADER: FrameHeader = FrameHeader::from_bytes(TEXT_FINAL, 0, 0);
        assert_eq!(HEADER.payload_len, 0);
    }
}
