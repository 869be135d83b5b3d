//! Outbound frame encoding.

use crate::header::{LengthClass, MASK_BIT, MAX_HEADER_SIZE, TEXT_FINAL};
use crate::mask::{apply_mask, MaskKey};

/// Encodes `payload` as a single final text frame.
///
/// The mask bit is left clear and the payload is copied verbatim. This is
/// not what RFC 6455 asks of a client, but it is what the paired server
/// reads. Payloads of any size become one frame; nothing is fragmented.
#[must_use]
pub fn encode_text_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_HEADER_SIZE + payload.len());
    encode_text_frame_into(payload, &mut out);
    out
}

/// Appends an unmasked text frame carrying `payload` to `out`.
pub fn encode_text_frame_into(payload: &[u8], out: &mut Vec<u8>) {
    out.reserve(MAX_HEADER_SIZE + payload.len());
    write_header(payload.len(), 0, out);
    out.extend_from_slice(payload);
}

/// Encodes `payload` as a final text frame with the mask bit set.
///
/// The key follows the length and the payload is XOR-ed with it, so a
/// decoder that always consumes a 4-byte mask reads the frame correctly.
#[must_use]
pub fn encode_masked_text_frame(payload: &[u8], key: MaskKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_HEADER_SIZE + payload.len());
    write_header(payload.len(), MASK_BIT, &mut out);
    out.extend_from_slice(&key);
    let start = out.len();
    out.extend_from_slice(payload);
    apply_mask(&mut out[start..], key);
    out
}

fn write_header(len: usize, mask_bit: u8, out: &mut Vec<u8>) {
    let class = LengthClass::for_len(len);
    out.push(TEXT_FINAL);
    out.push(mask_bit | class.marker());
    match class {
        LengthClass::Short(_) => {}
        LengthClass::Extended16 => {
            #[allow(clippy::cast_possible_truncation)]
            let len = len as u16;
            out.extend_from_slice(&len.to_be_bytes());
        }
        LengthClass::Extended64 => {
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_of(len: usize) -> Vec<u8> {
        let frame = encode_text_frame(&vec![b'a'; len]);
        frame[..frame.len() - len].to_vec()
    }

    #[test]
    fn empty_payload_header() {
        assert_eq!(header_of(0), vec![0x81, 0]);
    }

    #[test]
    fn one_byte_payload_header() {
        assert_eq!(header_of(1), vec![0x81, 1]);
    }

    #[test]
    fn short_boundary_125() {
        assert_eq!(header_of(125), vec![0x81, 125]);
    }

    #[test]
    fn extended16_boundary_126() {
        assert_eq!(header_of(126), vec![0x81, 126, 0x00, 0x7E]);
    }

    #[test]
    fn extended16_at_127() {
        assert_eq!(header_of(127), vec![0x81, 126, 0x00, 0x7F]);
    }

    #[test]
    fn extended16_upper_boundary_65535() {
        assert_eq!(header_of(65535), vec![0x81, 126, 0xFF, 0xFF]);
    }

    #[test]
    fn extended64_boundary_65536() {
        assert_eq!(
            header_of(65536),
            vec![0x81, 127, 0, 0, 0, 0, 0, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn payload_follows_verbatim() {
        let payload = br#"{"type":"state"}"#;
        let frame = encode_text_frame(payload);
        assert_eq!(&frame[2..], payload);
        assert_eq!(frame[1] & MASK_BIT, 0, "client frames stay unmasked");
    }

    #[test]
    fn encode_into_appends() {
        let mut out = vec![0xAA];
        encode_text_frame_into(b"hi", &mut out);
        assert_eq!(out, vec![0xAA, 0x81, 2, b'h', b'i']);
    }

    #[test]
    fn masked_frame_layout() {
        let key = [1, 2, 3, 4];
        let frame = encode_masked_text_frame(b"abcde", key);
        assert_eq!(frame[0], 0x81);
        assert_eq!(frame[1], MASK_BIT | 5);
        assert_eq!(&frame[2..6], &key);
        let mut payload = frame[6..].to_vec();
        apply_mask(&mut payload, key);
        assert_eq!(payload, b"abcde");
    }

    #[test]
    fn masked_frame_extended_length() {
        let frame = encode_masked_text_frame(&[0u8; 300], [0; 4]);
        assert_eq!(frame[1], MASK_BIT | 126);
        assert_eq!(u16::from_be_bytes([frame[2], frame[3]]), 300);
        assert_eq!(frame.len(), 4 + 4 + 300);
    }
}
