//! Inspection and debugging tools for horde frame captures.
//!
//! A capture is the raw byte stream of one direction of a connection, after
//! the HTTP upgrade. These helpers walk it frame by frame:
//!
//! - [`inspect_frames`] reports the header layout of every frame
//! - [`decode_envelopes_json`] parses each payload as an envelope
//!
//! Both take the same [`MaskPolicy`] the reading side would use, so a capture
//! can be checked the way the client or the relay would see it.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use wire::{decode_frame, Frame, LengthClass, Limits, MaskKey, MaskPolicy, LEN_MASK};

/// Layout of one frame in a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSummary {
    pub offset: usize,
    pub first_byte: u8,
    pub fin: bool,
    pub opcode: u8,
    pub masked: bool,
    pub length_class: &'static str,
    pub header_len: usize,
    pub payload_len: u64,
    pub mask_key: Option<MaskKey>,
    /// Value of the payload's `type` field, when it is a JSON object with one.
    pub envelope_type: Option<String>,
}

/// Every complete frame in a capture, plus the bytes after the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub total_bytes: usize,
    pub frames: Vec<FrameSummary>,
    /// Bytes of an incomplete frame at the end of the capture.
    pub trailing_bytes: usize,
}

const fn length_class_name(class: LengthClass) -> &'static str {
    match class {
        LengthClass::Short(_) => "short",
        LengthClass::Extended16 => "extended16",
        LengthClass::Extended64 => "extended64",
    }
}

fn envelope_type(payload: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(payload).ok()?;
    value.get("type")?.as_str().map(str::to_owned)
}

/// Splits a capture into frames. Returns each frame with its offset and
/// encoded size, and the number of trailing bytes.
fn split_frames(
    bytes: &[u8],
    policy: MaskPolicy,
    limits: &Limits,
) -> Result<(Vec<(usize, usize, Frame)>, usize)> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let Some((frame, used)) = decode_frame(&bytes[offset..], policy, limits)
            .with_context(|| format!("decode frame at offset {offset}"))?
        else {
            break;
        };
        frames.push((offset, used, frame));
        offset += used;
    }
    Ok((frames, bytes.len() - offset))
}

/// Walks a capture and reports the layout of every frame.
pub fn inspect_frames(bytes: &[u8], policy: MaskPolicy, limits: &Limits) -> Result<InspectReport> {
    let (frames, trailing_bytes) = split_frames(bytes, policy, limits)?;
    let frames = frames
        .into_iter()
        .map(|(offset, used, frame)| FrameSummary {
            offset,
            first_byte: bytes[offset],
            fin: frame.header.fin,
            opcode: frame.header.opcode,
            masked: frame.header.masked,
            length_class: length_class_name(LengthClass::from_marker(bytes[offset + 1] & LEN_MASK)),
            header_len: used - frame.payload.len(),
            payload_len: frame.header.payload_len,
            mask_key: frame.mask_key,
            envelope_type: envelope_type(&frame.payload),
        })
        .collect();
    Ok(InspectReport {
        total_bytes: bytes.len(),
        frames,
        trailing_bytes,
    })
}

/// Decodes every frame payload as an envelope.
///
/// Payloads that are JSON are included verbatim under `payload`; `error`
/// explains why a payload is not a valid envelope.
pub fn decode_envelopes_json(bytes: &[u8], policy: MaskPolicy, limits: &Limits) -> Result<Value> {
    let (frames, trailing_bytes) = split_frames(bytes, policy, limits)?;
    let frames: Vec<Value> = frames
        .into_iter()
        .map(|(offset, _, frame)| {
            let payload = serde_json::from_slice::<Value>(&frame.payload).unwrap_or(Value::Null);
            let (kind, error) = match protocol::decode_envelope(&frame.payload) {
                Ok(envelope) => (Some(envelope.kind()), None),
                Err(err) => (None, Some(err.to_string())),
            };
            json!({
                "offset": offset,
                "type": kind,
                "payload": payload,
                "error": error,
            })
        })
        .collect();
    Ok(json!({
        "frames": frames,
        "trailing_bytes": trailing_bytes,
    }))
}

/// Renders a report as human-readable text.
#[must_use]
pub fn format_inspect_pretty(report: &InspectReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} bytes, {} frames, {} trailing",
        report.total_bytes,
        report.frames.len(),
        report.trailing_bytes
    );
    for frame in &report.frames {
        let key = frame.mask_key.map_or_else(
            || "none".to_owned(),
            |key| key.iter().map(|b| format!("{b:02x}")).collect::<String>(),
        );
        let _ = writeln!(
            out,
            "  @{:<6} 0x{:02x} fin={} op={} masked={} {}+{} bytes ({}) key={} type={}",
            frame.offset,
            frame.first_byte,
            u8::from(frame.fin),
            frame.opcode,
            u8::from(frame.masked),
            frame.header_len,
            frame.payload_len,
            frame.length_class,
            key,
            frame.envelope_type.as_deref().unwrap_or("-"),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{encode_outbound, encode_world, InboundEnvelope, OutboundEnvelope, PlayerState};
    use wire::{encode_masked_text_frame, encode_text_frame};

    fn state_payload() -> Vec<u8> {
        encode_outbound(&OutboundEnvelope {
            player: PlayerState::at(1.0, 2.0),
            bullets: Vec::new(),
            zombies: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn inspects_relay_stream() {
        let world = encode_world(&InboundEnvelope::default()).unwrap();
        let mut capture = encode_masked_text_frame(&world, [1, 2, 3, 4]);
        capture.extend(encode_masked_text_frame(&vec![b' '; 300], [0; 4]));
        capture.extend_from_slice(&[0x81, 0x85, 0]);

        let report = inspect_frames(&capture, MaskPolicy::Always, &Limits::default()).unwrap();
        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.trailing_bytes, 3);
        assert_eq!(report.total_bytes, capture.len());

        let first = &report.frames[0];
        assert_eq!(first.offset, 0);
        assert_eq!(first.first_byte, 0x81);
        assert!(first.fin && first.masked);
        assert_eq!(first.opcode, 1);
        assert_eq!(first.length_class, "short");
        assert_eq!(first.header_len, 6);
        assert_eq!(first.mask_key, Some([1, 2, 3, 4]));
        assert_eq!(first.envelope_type.as_deref(), Some("world"));

        let second = &report.frames[1];
        assert_eq!(second.length_class, "extended16");
        assert_eq!(second.header_len, 8);
        assert_eq!(second.payload_len, 300);
        assert_eq!(second.envelope_type, None);
    }

    #[test]
    fn header_policy_reads_client_stream() {
        let mut capture = encode_text_frame(&state_payload());
        capture.extend(encode_text_frame(&state_payload()));
        let report = inspect_frames(&capture, MaskPolicy::FromHeader, &Limits::default()).unwrap();
        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.trailing_bytes, 0);
        assert_eq!(report.frames[0].mask_key, None);
        assert_eq!(report.frames[1].envelope_type.as_deref(), Some("state"));
    }

    #[test]
    fn limit_violation_names_offset() {
        let mut capture = encode_text_frame(b"{}");
        capture.extend_from_slice(&[0x81, 127]);
        capture.extend_from_slice(&u64::MAX.to_be_bytes());
        let err = inspect_frames(&capture, MaskPolicy::FromHeader, &Limits::default()).unwrap_err();
        assert!(err.to_string().contains("offset 4"));
    }

    #[test]
    fn decode_reports_valid_and_invalid_payloads() {
        let mut capture = encode_text_frame(&state_payload());
        capture.extend(encode_text_frame(br#"{"type":"ping"}"#));
        capture.extend(encode_text_frame(b"not json"));

        let value =
            decode_envelopes_json(&capture, MaskPolicy::FromHeader, &Limits::default()).unwrap();
        let frames = value["frames"].as_array().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0]["type"], "state");
        assert_eq!(frames[0]["payload"]["player"]["x"], 1.0);
        assert!(frames[0]["error"].is_null());
        assert!(frames[1]["type"].is_null());
        assert!(frames[1]["error"].as_str().unwrap().contains("ping"));
        assert!(frames[2]["payload"].is_null());
        assert_eq!(value["trailing_bytes"], 0);
    }

    #[test]
    fn pretty_output_lists_frames() {
        let capture = encode_masked_text_frame(&state_payload(), [0xde, 0xad, 0xbe, 0xef]);
        let report = inspect_frames(&capture, MaskPolicy::Always, &Limits::default()).unwrap();
        let text = format_inspect_pretty(&report);
        assert!(text.starts_with(&format!("{} bytes, 1 frames, 0 trailing", capture.len())));
        assert!(text.contains("key=deadbeef"));
        assert!(text.contains("type=state"));
    }
}
