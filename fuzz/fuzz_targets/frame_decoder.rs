#![no_main]

use libfuzzer_sys::fuzz_target;
use wire::{decode_frame, FrameDecoder, MaskPolicy};

fuzz_target!(|data: &[u8]| {
    let limits = wire::Limits::for_testing();

    for policy in [MaskPolicy::Always, MaskPolicy::FromHeader] {
        // Feed in chunks sized by the input itself, as a non-blocking reader would.
        let mut decoder = FrameDecoder::new(policy, limits.clone());
        let mut whole = Vec::new();
        let mut idx = 0usize;
        let mut failed = false;
        while idx < data.len() && !failed {
            let len = (data[idx] as usize % 64).saturating_add(1);
            idx += 1;
            let end = (idx + len).min(data.len());
            if decoder.feed(&data[idx..end]).is_err() {
                break;
            }
            idx = end;
            loop {
                match decoder.next_frame() {
                    Ok(Some(frame)) => whole.push(frame),
                    Ok(None) => break,
                    Err(_) => {
                        failed = true;
                        break;
                    }
                }
            }
        }

        // One-shot decoding of the same bytes agrees on the leading frame.
        if let Ok(Some((frame, used))) = decode_frame(data, policy, &limits) {
            assert!(used <= data.len());
            assert_eq!(frame.payload.len() as u64, frame.header.payload_len);
        }
        for frame in &whole {
            assert_eq!(frame.payload.len() as u64, frame.header.payload_len);
        }
    }
});
