#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(envelope) = protocol::decode_envelope(data) {
        // Anything that parses re-encodes and parses back to the same kind.
        let bytes = envelope.encode().expect("re-encode parsed envelope");
        let again = protocol::decode_envelope(&bytes).expect("decode re-encoded envelope");
        assert_eq!(envelope.kind(), again.kind());
    }
    let _ = protocol::decode_inbound(data);
});
