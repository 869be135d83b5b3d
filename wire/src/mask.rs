//! Payload masking.

/// Size of a frame masking key in bytes.
pub const MASK_KEY_SIZE: usize = 4;

/// A 4-byte frame masking key.
pub type MaskKey = [u8; MASK_KEY_SIZE];

/// XORs every payload byte `i` with `key[i % 4]`.
///
/// Applying the same key twice restores the original bytes, so this both
/// masks and unmasks. An all-zero key leaves the payload untouched.
pub fn apply_mask(payload: &mut [u8], key: MaskKey) {
    for (byte, k) in payload.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}
