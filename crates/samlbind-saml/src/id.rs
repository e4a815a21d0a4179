#![forbid(unsafe_code)]

//! Identifier generation.

use rand::RngCore;

/// A random identifier usable as `AssertionID`, `RequestID` or
/// `ResponseID`: 128 bits of entropy, hex encoded, behind a leading `_` so
/// it is always a valid NCName.
pub fn generate() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut id = String::with_capacity(33);
    id.push('_');
    for b in bytes {
        id.push_str(&format!("{b:02x}"));
    }
    id
}
