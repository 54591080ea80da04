//! Checksum header generation.
//!
//! The backend expects an `x-cursor-checksum` header on every call. Its
//! value is a 6-byte millisecond timestamp run through a rolling XOR,
//! base64 encoded, with the machine identifier appended. The backend only
//! appears to check that the header is present and well formed.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::{SystemTime, UNIX_EPOCH};

/// Initial accumulator for the rolling XOR.
pub const CHECKSUM_SEED: u8 = 165;

/// Number of timestamp bytes carried in the checksum.
pub const TIMESTAMP_LEN: usize = 6;

/// Generate a checksum for the current wall-clock time.
pub fn generate_checksum(machine_id: &str) -> String {
    checksum_at(current_time_millis(), machine_id)
}

/// Generate a checksum for an explicit millisecond timestamp.
pub fn checksum_at(timestamp_ms: u64, machine_id: &str) -> String {
    let encrypted = obfuscate(timestamp_bytes(timestamp_ms), CHECKSUM_SEED);
    format!("{}{}", STANDARD.encode(encrypted), machine_id)
}

/// Low 48 bits of the timestamp, most significant byte first.
pub fn timestamp_bytes(timestamp_ms: u64) -> [u8; TIMESTAMP_LEN] {
    [
        (timestamp_ms >> 40) as u8,
        (timestamp_ms >> 32) as u8,
        (timestamp_ms >> 24) as u8,
        (timestamp_ms >> 16) as u8,
        (timestamp_ms >> 8) as u8,
        timestamp_ms as u8,
    ]
}

/// Rolling XOR with feedback: every output byte becomes the key for the next one.
pub fn obfuscate(mut bytes: [u8; TIMESTAMP_LEN], seed: u8) -> [u8; TIMESTAMP_LEN] {
    let mut acc = seed;
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = (*byte ^ acc).wrapping_add((i % 256) as u8);
        acc = *byte;
    }
    bytes
}

fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
