//! Content checksums.
//!
//! The checksum is the only content identity used across the engine: two
//! scripts are the same migration iff their checksums are equal.

/// Lowercase hex MD5 of the raw bytes of `content`.
pub fn checksum(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}
