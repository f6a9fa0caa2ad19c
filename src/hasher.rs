//! Content hashing.
//!
//! SHA-256 over plaintext, rendered as 64 lowercase hex characters. The
//! textual form is what gets signed, so it must stay canonical.

use ring::digest::{self, SHA256};

/// Length of a rendered digest in characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// Compute the hex-encoded SHA-256 digest of `data`.
pub fn digest(data: &[u8]) -> String {
    hex::encode(digest::digest(&SHA256, data))
}

/// Recompute the digest of `data` and compare it with `expected`.
///
/// This guards integrity, not secrecy, so a plain comparison is sufficient.
pub fn verify(data: &[u8], expected: &str) -> bool {
    digest(data) == expected
}
