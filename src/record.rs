//! The stored form of a sealed payload.

use serde::{Deserialize, Serialize};

/// Everything needed to reopen and verify one vault entry, in text-safe
/// form.
///
/// The record key travels with the ciphertext. Encryption at rest is
/// therefore only as strong as access control on wherever these fields are
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    /// AES-256-GCM output with the tag appended, base64.
    pub ciphertext_b64: String,
    /// The 32-byte record key, base64.
    pub key_b64: String,
    /// The 12-byte nonce, base64.
    pub nonce_b64: String,
    /// SHA-256 of the plaintext as 64 lowercase hex characters.
    pub content_digest_hex: String,
    /// RSA-PSS signature over the bytes of `content_digest_hex`, base64.
    pub signature_b64: String,
}
