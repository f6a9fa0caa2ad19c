//! Error types for strongbox.
//!
//! Every variant is a distinct failure mode of the sealing pipeline or the
//! layers around it. Messages signal *what* failed without revealing
//! cryptographic state. Callers facing end users should go through
//! [`VaultError::is_integrity_fault`] and report a single opaque failure.

use std::path::PathBuf;

/// Which verification step rejected a sealed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityFailure {
    /// The digest of the decrypted plaintext differs from the stored digest.
    #[error("hash mismatch")]
    HashMismatch,

    /// The stored digest's signature does not verify under the current
    /// public key.
    #[error("signature invalid")]
    SignatureInvalid,
}

/// The single error type for all strongbox operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// A symmetric key had the wrong length.
    #[error("invalid key")]
    InvalidKey,

    /// A nonce had the wrong length.
    #[error("invalid nonce")]
    InvalidNonce,

    /// Encryption failed. The underlying `ring` operation returned an error.
    #[error("encryption failed")]
    EncryptionFailure,

    /// The AEAD tag did not verify: wrong key, wrong nonce, or tampered
    /// ciphertext. No plaintext is released.
    #[error("authentication failed")]
    Authentication,

    /// The secure random source failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// Decryption succeeded but a later verification step rejected the record.
    #[error("integrity check failed: {0}")]
    Integrity(IntegrityFailure),

    /// A stored field is not valid base64.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(#[from] base64::DecodeError),

    /// Reading or writing persisted key material failed.
    #[error("key store I/O error at {path}: {source}")]
    KeyStoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted key material could not be parsed or produced.
    #[error("key material error: {0}")]
    KeyMaterial(String),

    /// The RSA signing operation failed.
    #[error("signing failed")]
    SigningFailure,

    /// No item with this id is visible to the caller.
    #[error("item not found: {0}")]
    ItemNotFound(u64),

    /// The file's content type cannot be previewed inline.
    #[error("preview not supported for content type: {0}")]
    PreviewUnsupported(String),

    /// Opaque failure reported to callers once an integrity fault has been
    /// logged. Deliberately carries no detail.
    #[error("integrity or authenticity check failed")]
    IntegrityCheckFailed,

    /// A record payload could not be (de)serialized.
    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Configuration is invalid or unreadable.
    #[error("configuration error: {0}")]
    Config(String),

    /// An internal lock was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl VaultError {
    /// True for faults in stored record data, as opposed to faults in the
    /// environment (I/O, configuration, randomness).
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey
                | Self::InvalidNonce
                | Self::Authentication
                | Self::Integrity(_)
                | Self::MalformedEncoding(_)
                | Self::IntegrityCheckFailed
        )
    }

    /// Short machine-readable name of the fault, used in logs and audit.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidKey => "invalid_key",
            Self::InvalidNonce => "invalid_nonce",
            Self::EncryptionFailure => "encryption_failure",
            Self::Authentication => "authentication",
            Self::RandomnessFailure => "randomness_failure",
            Self::Integrity(IntegrityFailure::HashMismatch) => "hash_mismatch",
            Self::Integrity(IntegrityFailure::SignatureInvalid) => "signature_invalid",
            Self::MalformedEncoding(_) => "malformed_encoding",
            Self::KeyStoreIo { .. } => "key_store_io",
            Self::KeyMaterial(_) => "key_material",
            Self::SigningFailure => "signing_failure",
            Self::ItemNotFound(_) => "item_not_found",
            Self::PreviewUnsupported(_) => "preview_unsupported",
            Self::IntegrityCheckFailed => "integrity_check_failed",
            Self::Payload(_) => "payload",
            Self::Config(_) => "config",
            Self::LockPoisoned(_) => "lock_poisoned",
        }
    }
}

impl From<IntegrityFailure> for VaultError {
    fn from(failure: IntegrityFailure) -> Self {
        Self::Integrity(failure)
    }
}
