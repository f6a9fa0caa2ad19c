//! # strongbox
//!
//! Sealed vault records for passwords, notes and files.
//!
//! Every payload is encrypted with AES-256-GCM under its own random key and
//! nonce. A SHA-256 digest of the plaintext is signed with a process-wide
//! RSA-PSS keypair. Opening a record decrypts it, recomputes the digest and
//! verifies the signature; plaintext is released only when all three agree.
//!
//! ## Layers
//!
//! - [`pipeline::Pipeline`]: `seal(plaintext) -> SealedRecord` and
//!   `open(&SealedRecord) -> plaintext`.
//! - [`keys::KeyStore`]: generate-once, load-on-demand signing keypair.
//! - [`vault::Vault`]: owner-scoped passwords, notes and files on top of a
//!   [`store::RecordStore`], with an audit trail.
//!
//! ## Known limitations
//!
//! The per-record key is stored next to its ciphertext and the signing key
//! is stored unencrypted. Confidentiality at rest depends entirely on access
//! control over the record store and the key directory.

pub mod audit;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod entropy;
pub mod error;
pub mod hasher;
pub mod keys;
pub mod password;
pub mod payload;
pub mod pipeline;
pub mod record;
pub mod signer;
pub mod store;
pub mod vault;

pub use config::VaultConfig;
pub use error::{IntegrityFailure, VaultError};
pub use pipeline::Pipeline;
pub use record::SealedRecord;
pub use signer::Verification;
pub use vault::Vault;

/// Seal `plaintext` with a pipeline built from `config`.
///
/// Every call reads and parses both PEM files from `key_dir` (or generates
/// the keypair on a cold start). Callers sealing more than once should
/// build a [`Pipeline`] and reuse it.
pub fn seal(config: &VaultConfig, plaintext: &[u8]) -> Result<SealedRecord, VaultError> {
    Pipeline::from_config(config)?.seal(plaintext)
}

/// Open `record` with a pipeline built from `config`.
///
/// Reloads the keypair from disk on every call, like [`seal`].
pub fn open(config: &VaultConfig, record: &SealedRecord) -> Result<Vec<u8>, VaultError> {
    Pipeline::from_config(config)?.open(record)
}
