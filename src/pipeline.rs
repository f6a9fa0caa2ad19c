//! Seal and open: the full integrity contract for one record.
//!
//! Sealing runs bottom-up:
//!
//! ```text
//! plaintext ──AES-256-GCM(fresh key, fresh nonce)──▶ ciphertext
//! plaintext ──SHA-256──▶ digest ──RSA-PSS──▶ signature
//! ```
//!
//! Opening runs in a fixed order: decode, decrypt, re-hash, verify the
//! signature. Plaintext is released only if every step passes. There is no
//! path that skips a check.

use std::sync::Arc;

use tracing::debug;

use crate::codec;
use crate::config::VaultConfig;
use crate::crypto::{self, Cipher};
use crate::error::{IntegrityFailure, VaultError};
use crate::hasher;
use crate::keys::{KeyStore, RecordKey};
use crate::record::SealedRecord;
use crate::signer::{Signer, Verification};

/// Stateless orchestration of cipher, hasher, signer and codec.
///
/// Safe to share across threads. The only shared state is the signing
/// keypair inside the [`KeyStore`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    cipher: Cipher,
    signer: Signer,
}

impl Pipeline {
    pub fn new(cipher: Cipher, signer: Signer) -> Self {
        Self { cipher, signer }
    }

    /// A pipeline with system entropy and the keypair described by `config`.
    pub fn from_config(config: &VaultConfig) -> Result<Self, VaultError> {
        config.validate()?;
        let keys = Arc::new(KeyStore::new(config));
        Ok(Self::new(Cipher::default(), Signer::new(keys)))
    }

    /// Encrypt `plaintext` under a fresh key and nonce and anchor it with a
    /// signed digest.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedRecord, VaultError> {
        let key = self.cipher.generate_key()?;
        let nonce = self.cipher.generate_nonce()?;
        let (ciphertext, nonce) = self.cipher.encrypt(plaintext, &key, Some(nonce))?;

        // Hash the caller's bytes, not anything derived from the cipher.
        let content_digest_hex = hasher::digest(plaintext);
        let signature = self.signer.sign(content_digest_hex.as_bytes())?;

        debug!(len = plaintext.len(), "sealed record");
        Ok(SealedRecord {
            ciphertext_b64: codec::encode(&ciphertext),
            key_b64: codec::encode(key.as_bytes()),
            nonce_b64: codec::encode(&nonce),
            content_digest_hex,
            signature_b64: codec::encode(&signature),
        })
    }

    /// Decrypt `record` and verify it end to end.
    ///
    /// Failure order: malformed fields, then AEAD authentication, then
    /// [`IntegrityFailure::HashMismatch`], then
    /// [`IntegrityFailure::SignatureInvalid`].
    pub fn open(&self, record: &SealedRecord) -> Result<Vec<u8>, VaultError> {
        let ciphertext = codec::decode(&record.ciphertext_b64)?;
        let key = RecordKey::from_slice(&codec::decode(&record.key_b64)?)?;
        let nonce = crypto::nonce_from_slice(&codec::decode(&record.nonce_b64)?)?;
        let signature = codec::decode(&record.signature_b64)?;

        let plaintext = self.cipher.decrypt(&ciphertext, &key, &nonce)?;

        if !hasher::verify(&plaintext, &record.content_digest_hex) {
            return Err(IntegrityFailure::HashMismatch.into());
        }

        match self
            .signer
            .verify(record.content_digest_hex.as_bytes(), &signature)?
        {
            Verification::Verified => {}
            Verification::Unverified => return Err(IntegrityFailure::SignatureInvalid.into()),
        }

        debug!(len = plaintext.len(), "opened record");
        Ok(plaintext)
    }
}
