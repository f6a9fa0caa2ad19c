//! Symmetric authenticated encryption.
//!
//! This module and `hasher` are the only places that touch `ring::aead` and
//! `ring::digest`. Everything else encrypts and decrypts through [`Cipher`].
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption, no associated data)
//! - **Nonce**: 96-bit (12 bytes), drawn fresh per record from the injected
//!   [`EntropySource`]
//! - **Key size**: 256 bits (32 bytes), one per record

use std::sync::Arc;

use ring::aead::{self, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};

use crate::entropy::{EntropySource, SystemEntropy};
use crate::error::VaultError;
use crate::keys::RecordKey;

/// The AEAD algorithm used for every record.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Size of a record key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Size of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// AES-256-GCM with an injected randomness source for keys and nonces.
#[derive(Clone)]
pub struct Cipher {
    entropy: Arc<dyn EntropySource>,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Default for Cipher {
    fn default() -> Self {
        Self::new(Arc::new(SystemEntropy::new()))
    }
}

impl Cipher {
    pub fn new(entropy: Arc<dyn EntropySource>) -> Self {
        Self { entropy }
    }

    /// Generate a fresh 256-bit record key.
    pub fn generate_key(&self) -> Result<RecordKey, VaultError> {
        let mut bytes = [0u8; KEY_LEN];
        self.entropy.fill(&mut bytes)?;
        Ok(RecordKey::from_bytes(bytes))
    }

    /// Generate a fresh 96-bit nonce.
    pub fn generate_nonce(&self) -> Result<[u8; NONCE_LEN], VaultError> {
        let mut nonce = [0u8; NONCE_LEN];
        self.entropy.fill(&mut nonce)?;
        Ok(nonce)
    }

    /// Encrypt `plaintext` under `key`.
    ///
    /// When `nonce` is `None` a fresh one is generated. Returns the
    /// ciphertext with the GCM tag appended, and the nonce that was used.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        key: &RecordKey,
        nonce: Option<[u8; NONCE_LEN]>,
    ) -> Result<(Vec<u8>, [u8; NONCE_LEN]), VaultError> {
        let nonce = match nonce {
            Some(n) => n,
            None => self.generate_nonce()?,
        };
        let sealing_key = less_safe_key(key)?;

        let mut output = Vec::with_capacity(plaintext.len() + ALGORITHM.tag_len());
        output.extend_from_slice(plaintext);
        sealing_key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce),
                aead::Aad::empty(),
                &mut output,
            )
            .map_err(|_| VaultError::EncryptionFailure)?;

        Ok((output, nonce))
    }

    /// Decrypt `ciphertext` (tag included) under `key` and `nonce`.
    ///
    /// Any tag mismatch yields [`VaultError::Authentication`] and no partial
    /// plaintext.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &RecordKey,
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>, VaultError> {
        if ciphertext.len() < TAG_LEN {
            return Err(VaultError::Authentication);
        }
        let opening_key = less_safe_key(key)?;

        let mut payload = ciphertext.to_vec();
        let plaintext = opening_key
            .open_in_place(
                Nonce::assume_unique_for_key(*nonce),
                aead::Aad::empty(),
                &mut payload,
            )
            .map_err(|_| VaultError::Authentication)?;

        Ok(plaintext.to_vec())
    }
}

fn less_safe_key(key: &RecordKey) -> Result<LessSafeKey, VaultError> {
    let unbound = UnboundKey::new(ALGORITHM, key.as_bytes()).map_err(|_| VaultError::InvalidKey)?;
    Ok(LessSafeKey::new(unbound))
}

/// Convert a decoded nonce field into its fixed-size form.
pub fn nonce_from_slice(bytes: &[u8]) -> Result<[u8; NONCE_LEN], VaultError> {
    bytes.try_into().map_err(|_| VaultError::InvalidNonce)
}
