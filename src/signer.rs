//! Digest signing with the process keypair.
//!
//! RSA-PSS over SHA-256 with MGF1-SHA-256 and the longest salt the modulus
//! allows. The signer never accepts a key from its caller: it always goes
//! through the [`KeyStore`] it was built with.

use std::sync::Arc;

use rand::rngs::OsRng;
use rsa::pss::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use sha2::Sha256;

use crate::error::VaultError;
use crate::keys::KeyStore;

/// SHA-256 output length in bytes.
const DIGEST_LEN: usize = 32;

/// Outcome of a signature check.
///
/// Malformed signatures, wrong keys and bad padding all land on
/// `Unverified`; there is no separate "verification raised" path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Unverified,
}

impl Verification {
    pub fn is_verified(self) -> bool {
        self == Self::Verified
    }
}

#[derive(Debug, Clone)]
pub struct Signer {
    keys: Arc<KeyStore>,
}

impl Signer {
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys }
    }

    /// Sign `message` with the private half of the process keypair.
    ///
    /// PSS is randomised, so signing the same message twice yields two
    /// different signatures that both verify.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, VaultError> {
        let pair = self.keys.keypair()?;
        let private = pair.private_key();
        let salt_len = max_salt_len(private);

        let signing_key = SigningKey::<Sha256>::new_with_salt_len(private.clone(), salt_len);
        let signature = signing_key
            .try_sign_with_rng(&mut OsRng, message)
            .map_err(|_| VaultError::SigningFailure)?;
        Ok(signature.to_vec())
    }

    /// Check `signature` over `message` against the public half of the
    /// process keypair.
    ///
    /// Errors only when the keypair itself cannot be loaded.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<Verification, VaultError> {
        let pair = self.keys.keypair()?;
        Ok(verify_with(pair.public_key(), message, signature))
    }
}

/// Check a signature against an explicit public key.
pub fn verify_with(public: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Verification {
    let Ok(signature) = Signature::try_from(signature) else {
        return Verification::Unverified;
    };
    let verifying_key = VerifyingKey::<Sha256>::new_with_salt_len(public.clone(), max_salt_len(public));
    match verifying_key.verify(message, &signature) {
        Ok(()) => Verification::Verified,
        Err(_) => Verification::Unverified,
    }
}

/// emLen - hLen - 2, with emLen = ceil((modBits - 1) / 8).
fn max_salt_len(key: &impl PublicKeyParts) -> usize {
    let em_bits = key.n().bits().saturating_sub(1);
    let em_len = (em_bits + 7) / 8;
    em_len.saturating_sub(DIGEST_LEN + 2)
}

#[cfg(test)]
mod tests {
    use rsa::RsaPrivateKey;

    use super::*;
    use crate::keys::tests::{fixture_pems, seeded_key_dir};

    fn signer() -> (tempfile::TempDir, Signer) {
        let (dir, config) = seeded_key_dir();
        (dir, Signer::new(Arc::new(KeyStore::new(&config))))
    }

    #[test]
    fn salt_is_maximal_for_2048_bit_modulus() {
        use rsa::pkcs8::DecodePublicKey;
        let public = RsaPublicKey::from_public_key_pem(&fixture_pems().1).unwrap();
        assert_eq!(max_salt_len(&public), 256 - 32 - 2);
    }

    #[test]
    fn sign_then_verify() {
        let (_dir, signer) = signer();
        let signature = signer.sign(b"digest-text").unwrap();
        assert_eq!(signature.len(), 256);
        assert_eq!(
            signer.verify(b"digest-text", &signature).unwrap(),
            Verification::Verified
        );
    }

    #[test]
    fn signatures_are_randomised() {
        let (_dir, signer) = signer();
        let a = signer.sign(b"same").unwrap();
        let b = signer.sign(b"same").unwrap();
        assert_ne!(a, b);
        assert!(signer.verify(b"same", &a).unwrap().is_verified());
        assert!(signer.verify(b"same", &b).unwrap().is_verified());
    }

    #[test]
    fn different_message_is_unverified() {
        let (_dir, signer) = signer();
        let signature = signer.sign(b"one").unwrap();
        assert_eq!(signer.verify(b"two", &signature).unwrap(), Verification::Unverified);
    }

    #[test]
    fn malformed_signature_is_unverified() {
        let (_dir, signer) = signer();
        assert_eq!(signer.verify(b"x", b"").unwrap(), Verification::Unverified);
        assert_eq!(signer.verify(b"x", &[0u8; 17]).unwrap(), Verification::Unverified);
        assert_eq!(signer.verify(b"x", &[0xFFu8; 256]).unwrap(), Verification::Unverified);
    }

    #[test]
    fn foreign_key_is_unverified() {
        let (_dir, signer) = signer();
        let signature = signer.sign(b"msg").unwrap();

        let other = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let other_public = RsaPublicKey::from(&other);
        assert_eq!(
            verify_with(&other_public, b"msg", &signature),
            Verification::Unverified
        );
    }
}
