//! Shared fixtures. RSA key generation is slow, so each test binary
//! generates at most two keypairs and copies their PEM text into fresh
//! temp directories.

#![allow(dead_code)]

use std::fs;
use std::sync::OnceLock;

use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use strongbox::{Pipeline, Vault, VaultConfig};
use tempfile::TempDir;

pub struct Pems {
    pub private: String,
    pub public: String,
}

fn generate() -> Pems {
    let private = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
    let public = RsaPublicKey::from(&private);
    Pems {
        private: private.to_pkcs8_pem(LineEnding::LF).unwrap().to_string(),
        public: public.to_public_key_pem(LineEnding::LF).unwrap(),
    }
}

/// The keypair most tests sign with.
pub fn primary() -> &'static Pems {
    static PEMS: OnceLock<Pems> = OnceLock::new();
    PEMS.get_or_init(generate)
}

/// An unrelated keypair, for swapping in as an impostor.
pub fn impostor() -> &'static Pems {
    static PEMS: OnceLock<Pems> = OnceLock::new();
    PEMS.get_or_init(generate)
}

/// A temp deployment root whose key directory holds `pems`.
pub fn key_dir_with(pems: &Pems) -> (TempDir, VaultConfig) {
    let root = tempfile::tempdir().unwrap();
    let config = VaultConfig::with_key_dir(root.path().join("keys"));
    fs::create_dir_all(&config.key_dir).unwrap();
    fs::write(config.private_key_path(), &pems.private).unwrap();
    fs::write(config.public_key_path(), &pems.public).unwrap();
    (root, config)
}

pub fn pipeline() -> (TempDir, VaultConfig, Pipeline) {
    let (root, config) = key_dir_with(primary());
    let pipeline = Pipeline::from_config(&config).unwrap();
    (root, config, pipeline)
}

pub fn vault() -> (TempDir, Vault) {
    let (root, config) = key_dir_with(primary());
    (root, Vault::from_config(&config).unwrap())
}
