//! Key ownership and lifecycle.
//!
//! This module owns two kinds of key material:
//! 1. [`RecordKey`]: the per-record AES-256 key. Not `Clone`, zeroised on
//!    drop. A new one is drawn for every seal.
//! 2. [`KeyStore`]: the process-wide RSA signing keypair. Generated once,
//!    persisted as PEM, loaded on demand and cached for the lifetime of the
//!    store.
//!
//! ## Persisted layout
//!
//! ```text
//! {key_dir}/private_key.pem   PKCS#8, unencrypted
//! {key_dir}/public_key.pem    SubjectPublicKeyInfo
//! ```
//!
//! The private key is written without a passphrase. Anyone who can read
//! `key_dir` can forge signatures.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::VaultConfig;
use crate::crypto::KEY_LEN;
use crate::error::VaultError;

const PRIVATE_MODE: u32 = 0o600;
const PUBLIC_MODE: u32 = 0o644;

// ---------------------------------------------------------------------------
// Record key
// ---------------------------------------------------------------------------

/// A symmetric key bound to exactly one sealed record.
///
/// - Not `Clone`.
/// - Zeroised on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RecordKey {
    bytes: [u8; KEY_LEN],
}

impl RecordKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Rebuild a key from a decoded storage field.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VaultError> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| VaultError::InvalidKey)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RecordKey(..)")
    }
}

// ---------------------------------------------------------------------------
// Signing keypair
// ---------------------------------------------------------------------------

/// The two halves of the signing identity, as loaded from disk.
///
/// The public half is read from its own file rather than derived from the
/// private key, so a replaced public key file is observed as-is.
#[derive(Debug, Clone)]
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl KeyPair {
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }
}

/// Generate-once, load-on-demand owner of the signing keypair.
///
/// Within one store, the check-generate-persist sequence runs under a mutex
/// and the result is cached. Across stores and processes sharing `key_dir`,
/// the private key is published with a no-clobber link: the first writer
/// wins and every other writer discards its pair and loads the winner's.
#[derive(Debug)]
pub struct KeyStore {
    private_path: PathBuf,
    public_path: PathBuf,
    bits: usize,
    loaded: Mutex<Option<Arc<KeyPair>>>,
}

impl KeyStore {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            private_path: config.private_key_path(),
            public_path: config.public_key_path(),
            bits: config.rsa_bits,
            loaded: Mutex::new(None),
        }
    }

    /// The private half of the process keypair, creating the pair if needed.
    pub fn load_or_create_private_key(&self) -> Result<RsaPrivateKey, VaultError> {
        Ok(self.keypair()?.private.clone())
    }

    /// The public half of the process keypair, creating the pair if needed.
    pub fn load_or_create_public_key(&self) -> Result<RsaPublicKey, VaultError> {
        Ok(self.keypair()?.public.clone())
    }

    /// The cached keypair. The first call loads or generates it; every later
    /// call returns the same pair.
    pub fn keypair(&self) -> Result<Arc<KeyPair>, VaultError> {
        let mut slot = self
            .loaded
            .lock()
            .map_err(|_| VaultError::LockPoisoned("key store"))?;
        if let Some(pair) = slot.as_ref() {
            return Ok(Arc::clone(pair));
        }

        let pair = Arc::new(self.load_or_generate()?);
        *slot = Some(Arc::clone(&pair));
        Ok(pair)
    }

    fn load_or_generate(&self) -> Result<KeyPair, VaultError> {
        // The public key is published after the private key, so it is
        // checked first: seeing it implies the private key is in place.
        let public_exists = self.public_path.exists();
        let private_exists = self.private_path.exists();
        match (private_exists, public_exists) {
            (true, _) => self.load_existing(),
            (false, true) => Err(VaultError::KeyMaterial(format!(
                "public key {} exists without private key {}",
                self.public_path.display(),
                self.private_path.display()
            ))),
            (false, false) => self.generate(),
        }
    }

    fn load_existing(&self) -> Result<KeyPair, VaultError> {
        let private = self.read_private()?;
        if self.public_path.exists() {
            let public = self.read_public()?;
            info!(path = %self.private_path.display(), "loaded signing keypair");
            return Ok(KeyPair { private, public });
        }

        // Either an interrupted first run or a winner that has not yet
        // published its public half. Both rewrite identical PEM text.
        let public = RsaPublicKey::from(&private);
        self.write_public(&public)?;
        warn!(path = %self.public_path.display(), "public key was missing, rewrote it from private key");
        Ok(KeyPair { private, public })
    }

    fn generate(&self) -> Result<KeyPair, VaultError> {
        debug!(bits = self.bits, "generating signing keypair");
        let private = RsaPrivateKey::new(&mut OsRng, self.bits)
            .map_err(|e| VaultError::KeyMaterial(format!("key generation failed: {e}")))?;
        let public = RsaPublicKey::from(&private);

        let pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| VaultError::KeyMaterial(format!("private key encoding failed: {e}")))?;
        let staged = stage(&self.private_path, pem.as_bytes(), PRIVATE_MODE)?;

        // Private half first: a crash before the public half is written is
        // recoverable, see `load_existing`.
        match staged.persist_noclobber(&self.private_path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                info!(
                    path = %self.private_path.display(),
                    "another writer published a keypair first, loading it"
                );
                return self.load_existing();
            }
            Err(e) => return Err(io_error(&self.private_path)(e.error)),
        }
        self.write_public(&public)?;

        info!(
            bits = self.bits,
            path = %self.private_path.display(),
            "generated and persisted signing keypair"
        );
        Ok(KeyPair { private, public })
    }

    fn read_private(&self) -> Result<RsaPrivateKey, VaultError> {
        let pem = Zeroizing::new(read_to_string(&self.private_path)?);
        RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|e| {
            VaultError::KeyMaterial(format!(
                "unreadable private key {}: {e}",
                self.private_path.display()
            ))
        })
    }

    fn read_public(&self) -> Result<RsaPublicKey, VaultError> {
        let pem = read_to_string(&self.public_path)?;
        RsaPublicKey::from_public_key_pem(&pem).map_err(|e| {
            VaultError::KeyMaterial(format!(
                "unreadable public key {}: {e}",
                self.public_path.display()
            ))
        })
    }

    fn write_public(&self, key: &RsaPublicKey) -> Result<(), VaultError> {
        let pem = key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| VaultError::KeyMaterial(format!("public key encoding failed: {e}")))?;
        stage(&self.public_path, pem.as_bytes(), PUBLIC_MODE)?
            .persist(&self.public_path)
            .map_err(|e| io_error(&self.public_path)(e.error))?;
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> VaultError + '_ {
    move |source| VaultError::KeyStoreIo {
        path: path.to_path_buf(),
        source,
    }
}

fn read_to_string(path: &Path) -> Result<String, VaultError> {
    fs::read_to_string(path).map_err(io_error(path))
}

/// Write `contents` to a uniquely named, synced temp file beside `path`.
/// The caller publishes it with a rename or a no-clobber link, so readers
/// never see a half-written key.
fn stage(path: &Path, contents: &[u8], mode: u32) -> Result<NamedTempFile, VaultError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let mut staged = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(io_error(dir))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    staged.write_all(contents).map_err(io_error(dir))?;
    staged.as_file().sync_all().map_err(io_error(dir))?;
    Ok(staged)
}
