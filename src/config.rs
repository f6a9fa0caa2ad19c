//! Deployment configuration.
//!
//! Key material lives at a fixed location relative to the deployment root.
//! Values come from defaults, an optional JSON file, then environment
//! overrides, in that order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VaultError;

/// Smallest RSA modulus accepted for the signing keypair.
pub const MIN_RSA_BITS: usize = 2048;

/// Overrides `key_dir`.
pub const ENV_KEY_DIR: &str = "STRONGBOX_KEY_DIR";
/// Overrides `rsa_bits`.
pub const ENV_RSA_BITS: &str = "STRONGBOX_RSA_BITS";
/// Overrides `audit_log`.
pub const ENV_AUDIT_LOG: &str = "STRONGBOX_AUDIT_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory holding the signing keypair.
    pub key_dir: PathBuf,
    /// File name of the PKCS#8 PEM private key inside `key_dir`.
    pub private_key_file: String,
    /// File name of the SPKI PEM public key inside `key_dir`.
    pub public_key_file: String,
    /// Modulus size used when a keypair has to be generated.
    pub rsa_bits: usize,
    /// Optional JSON-lines file receiving a copy of every audit record.
    pub audit_log: Option<PathBuf>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_dir: PathBuf::from("keys"),
            private_key_file: "private_key.pem".to_string(),
            public_key_file: "public_key.pem".to_string(),
            rsa_bits: MIN_RSA_BITS,
            audit_log: None,
        }
    }
}

impl VaultConfig {
    /// Defaults with the keypair stored under `dir`.
    pub fn with_key_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            key_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, VaultError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| VaultError::Config(format!("failed to parse {}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded vault config");
        config.validate()?;
        Ok(config)
    }

    /// Apply `STRONGBOX_*` environment overrides.
    pub fn apply_env(self) -> Result<Self, VaultError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, VaultError> {
        if let Some(dir) = lookup(ENV_KEY_DIR) {
            self.key_dir = PathBuf::from(dir);
        }
        if let Some(bits) = lookup(ENV_RSA_BITS) {
            self.rsa_bits = bits
                .trim()
                .parse()
                .map_err(|_| VaultError::Config(format!("{ENV_RSA_BITS} is not a number: {bits}")))?;
        }
        if let Some(path) = lookup(ENV_AUDIT_LOG) {
            self.audit_log = Some(PathBuf::from(path));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        if self.rsa_bits < MIN_RSA_BITS {
            return Err(VaultError::Config(format!(
                "rsa_bits must be at least {MIN_RSA_BITS}, got {}",
                self.rsa_bits
            )));
        }
        if self.private_key_file.is_empty() || self.public_key_file.is_empty() {
            return Err(VaultError::Config("key file names must not be empty".to_string()));
        }
        if self.private_key_file == self.public_key_file {
            return Err(VaultError::Config(
                "private and public key files must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.key_dir.join(&self.private_key_file)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.key_dir.join(&self.public_key_file)
    }
}
