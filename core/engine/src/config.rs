//! Cipher configuration and validation.
//!
//! A configuration is owned by the caller and treated as immutable for the
//! duration of one encrypt/decrypt operation. Every setter validates its
//! input against the relevant provider's supported set; on rejection the
//! prior value is left unchanged.

use sealstream_common::{Error, Result, SecretBytes};
use sealstream_crypto::{CipherAlgorithm, HashAlgorithm};

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Configuration for the file cipher.
#[derive(Debug, Clone)]
pub struct CipherConfig {
    key: Option<SecretBytes>,
    iterations: u32,
    cipher: CipherAlgorithm,
    mac_hash: HashAlgorithm,
    kdf_hash: HashAlgorithm,
    compression: bool,
}

impl CipherConfig {
    /// Create a configuration with default algorithms and no key.
    pub fn new() -> Self {
        Self {
            key: None,
            iterations: DEFAULT_ITERATIONS,
            cipher: CipherAlgorithm::Aes256,
            mac_hash: HashAlgorithm::Sha256,
            kdf_hash: HashAlgorithm::Sha256,
            compression: true,
        }
    }

    /// Set the encryption key (password bytes).
    ///
    /// # Errors
    /// - Empty key
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::Config("key cannot be empty".to_string()));
        }
        self.key = Some(SecretBytes::from(key));
        Ok(())
    }

    /// The configured key, if one has been set.
    pub fn key(&self) -> Option<&SecretBytes> {
        self.key.as_ref()
    }

    /// Set the PBKDF2 iteration count.
    ///
    /// # Errors
    /// - Zero iterations
    pub fn set_iterations(&mut self, iterations: u32) -> Result<()> {
        if iterations == 0 {
            return Err(Error::Config("iteration count must be positive".to_string()));
        }
        self.iterations = iterations;
        Ok(())
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Select the cipher algorithm by identifier.
    ///
    /// # Errors
    /// - Identifier not in the cipher engine's supported set
    pub fn set_cipher_algorithm(&mut self, name: &str) -> Result<()> {
        self.cipher = CipherAlgorithm::from_name(name).ok_or_else(|| {
            Error::Config(format!(
                "unsupported cipher algorithm \"{}\"; the cipher engine supports: {}",
                name,
                Self::supported_cipher_algorithms().join(", ")
            ))
        })?;
        Ok(())
    }

    pub fn cipher_algorithm(&self) -> CipherAlgorithm {
        self.cipher
    }

    /// Select the MAC hash algorithm by identifier.
    ///
    /// # Errors
    /// - Identifier not in the hash provider's supported set
    pub fn set_mac_hash(&mut self, name: &str) -> Result<()> {
        self.mac_hash = HashAlgorithm::from_name(name).ok_or_else(|| {
            Error::Config(format!(
                "unsupported MAC hash \"{}\"; the hash provider supports: {}",
                name,
                supported_hashes().join(", ")
            ))
        })?;
        Ok(())
    }

    pub fn mac_hash(&self) -> HashAlgorithm {
        self.mac_hash
    }

    /// Select the PBKDF2 hash algorithm by identifier.
    ///
    /// # Errors
    /// - Identifier not in the hash provider's supported set
    pub fn set_kdf_hash(&mut self, name: &str) -> Result<()> {
        self.kdf_hash = HashAlgorithm::from_name(name).ok_or_else(|| {
            Error::Config(format!(
                "unsupported key-derivation hash \"{}\"; the hash provider supports: {}",
                name,
                supported_hashes().join(", ")
            ))
        })?;
        Ok(())
    }

    pub fn kdf_hash(&self) -> HashAlgorithm {
        self.kdf_hash
    }

    /// Enable or disable the compression stage (enabled by default).
    pub fn set_compression(&mut self, enabled: bool) {
        self.compression = enabled;
    }

    pub fn compression(&self) -> bool {
        self.compression
    }

    /// Identifiers of every cipher algorithm the engine supports.
    pub fn supported_cipher_algorithms() -> Vec<&'static str> {
        CipherAlgorithm::ALL.iter().map(|a| a.name()).collect()
    }
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn supported_hashes() -> Vec<&'static str> {
    HashAlgorithm::ALL.iter().map(|h| h.name()).collect()
}
