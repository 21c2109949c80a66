//! Per-operation cipher session.
//!
//! A session binds the derived cipher key, MAC key, and salt for exactly one
//! encrypt or decrypt call. Encryption draws a fresh random salt from the
//! entropy source; decryption takes the salt read from the input's leading
//! bytes. Key material is zeroized when the session is dropped.

use zeroize::Zeroizing;

use sealstream_common::{Error, Result};
use sealstream_crypto::{derive_key_material, BlockCipher, EntropySource, HashAlgorithm, StreamMac};

use crate::config::CipherConfig;

/// Derived key material and parameters for one operation.
pub struct CipherSession {
    cipher: BlockCipher,
    mac_key: Zeroizing<Vec<u8>>,
    mac_hash: HashAlgorithm,
    salt: Vec<u8>,
}

impl CipherSession {
    /// Create a session for encryption with a freshly drawn salt.
    pub fn for_encryption(
        config: &CipherConfig,
        entropy: &mut dyn EntropySource,
    ) -> Result<Self> {
        let mut salt = vec![0u8; config.cipher_algorithm().salt_size()];
        entropy.fill(&mut salt);
        Self::derive(config, salt)
    }

    /// Create a session for decryption from the salt read off the input.
    ///
    /// # Errors
    /// - Salt length does not match the configured cipher's salt size
    pub fn for_decryption(config: &CipherConfig, salt: Vec<u8>) -> Result<Self> {
        if salt.len() != config.cipher_algorithm().salt_size() {
            return Err(Error::Crypto(format!(
                "Invalid salt length: expected {}, got {}",
                config.cipher_algorithm().salt_size(),
                salt.len()
            )));
        }
        Self::derive(config, salt)
    }

    fn derive(config: &CipherConfig, salt: Vec<u8>) -> Result<Self> {
        let key = config
            .key()
            .ok_or_else(|| Error::Config("no key specified".to_string()))?;

        let algorithm = config.cipher_algorithm();
        let mac_hash = config.mac_hash();
        let total = algorithm.key_size() + mac_hash.output_size();

        let material = derive_key_material(
            key.as_bytes(),
            &salt,
            config.iterations(),
            config.kdf_hash(),
            total,
        )?;
        let (cipher_key, mac_key) = material.split_at(algorithm.key_size());

        Ok(Self {
            cipher: BlockCipher::new(algorithm, cipher_key)?,
            mac_key: Zeroizing::new(mac_key.to_vec()),
            mac_hash,
            salt,
        })
    }

    /// The initialized block cipher engine.
    pub fn cipher(&self) -> &BlockCipher {
        &self.cipher
    }

    /// The salt bound to this session.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn block_size(&self) -> usize {
        self.cipher.algorithm().block_size()
    }

    pub fn salt_size(&self) -> usize {
        self.cipher.algorithm().salt_size()
    }

    /// Length of the trailing authentication tag.
    pub fn tag_size(&self) -> usize {
        self.mac_hash.output_size()
    }

    /// Start a MAC keyed for this session, already fed with the salt.
    ///
    /// The tag always covers salt followed by ciphertext, never plaintext.
    pub fn start_mac(&self) -> Result<StreamMac> {
        let mut mac = StreamMac::new(self.mac_hash, &self.mac_key)?;
        mac.update(&self.salt);
        Ok(mac)
    }
}
