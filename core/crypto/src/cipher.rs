//! Block cipher engine over the AES family.
//!
//! The engine is polymorphic over a closed set of algorithms selected by
//! string identifier at configuration time. Unknown identifiers are rejected
//! when the configuration is written, never at first use.

use std::fmt;

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256, Block};

use sealstream_common::{Error, Result};

/// Cipher block size in bytes. All supported algorithms share it.
pub const BLOCK_SIZE: usize = 16;

/// Length of the random salt prepended to every encrypted file.
pub const SALT_SIZE: usize = 16;

/// Supported block cipher algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    Aes128,
    Aes192,
    Aes256,
}

impl CipherAlgorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 3] = [Self::Aes128, Self::Aes192, Self::Aes256];

    /// Look up an algorithm by its identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "aes-128" => Some(Self::Aes128),
            "aes-192" => Some(Self::Aes192),
            "aes-256" => Some(Self::Aes256),
            _ => None,
        }
    }

    /// Stable identifier used in configuration and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Self::Aes128 => "aes-128",
            Self::Aes192 => "aes-192",
            Self::Aes256 => "aes-256",
        }
    }

    /// Required key length in bytes.
    pub fn key_size(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Cipher block size in bytes.
    pub fn block_size(self) -> usize {
        BLOCK_SIZE
    }

    /// Salt length in bytes for files produced with this cipher.
    pub fn salt_size(self) -> usize {
        SALT_SIZE
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Initialized block-level encrypt/decrypt engine.
///
/// Operates in place on buffers whose length is a multiple of [`BLOCK_SIZE`];
/// chunking and padding are the caller's concern.
pub enum BlockCipher {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl BlockCipher {
    /// Initialize the engine with a derived key.
    ///
    /// # Errors
    /// - Key length does not match `algorithm.key_size()`
    pub fn new(algorithm: CipherAlgorithm, key: &[u8]) -> Result<Self> {
        if key.len() != algorithm.key_size() {
            return Err(Error::Crypto(format!(
                "Invalid key length for {}: expected {}, got {}",
                algorithm,
                algorithm.key_size(),
                key.len()
            )));
        }

        let engine = match algorithm {
            CipherAlgorithm::Aes128 => Self::Aes128(
                Aes128::new_from_slice(key)
                    .map_err(|e| Error::Crypto(format!("Cipher init failed: {}", e)))?,
            ),
            CipherAlgorithm::Aes192 => Self::Aes192(
                Aes192::new_from_slice(key)
                    .map_err(|e| Error::Crypto(format!("Cipher init failed: {}", e)))?,
            ),
            CipherAlgorithm::Aes256 => Self::Aes256(
                Aes256::new_from_slice(key)
                    .map_err(|e| Error::Crypto(format!("Cipher init failed: {}", e)))?,
            ),
        };
        Ok(engine)
    }

    /// The algorithm this engine was initialized with.
    pub fn algorithm(&self) -> CipherAlgorithm {
        match self {
            Self::Aes128(_) => CipherAlgorithm::Aes128,
            Self::Aes192(_) => CipherAlgorithm::Aes192,
            Self::Aes256(_) => CipherAlgorithm::Aes256,
        }
    }

    /// Encrypt a block-aligned buffer in place.
    ///
    /// # Errors
    /// - Buffer length is not a multiple of the block size
    pub fn encrypt_blocks(&self, data: &mut [u8]) -> Result<()> {
        check_alignment(data)?;
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            let block = Block::from_mut_slice(chunk);
            match self {
                Self::Aes128(c) => c.encrypt_block(block),
                Self::Aes192(c) => c.encrypt_block(block),
                Self::Aes256(c) => c.encrypt_block(block),
            }
        }
        Ok(())
    }

    /// Decrypt a block-aligned buffer in place.
    ///
    /// # Errors
    /// - Buffer length is not a multiple of the block size
    pub fn decrypt_blocks(&self, data: &mut [u8]) -> Result<()> {
        check_alignment(data)?;
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            let block = Block::from_mut_slice(chunk);
            match self {
                Self::Aes128(c) => c.decrypt_block(block),
                Self::Aes192(c) => c.decrypt_block(block),
                Self::Aes256(c) => c.decrypt_block(block),
            }
        }
        Ok(())
    }
}

fn check_alignment(data: &[u8]) -> Result<()> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(Error::Crypto(format!(
            "Buffer length {} is not a multiple of the block size {}",
            data.len(),
            BLOCK_SIZE
        )));
    }
    Ok(())
}
