//! File encryption facade.
//!
//! Validates configuration and paths, drives the streaming pipeline, and
//! enforces the commit-or-discard contract: output appears at the requested
//! path only after the operation has fully succeeded, which for decryption
//! means after the authentication tag has verified.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use sealstream_common::{Error, Result};
use sealstream_crypto::{EntropySource, OsEntropy};

use crate::config::CipherConfig;
use crate::pipeline::{decrypt_stream, encrypt_stream};
use crate::session::CipherSession;

/// Outcome of a decryption operation.
///
/// Authentication failure is an expected runtime condition (tampering,
/// corruption, wrong key), not an error: callers must handle it explicitly
/// instead of relying on error-catching.
#[must_use = "authentication failure must be handled"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// Tag verified; plaintext was committed to the requested path.
    Verified,
    /// Tag mismatch, corruption, or wrong key; no output was produced.
    AuthFailed,
}

impl DecryptOutcome {
    pub fn is_verified(self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Password-based authenticated file encryption.
///
/// One facade per concurrent operation: the methods take `&mut self`, so the
/// configuration cannot be changed while an operation is in flight.
pub struct FileCipher {
    config: CipherConfig,
    entropy: Box<dyn EntropySource>,
}

impl FileCipher {
    /// Create a facade with default configuration and OS entropy.
    pub fn new() -> Self {
        Self::with_entropy(Box::new(OsEntropy))
    }

    /// Create a facade with an explicit entropy source.
    pub fn with_entropy(entropy: Box<dyn EntropySource>) -> Self {
        Self {
            config: CipherConfig::new(),
            entropy,
        }
    }

    /// The current configuration.
    pub fn config(&self) -> &CipherConfig {
        &self.config
    }

    /// Set the encryption key (password bytes).
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        self.config.set_key(key)
    }

    /// Set the PBKDF2 iteration count.
    pub fn set_iterations(&mut self, iterations: u32) -> Result<()> {
        self.config.set_iterations(iterations)
    }

    /// Select the cipher algorithm by identifier.
    pub fn set_cipher_algorithm(&mut self, name: &str) -> Result<()> {
        self.config.set_cipher_algorithm(name)
    }

    /// Select the MAC hash algorithm by identifier.
    pub fn set_mac_hash(&mut self, name: &str) -> Result<()> {
        self.config.set_mac_hash(name)
    }

    /// Select the PBKDF2 hash algorithm by identifier.
    pub fn set_kdf_hash(&mut self, name: &str) -> Result<()> {
        self.config.set_kdf_hash(name)
    }

    /// Enable or disable the compression stage (enabled by default).
    pub fn set_compression(&mut self, enabled: bool) {
        self.config.set_compression(enabled)
    }

    /// Identifiers of every cipher algorithm the engine supports.
    pub fn supported_cipher_algorithms() -> Vec<&'static str> {
        CipherConfig::supported_cipher_algorithms()
    }

    /// Encrypt `input` into a new file at `output`.
    ///
    /// # Errors
    /// - No key configured ("no key specified for encryption")
    /// - `input` cannot be opened for reading
    /// - `output` already exists; the operation never overwrites
    /// - I/O failure mid-stream (the partial output is discarded)
    pub fn encrypt(&mut self, input: &Path, output: &Path) -> Result<()> {
        let input_file = self.validate(input, output, "encryption")?;
        let compress = self.config.compression();

        debug!(
            input = %input.display(),
            output = %output.display(),
            algorithm = %self.config.cipher_algorithm(),
            compress,
            "encrypting file"
        );

        let session = CipherSession::for_encryption(&self.config, &mut *self.entropy)?;
        let mut tmp = NamedTempFile::new_in(parent_dir(output))?;

        let written = {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let written = encrypt_stream(&session, BufReader::new(input_file), &mut writer, compress)?;
            writer.flush()?;
            written
        };

        tmp.persist(output).map_err(|e| Error::Io(e.error))?;

        info!(
            input = %input.display(),
            output = %output.display(),
            bytes = written,
            "file encrypted"
        );
        Ok(())
    }

    /// Decrypt `input` into a new file at `output`, verifying the tag.
    ///
    /// Plaintext is staged in a provisional file and committed to `output`
    /// only after the trailing tag matches; on authentication failure the
    /// provisional file is discarded and `output` is guaranteed absent.
    ///
    /// # Errors
    /// - No key configured ("no key specified for decryption")
    /// - `input` cannot be opened for reading
    /// - `output` already exists; the operation never overwrites
    /// - I/O failure mid-stream (the provisional output is discarded)
    pub fn decrypt(&mut self, input: &Path, output: &Path) -> Result<DecryptOutcome> {
        let input_file = self.validate(input, output, "decryption")?;
        let decompress = self.config.compression();

        debug!(
            input = %input.display(),
            output = %output.display(),
            "decrypting file"
        );

        let mut reader = BufReader::new(input_file);
        let mut salt = vec![0u8; self.config.cipher_algorithm().salt_size()];
        if let Err(e) = reader.read_exact(&mut salt) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                debug!(input = %input.display(), "input shorter than the salt");
                return Ok(DecryptOutcome::AuthFailed);
            }
            return Err(e.into());
        }

        let session = CipherSession::for_decryption(&self.config, salt)?;
        let mut tmp = NamedTempFile::new_in(parent_dir(output))?;

        let verified = decrypt_stream(
            &session,
            &mut reader,
            BufWriter::new(tmp.as_file_mut()),
            decompress,
        )?;

        if !verified {
            // Dropping the provisional file removes it; no cause detail.
            info!(input = %input.display(), "authentication failed");
            return Ok(DecryptOutcome::AuthFailed);
        }

        tmp.persist(output).map_err(|e| Error::Io(e.error))?;

        info!(
            input = %input.display(),
            output = %output.display(),
            "file decrypted"
        );
        Ok(DecryptOutcome::Verified)
    }

    /// Usage validation shared by both operations, in contract order:
    /// key present, input readable, output absent.
    fn validate(&self, input: &Path, output: &Path, operation: &str) -> Result<File> {
        if self.config.key().is_none() {
            return Err(Error::Config(format!("no key specified for {}", operation)));
        }

        let file = File::open(input).map_err(|e| {
            Error::Config(format!(
                "cannot open the file {} for {}: {}",
                input.display(),
                operation,
                e
            ))
        })?;

        if output.exists() {
            return Err(Error::Config(format!(
                "file already exists: {}",
                output.display()
            )));
        }

        Ok(file)
    }
}

impl Default for FileCipher {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory the provisional output lives in, so the final commit is a
/// same-filesystem rename.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use tempfile::TempDir;

    const TEST_ITERATIONS: u32 = 512;

    fn test_cipher() -> FileCipher {
        let mut cipher = FileCipher::new();
        cipher.set_key(b"test").unwrap();
        cipher.set_iterations(TEST_ITERATIONS).unwrap();
        cipher.set_compression(false);
        cipher
    }

    fn write_input(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_single_byte_roundtrip_and_size_law() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "plain", b"x");
        let encrypted = dir.path().join("sealed");
        let restored = dir.path().join("restored");

        let mut cipher = test_cipher();
        cipher.encrypt(&input, &encrypted).unwrap();

        // 1 byte + salt (16) + tag (32) + padding (15).
        assert_eq!(fs::metadata(&encrypted).unwrap().len(), 1 + 16 + 32 + 15);

        let outcome = cipher.decrypt(&encrypted, &restored).unwrap();
        assert!(outcome.is_verified());
        assert_eq!(fs::read(&restored).unwrap(), b"x");
    }

    #[test]
    fn test_multi_chunk_random_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut data = vec![0u8; 3 * 1_048_576 + 37];
        StdRng::seed_from_u64(42).fill_bytes(&mut data);
        let input = write_input(&dir, "plain", &data);
        let encrypted = dir.path().join("sealed");
        let restored = dir.path().join("restored");

        let mut cipher = test_cipher();
        cipher.encrypt(&input, &encrypted).unwrap();
        let outcome = cipher.decrypt(&encrypted, &restored).unwrap();

        assert!(outcome.is_verified());
        assert_eq!(fs::read(&restored).unwrap(), data);
    }

    #[test]
    fn test_compressed_roundtrip() {
        let dir = TempDir::new().unwrap();
        let data = b"all work and no play makes jack a dull boy\n".repeat(5_000);
        let input = write_input(&dir, "plain", &data);
        let encrypted = dir.path().join("sealed");
        let restored = dir.path().join("restored");

        let mut cipher = test_cipher();
        cipher.set_compression(true);
        cipher.encrypt(&input, &encrypted).unwrap();
        assert!(fs::metadata(&encrypted).unwrap().len() < data.len() as u64);

        let outcome = cipher.decrypt(&encrypted, &restored).unwrap();
        assert!(outcome.is_verified());
        assert_eq!(fs::read(&restored).unwrap(), data);
    }

    #[test]
    fn test_missing_key_rejected_before_io() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "plain", b"data");
        let output = dir.path().join("sealed");

        let mut cipher = FileCipher::new();
        let err = cipher.encrypt(&input, &output).unwrap_err();
        assert!(err.to_string().contains("no key specified for encryption"));

        let err = cipher.decrypt(&input, &output).unwrap_err();
        assert!(err.to_string().contains("no key specified for decryption"));
        assert!(!output.exists());
    }

    #[test]
    fn test_unreadable_input_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let output = dir.path().join("sealed");

        let mut cipher = test_cipher();
        let err = cipher.encrypt(&missing, &output).unwrap_err();
        assert!(err.to_string().contains("cannot open the file"));
        assert!(!output.exists());
    }

    #[test]
    fn test_existing_output_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "plain", b"data");
        let output = write_input(&dir, "already-there", b"precious");

        let mut cipher = test_cipher();
        let err = cipher.encrypt(&input, &output).unwrap_err();
        assert!(err.to_string().contains("file already exists"));
        assert_eq!(fs::read(&output).unwrap(), b"precious");

        let err = cipher.decrypt(&input, &output).unwrap_err();
        assert!(err.to_string().contains("file already exists"));
        assert_eq!(fs::read(&output).unwrap(), b"precious");
    }

    #[test]
    fn test_tampered_ciphertext_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "plain", b"untouchable payload");
        let encrypted = dir.path().join("sealed");
        let restored = dir.path().join("restored");

        let mut cipher = test_cipher();
        cipher.encrypt(&input, &encrypted).unwrap();

        // Increment one byte in the ciphertext region, modulo 256.
        let mut bytes = fs::read(&encrypted).unwrap();
        let index = 16 + 3;
        bytes[index] = bytes[index].wrapping_add(1);
        fs::write(&encrypted, &bytes).unwrap();

        let outcome = cipher.decrypt(&encrypted, &restored).unwrap();
        assert_eq!(outcome, DecryptOutcome::AuthFailed);
        assert!(!restored.exists());
    }

    #[test]
    fn test_wrong_key_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "plain", b"secret");
        let encrypted = dir.path().join("sealed");
        let restored = dir.path().join("restored");

        test_cipher().encrypt(&input, &encrypted).unwrap();

        let mut other = test_cipher();
        other.set_key(b"not the right password").unwrap();
        let outcome = other.decrypt(&encrypted, &restored).unwrap();

        assert_eq!(outcome, DecryptOutcome::AuthFailed);
        assert!(!restored.exists());
    }

    #[test]
    fn test_garbage_input_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let garbage = write_input(&dir, "garbage", &[0xEE; 10]);
        let restored = dir.path().join("restored");

        let mut cipher = test_cipher();
        let outcome = cipher.decrypt(&garbage, &restored).unwrap();

        assert_eq!(outcome, DecryptOutcome::AuthFailed);
        assert!(!restored.exists());
    }

    #[test]
    fn test_salts_differ_between_encryptions() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "plain", b"same plaintext");
        let first = dir.path().join("first");
        let second = dir.path().join("second");

        let mut cipher = test_cipher();
        cipher.encrypt(&input, &first).unwrap();
        cipher.encrypt(&input, &second).unwrap();

        let a = fs::read(&first).unwrap();
        let b = fs::read(&second).unwrap();
        assert_ne!(a[..16], b[..16]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_injected_entropy_controls_salt() {
        struct FixedEntropy;
        impl EntropySource for FixedEntropy {
            fn fill(&mut self, dest: &mut [u8]) {
                dest.fill(0xAB);
            }
        }

        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "plain", b"data");
        let output = dir.path().join("sealed");

        let mut cipher = FileCipher::with_entropy(Box::new(FixedEntropy));
        cipher.set_key(b"test").unwrap();
        cipher.set_iterations(TEST_ITERATIONS).unwrap();
        cipher.encrypt(&input, &output).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert_eq!(&bytes[..16], &[0xAB; 16]);
    }

    #[test]
    fn test_algorithm_selection_roundtrip() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "plain", b"parameterized");
        let encrypted = dir.path().join("sealed");
        let restored = dir.path().join("restored");

        let mut cipher = test_cipher();
        cipher.set_cipher_algorithm("aes-128").unwrap();
        cipher.set_mac_hash("sha-512").unwrap();
        cipher.set_kdf_hash("sha-512").unwrap();

        cipher.encrypt(&input, &encrypted).unwrap();
        // 13 bytes + salt (16) + tag (64) + padding (3).
        assert_eq!(fs::metadata(&encrypted).unwrap().len(), 13 + 16 + 64 + 3);

        let outcome = cipher.decrypt(&encrypted, &restored).unwrap();
        assert!(outcome.is_verified());
        assert_eq!(fs::read(&restored).unwrap(), b"parameterized");
    }
}
