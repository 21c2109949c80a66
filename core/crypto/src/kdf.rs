//! Password-based key derivation using PBKDF2.
//!
//! A per-file random salt combined with iterated derivation defeats
//! precomputation and makes repeated encryptions of identical plaintext
//! under the same password produce unrelated ciphertext and tags.

use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use crate::mac::HashAlgorithm;
use sealstream_common::{Error, Result};

/// Derive `length` bytes of key material from a password and salt.
///
/// The caller splits the output: the leading bytes become the cipher key,
/// the remainder the MAC key. Separating the two prevents a MAC key
/// compromise from leaking plaintext-recovery information.
///
/// # Postconditions
/// - Deterministic for identical (password, salt, iterations, hash)
/// - Output is zeroized when dropped
///
/// # Errors
/// - Empty password
/// - Zero iteration count
pub fn derive_key_material(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    hash: HashAlgorithm,
    length: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if password.is_empty() {
        return Err(Error::Config("key cannot be empty".to_string()));
    }
    if iterations == 0 {
        return Err(Error::Config("iteration count must be positive".to_string()));
    }

    let mut material = Zeroizing::new(vec![0u8; length]);
    match hash {
        HashAlgorithm::Sha256 => {
            pbkdf2_hmac::<Sha256>(password, salt, iterations, material.as_mut_slice())
        }
        HashAlgorithm::Sha512 => {
            pbkdf2_hmac::<Sha512>(password, salt, iterations, material.as_mut_slice())
        }
    }
    Ok(material)
}
