//! Cryptographic building blocks for SealStream.
//!
//! This module provides:
//! - Key derivation using PBKDF2 with a selectable hash
//! - A block cipher engine over a closed set of AES variants
//! - Incremental HMAC authentication over ordered byte streams
//! - An injectable entropy source for salt generation
//!
//! # Security Guarantees
//! - Derived key material is zeroized on drop
//! - Tag comparisons are constant-time
//! - No key material or plaintext is ever logged

pub mod cipher;
pub mod entropy;
pub mod kdf;
pub mod mac;

pub use cipher::{BlockCipher, CipherAlgorithm, BLOCK_SIZE, SALT_SIZE};
pub use entropy::{EntropySource, OsEntropy};
pub use kdf::derive_key_material;
pub use mac::{HashAlgorithm, StreamMac};
