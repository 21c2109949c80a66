//! Entropy source abstraction for salt generation.
//!
//! The random source is an explicit dependency of the engine rather than a
//! hidden process-wide global, so tests can substitute a deterministic one.

use rand::rngs::OsRng;
use rand::RngCore;

/// Cryptographically secure random byte source.
pub trait EntropySource: Send {
    /// Fill `dest` with random bytes.
    fn fill(&mut self, dest: &mut [u8]);
}

/// Operating-system entropy via `OsRng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}
