//! Common error types for SealStream.

use thiserror::Error;

/// Top-level error type for SealStream operations.
///
/// Authentication failure during decryption is deliberately *not* an error
/// variant: tampering, corruption, and wrong keys are expected runtime
/// outcomes and travel through the ordinary result channel instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or usage fault: empty key, unsupported algorithm
    /// identifier, missing key at call time, unreadable input path,
    /// pre-existing output path.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cryptographic invariant violated (e.g. a primitive handed a key of
    /// the wrong length).
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
