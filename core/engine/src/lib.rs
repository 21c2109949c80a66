//! Streaming file-encryption engine for SealStream.
//!
//! This module provides:
//! - Validated configuration of key, iteration count, and algorithms
//! - Per-operation sessions with derived, zeroized key material
//! - A chunked pipeline bounding memory use regardless of file size
//! - A file facade enforcing the commit-or-discard output contract
//!
//! # Architecture
//! The engine sits between callers (CLI, library users) and the crypto
//! primitives, handling layout assembly/parsing and tamper detection.

pub mod config;
pub mod filecipher;
pub mod pipeline;
pub mod session;

pub use config::{CipherConfig, DEFAULT_ITERATIONS};
pub use filecipher::{DecryptOutcome, FileCipher};
pub use pipeline::CHUNK_SIZE;
pub use session::CipherSession;
