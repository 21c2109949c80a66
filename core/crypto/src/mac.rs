//! Incremental message authentication over an ordered byte stream.
//!
//! The encrypt path feeds the salt and then every ciphertext chunk, in
//! order, and appends the finalized tag to the file. The decrypt path
//! recomputes the same stream and compares in constant time.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use sealstream_common::{Error, Result};

/// Supported hash algorithms, usable both as the MAC hash and as the
/// PBKDF2 pseudorandom function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 2] = [Self::Sha256, Self::Sha512];

    /// Look up an algorithm by its identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha-256" => Some(Self::Sha256),
            "sha-512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Stable identifier used in configuration and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
            Self::Sha512 => "sha-512",
        }
    }

    /// Digest (and therefore tag) length in bytes.
    pub fn output_size(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental HMAC over the (salt, ciphertext) stream.
pub enum StreamMac {
    Sha256(Hmac<Sha256>),
    Sha512(Hmac<Sha512>),
}

impl StreamMac {
    /// Start a new keyed MAC computation.
    pub fn new(algorithm: HashAlgorithm, key: &[u8]) -> Result<Self> {
        match algorithm {
            HashAlgorithm::Sha256 => <Hmac<Sha256> as Mac>::new_from_slice(key)
                .map(Self::Sha256)
                .map_err(|e| Error::Crypto(format!("MAC init failed: {}", e))),
            HashAlgorithm::Sha512 => <Hmac<Sha512> as Mac>::new_from_slice(key)
                .map(Self::Sha512)
                .map_err(|e| Error::Crypto(format!("MAC init failed: {}", e))),
        }
    }

    /// Feed the next bytes of the stream.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(mac) => mac.update(data),
            Self::Sha512(mac) => mac.update(data),
        }
    }

    /// Finish the computation and return the tag.
    pub fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha256(mac) => mac.finalize().into_bytes().to_vec(),
            Self::Sha512(mac) => mac.finalize().into_bytes().to_vec(),
        }
    }

    /// Finish the computation and compare against a stored tag.
    ///
    /// # Security
    /// The comparison is constant-time and does not reveal where the
    /// first mismatching byte occurs.
    pub fn verify(self, expected: &[u8]) -> bool {
        let computed = self.finalize();
        computed.as_slice().ct_eq(expected).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tag_length_matches_output_size() {
        for algorithm in HashAlgorithm::ALL {
            let mac = StreamMac::new(algorithm, b"key").unwrap();
            assert_eq!(mac.finalize().len(), algorithm.output_size());
        }
    }

    #[test]
    fn test_incremental_equals_one_shot() {
        let mut split = StreamMac::new(HashAlgorithm::Sha256, b"key").unwrap();
        split.update(b"hello ");
        split.update(b"world");

        let mut whole = StreamMac::new(HashAlgorithm::Sha256, b"key").unwrap();
        whole.update(b"hello world");

        assert_eq!(split.finalize(), whole.finalize());
    }

    #[test]
    fn test_verify_accepts_matching_tag() {
        let mut mac = StreamMac::new(HashAlgorithm::Sha512, b"key").unwrap();
        mac.update(b"payload");
        let tag = {
            let mut again = StreamMac::new(HashAlgorithm::Sha512, b"key").unwrap();
            again.update(b"payload");
            again.finalize()
        };
        assert!(mac.verify(&tag));
    }

    #[test]
    fn test_verify_rejects_tampered_tag() {
        let mut mac = StreamMac::new(HashAlgorithm::Sha256, b"key").unwrap();
        mac.update(b"payload");
        let mut tag = {
            let mut again = StreamMac::new(HashAlgorithm::Sha256, b"key").unwrap();
            again.update(b"payload");
            again.finalize()
        };
        tag[0] ^= 0x01;
        assert!(!mac.verify(&tag));
    }

    #[test]
    fn test_verify_rejects_truncated_tag() {
        let mut mac = StreamMac::new(HashAlgorithm::Sha256, b"key").unwrap();
        mac.update(b"payload");
        assert!(!mac.verify(b"short"));
    }

    #[test]
    fn test_different_keys_yield_different_tags() {
        let mut a = StreamMac::new(HashAlgorithm::Sha256, b"key-a").unwrap();
        let mut b = StreamMac::new(HashAlgorithm::Sha256, b"key-b").unwrap();
        a.update(b"payload");
        b.update(b"payload");
        assert_ne!(a.finalize(), b.finalize());
    }

    proptest! {
        #[test]
        fn prop_arbitrary_split_equals_one_shot(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            split in 0usize..512,
        ) {
            let split = split.min(data.len());

            let mut chunked = StreamMac::new(HashAlgorithm::Sha256, b"key").unwrap();
            chunked.update(&data[..split]);
            chunked.update(&data[split..]);

            let mut whole = StreamMac::new(HashAlgorithm::Sha256, b"key").unwrap();
            whole.update(&data);

            prop_assert_eq!(chunked.finalize(), whole.finalize());
        }
    }
}
