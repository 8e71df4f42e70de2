use crate::config::FingerprintConfig;
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::fmt;

/// Raw SHA-1 digest of one window.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashDigest([u8; 20]);

impl HashDigest {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha1::digest(bytes);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashDigest({self})")
    }
}

/// Hex SHA-1 of the whole buffer.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha1::digest(bytes))
}

/// Hashes of consecutive `chunk_size` windows; the last window may be short.
/// A zero `chunk_size` is treated as one byte.
pub fn chunk_hashes(bytes: &[u8], chunk_size: usize) -> HashSet<HashDigest> {
    bytes.chunks(chunk_size.max(1)).map(HashDigest::of).collect()
}

/// Hashes of every `k`-byte window starting at `0, step, 2*step, ...`.
/// Empty when the buffer is shorter than `k`.
pub fn kgram_hashes(bytes: &[u8], k: usize, step: usize) -> HashSet<HashDigest> {
    let k = k.max(1);
    if bytes.len() < k {
        return HashSet::new();
    }
    (0..=bytes.len() - k)
        .step_by(step.max(1))
        .map(|offset| HashDigest::of(&bytes[offset..offset + k]))
        .collect()
}

/// All fingerprints of one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub content_hash: String,
    pub chunk_hashes: HashSet<HashDigest>,
    pub kgram_hashes: HashSet<HashDigest>,
    pub size: usize,
}

/// Fingerprinting with a fixed [`FingerprintConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintEngine {
    config: FingerprintConfig,
}

impl FingerprintEngine {
    pub fn new(config: FingerprintConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    pub fn content_hash(&self, bytes: &[u8]) -> String {
        content_hash(bytes)
    }

    pub fn chunk_hashes(&self, bytes: &[u8]) -> HashSet<HashDigest> {
        chunk_hashes(bytes, self.config.chunk_size)
    }

    pub fn kgram_hashes(&self, bytes: &[u8]) -> HashSet<HashDigest> {
        kgram_hashes(bytes, self.config.kgram_k, self.config.kgram_step)
    }

    pub fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        let fingerprint = Fingerprint {
            content_hash: self.content_hash(bytes),
            chunk_hashes: self.chunk_hashes(bytes),
            kgram_hashes: self.kgram_hashes(bytes),
            size: bytes.len(),
        };
        log::debug!(
            "Fingerprinted {} bytes: {} chunk(s), {} k-gram(s)",
            fingerprint.size,
            fingerprint.chunk_hashes.len(),
            fingerprint.kgram_hashes.len()
        );
        fingerprint
    }
}
