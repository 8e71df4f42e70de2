//! # ECU fingerprints
//!
//! Three representations of a binary image, from strict to shift tolerant:
//!
//! - content hash: one SHA-1 over the whole buffer
//! - chunk hashes: SHA-1 of each non-overlapping `chunk_size` window
//! - k-gram hashes: SHA-1 of overlapping `k`-byte windows every `step` bytes
//!
//! Set representations are compared with [`jaccard`].

mod config;
mod error;
mod hash;
mod similarity;

pub use config::{
    FingerprintConfig, DEFAULT_CHUNK_SIZE, DEFAULT_KGRAM_K, DEFAULT_KGRAM_STEP, ENV_CHUNK_SIZE,
    ENV_KGRAM_K, ENV_KGRAM_STEP,
};
pub use error::{FingerprintError, Result};
pub use hash::{chunk_hashes, content_hash, kgram_hashes, Fingerprint, FingerprintEngine, HashDigest};
pub use similarity::{jaccard, overlap_ratio, Overlap};
