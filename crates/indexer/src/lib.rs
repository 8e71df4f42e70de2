//! # ECU Corpus Indexer
//!
//! Builds a read-only snapshot of a reference firmware corpus.
//!
//! ## Pipeline
//!
//! ```text
//! Corpus root
//!     │
//!     ├──> Directory scan (one task per subdirectory, joined)
//!     │      ├─> Description files + sidecars ──> DescriptionEntry
//!     │      └─> Binary images ──> BinaryEntry (hash, chunks, k-grams, tokens)
//!     │
//!     └──> Association pass
//!            └─> binary ──> nearest enclosing description directory
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ecu_ident_indexer::CorpusBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let corpus = CorpusBuilder::new("/srv/ecu-corpus").build().await;
//!     let stats = corpus.stats();
//!
//!     println!("Indexed {} descriptions, {} binaries", stats.descriptions, stats.binaries);
//! }
//! ```

mod association;
mod builder;
mod corpus;
mod entry;
mod error;
mod limits;
mod scanner;
mod stats;

pub use association::nearest_descriptions;
pub use builder::{CorpusBuilder, ScannedCorpus};
pub use corpus::{CorpusIndex, DEFAULT_TOP_K};
pub use entry::{BinaryEntry, DescriptionEntry, SimilarBinary};
pub use error::{IndexerError, Result};
pub use limits::{scan_concurrency_from_env, ScanConcurrencySnapshot, ScanLimiter, ENV_SCAN_CONCURRENCY};
pub use scanner::ScanOptions;
pub use stats::IndexStats;
