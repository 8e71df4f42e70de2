//! # ECU Identification
//!
//! Ranks calibration descriptions for an uploaded firmware image against a
//! frozen [`ecu_ident_indexer::CorpusIndex`].
//!
//! Tiers run in priority order and a description is reported only by the
//! first tier that surfaces it:
//!
//! | tier     | signal                              | score              |
//! |----------|-------------------------------------|--------------------|
//! | exact    | content hash                        | 100                |
//! | chunks   | fixed-chunk Jaccard, top 5 binaries | `round(sim * 60)`  |
//! | k-grams  | k-gram Jaccard, top 5 binaries      | `round(sim * 70)`  |
//! | tokens   | ASCII token overlap, top 5 binaries | `round(sim * 50)`  |
//! | metadata | file name, identifiers, part numbers, software ids | additive |

mod engine;
mod error;
mod ranking;
mod tiers;

pub use engine::{EngineOptions, IdentificationEngine, UploadSignals};
pub use error::{Result, SearchError};
pub use ranking::{rank, Candidate, MatchSet};
pub use tiers::{metadata_match, Tier};
