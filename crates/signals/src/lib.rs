//! # ECU text signals
//!
//! Printable-run extraction and identifier classification shared by corpus
//! indexing and upload identification.
//!
//! ```text
//! bytes ──> printable runs ──┬──> tokens (lower-case, len >= 4)
//!                            ├──> part numbers
//!                            └──> software ids
//! ```

mod description;
mod extract;

pub use description::{
    collect_description_strings, DescriptionSignals, DESCRIPTION_KEYWORDS,
};
pub use extract::{
    extract_part_numbers, extract_printable_runs, extract_software_ids, tokenize,
    DEFAULT_MIN_RUN_LEN, MIN_TOKEN_LEN,
};
