use serde::{Deserialize, Serialize};

/// Statistics about a corpus build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Description files indexed
    pub descriptions: usize,

    /// Binary images indexed
    pub binaries: usize,

    /// Binaries with at least one associated description
    pub associated_binaries: usize,

    /// Directories listed
    pub directories: usize,

    /// Files skipped (unreadable, too large, timed out)
    pub skipped: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Errors encountered
    pub errors: Vec<String>,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn add_skip(&mut self, error: String) {
        self.skipped += 1;
        self.add_error(error);
    }

    pub fn merge(&mut self, other: IndexStats) {
        self.descriptions += other.descriptions;
        self.binaries += other.binaries;
        self.associated_binaries += other.associated_binaries;
        self.directories += other.directories;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}
