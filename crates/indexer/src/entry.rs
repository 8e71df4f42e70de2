use ecu_ident_fingerprint::HashDigest;
use ecu_ident_signals::DescriptionSignals;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// A parsed calibration-description file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptionEntry {
    pub path: PathBuf,

    /// File name without extension
    pub label: String,

    /// Directory that directly contains the file
    pub dir: PathBuf,

    /// Signals from the file merged with any sidecars in `dir`
    #[serde(flatten)]
    pub signals: DescriptionSignals,

    pub size_bytes: u64,
}

impl DescriptionEntry {
    pub fn new(path: PathBuf, signals: DescriptionSignals, size_bytes: u64) -> Self {
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            label,
            dir,
            signals,
            size_bytes,
        }
    }

    /// Final component of the owning directory.
    pub fn dir_name(&self) -> Option<&str> {
        self.dir.file_name().and_then(|name| name.to_str())
    }
}

/// A fingerprinted firmware image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryEntry {
    pub path: PathBuf,
    pub dir: PathBuf,

    /// Hex SHA-1 of the whole file
    pub content_hash: String,

    pub ascii_tokens: BTreeSet<String>,
    pub chunk_hashes: HashSet<HashDigest>,
    pub kgram_hashes: HashSet<HashDigest>,
    pub size_bytes: u64,

    /// Descriptions from the nearest enclosing description directory. Filled by
    /// the association pass.
    pub associated_descriptions: Vec<PathBuf>,
}

/// An indexed binary ranked against an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarBinary {
    pub path: PathBuf,
    pub dir: PathBuf,
    pub content_hash: String,

    /// Ratio in `[0, 1]`
    pub similarity: f64,

    pub associated_descriptions: Vec<PathBuf>,
}

impl SimilarBinary {
    pub(crate) fn from_entry(entry: &BinaryEntry, similarity: f64) -> Self {
        Self {
            path: entry.path.clone(),
            dir: entry.dir.clone(),
            content_hash: entry.content_hash.clone(),
            similarity,
            associated_descriptions: entry.associated_descriptions.clone(),
        }
    }

    /// Similarity as a rounded percentage.
    pub fn percent(&self) -> u32 {
        (self.similarity * 100.0).round() as u32
    }
}
