use crate::association::nearest_descriptions;
use crate::corpus::CorpusIndex;
use crate::entry::{BinaryEntry, DescriptionEntry};
use crate::limits::{scan_concurrency_from_env, ScanLimiter};
use crate::scanner::{scan_directory, ScanContext, ScanOptions, ScanOutput};
use crate::stats::IndexStats;
use ecu_ident_fingerprint::{FingerprintConfig, FingerprintEngine};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Configures and runs a corpus build.
#[derive(Debug, Clone, Default)]
pub struct CorpusBuilder {
    root: Option<PathBuf>,
    fingerprint: FingerprintConfig,
    options: ScanOptions,
}

impl CorpusBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// A builder with no corpus root; building yields an empty corpus.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn root(mut self, root: Option<PathBuf>) -> Self {
        self.root = root;
        self
    }

    pub fn fingerprint_config(mut self, config: FingerprintConfig) -> Self {
        self.fingerprint = config;
        self
    }

    pub fn scan_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Scan and associate.
    pub async fn build(self) -> CorpusIndex {
        let started = Instant::now();
        let corpus = self.scan().await.associate();
        let stats = corpus.stats();

        log::info!(
            "Indexed {} description(s), {} binary file(s) in {} ms",
            stats.descriptions,
            stats.binaries,
            started.elapsed().as_millis()
        );
        if let Some(sample) = corpus.descriptions().first() {
            log::info!("Sample description: {}", sample.path.display());
        }
        if let Some(sample) = corpus.binaries().first() {
            log::info!("Sample binary: {}", sample.path.display());
        }
        corpus
    }

    /// Walk the tree without associating binaries to descriptions.
    pub async fn scan(self) -> ScannedCorpus {
        let started = Instant::now();
        let engine = FingerprintEngine::new(self.fingerprint);

        let Some(root) = self.root else {
            log::warn!("Corpus root is not set; identification will report no candidates");
            return ScannedCorpus::empty(None, engine);
        };
        let root = root.canonicalize().unwrap_or(root);
        if !root.is_dir() {
            log::warn!("Corpus root does not exist: {}", root.display());
            return ScannedCorpus::empty(Some(root), engine);
        }

        log::info!("Indexing from corpus root: {}", root.display());
        let limit = self.options.concurrency.unwrap_or_else(scan_concurrency_from_env);
        let ctx = Arc::new(ScanContext {
            options: self.options,
            engine,
            limiter: ScanLimiter::new(limit),
        });
        log::debug!("Scan concurrency: {:?}", ctx.limiter.snapshot());

        let ScanOutput {
            descriptions,
            binaries,
            mut stats,
        } = scan_directory(ctx, root.clone()).await;
        stats.time_ms = started.elapsed().as_millis() as u64;

        ScannedCorpus {
            root: Some(root),
            engine,
            descriptions,
            binaries,
            stats,
        }
    }
}

/// Scan result awaiting the association pass.
#[derive(Debug)]
pub struct ScannedCorpus {
    root: Option<PathBuf>,
    engine: FingerprintEngine,
    descriptions: Vec<DescriptionEntry>,
    binaries: Vec<BinaryEntry>,
    stats: IndexStats,
}

impl ScannedCorpus {
    fn empty(root: Option<PathBuf>, engine: FingerprintEngine) -> Self {
        Self {
            root,
            engine,
            descriptions: Vec::new(),
            binaries: Vec::new(),
            stats: IndexStats::new(),
        }
    }

    pub fn descriptions(&self) -> &[DescriptionEntry] {
        &self.descriptions
    }

    pub fn binaries(&self) -> &[BinaryEntry] {
        &self.binaries
    }

    /// Attach every binary to its nearest enclosing description directory and
    /// freeze the corpus.
    pub fn associate(self) -> CorpusIndex {
        let Self {
            root,
            engine,
            descriptions,
            mut binaries,
            mut stats,
        } = self;

        let dir_descriptions = descriptions_by_dir(&descriptions);
        let mut hash_descriptions: HashMap<String, Vec<PathBuf>> = HashMap::new();

        for binary in &mut binaries {
            let found = nearest_descriptions(&dir_descriptions, &binary.dir);
            if !found.is_empty() {
                let known = hash_descriptions.entry(binary.content_hash.clone()).or_default();
                for path in &found {
                    if !known.contains(path) {
                        known.push(path.clone());
                    }
                }
                stats.associated_binaries += 1;
            } else {
                log::debug!("No description found for {}", binary.path.display());
            }
            binary.associated_descriptions = found;
        }

        stats.descriptions = descriptions.len();
        stats.binaries = binaries.len();

        CorpusIndex::from_parts(
            root,
            engine,
            descriptions,
            binaries,
            dir_descriptions,
            hash_descriptions,
            stats,
        )
    }
}

fn descriptions_by_dir(descriptions: &[DescriptionEntry]) -> HashMap<PathBuf, Vec<PathBuf>> {
    let mut by_dir: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
    for entry in descriptions {
        by_dir
            .entry(entry.dir.clone())
            .or_default()
            .push(entry.path.clone());
    }
    by_dir
}
