use crate::entry::{BinaryEntry, DescriptionEntry};
use crate::error::{IndexerError, Result};
use crate::limits::ScanLimiter;
use crate::stats::IndexStats;
use ecu_ident_fingerprint::FingerprintEngine;
use ecu_ident_signals::{extract_printable_runs, tokenize, DescriptionSignals, DEFAULT_MIN_RUN_LEN};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MAX_FILE_BYTES: u64 = 256 * 1024 * 1024;
const DEFAULT_READ_TIMEOUT_MS: u64 = 30_000;

/// What the scanner treats as description, binary and sidecar files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Extensions (without dot, case-insensitive) of calibration descriptions
    pub description_extensions: Vec<String>,

    /// Extensions (without dot, case-insensitive) of firmware images
    pub binary_extensions: Vec<String>,

    /// Metadata files merged into every description of their directory
    pub sidecar_names: Vec<String>,

    /// Larger files are skipped
    pub max_file_bytes: u64,

    /// Upper bound for reading a single file
    pub read_timeout_ms: u64,

    /// Files processed at once; `None` reads `ECU_IDENT_SCAN_CONCURRENCY`
    pub concurrency: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            description_extensions: vec!["a2l".to_string()],
            binary_extensions: vec!["bin".to_string()],
            sidecar_names: vec![
                "EPK.txt".to_string(),
                "ident.txt".to_string(),
                "minmax.csv".to_string(),
            ],
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            concurrency: None,
        }
    }
}

impl ScanOptions {
    pub fn is_description(&self, path: &Path) -> bool {
        has_extension(path, &self.description_extensions)
    }

    pub fn is_binary(&self, path: &Path) -> bool {
        has_extension(path, &self.binary_extensions)
    }

    pub fn is_sidecar(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| {
                self.sidecar_names
                    .iter()
                    .any(|candidate| name.eq_ignore_ascii_case(candidate))
            })
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|candidate| ext.eq_ignore_ascii_case(candidate)))
}

/// Shared, read-only state of one corpus scan.
pub(crate) struct ScanContext {
    pub options: ScanOptions,
    pub engine: FingerprintEngine,
    pub limiter: ScanLimiter,
}

/// Entries produced by one directory subtree.
#[derive(Debug, Default)]
pub(crate) struct ScanOutput {
    pub descriptions: Vec<DescriptionEntry>,
    pub binaries: Vec<BinaryEntry>,
    pub stats: IndexStats,
}

impl ScanOutput {
    fn merge(&mut self, other: ScanOutput) {
        self.descriptions.extend(other.descriptions);
        self.binaries.extend(other.binaries);
        self.stats.merge(other.stats);
    }
}

#[derive(Debug, Default)]
struct DirectoryListing {
    subdirs: Vec<PathBuf>,
    descriptions: Vec<PathBuf>,
    binaries: Vec<PathBuf>,
    sidecars: Vec<PathBuf>,
}

type ScanFuture = Pin<Box<dyn Future<Output = ScanOutput> + Send + 'static>>;

/// Scan `dir` and everything below it.
///
/// The directory's own files are processed first, then every subdirectory is
/// scanned on its own task; the returned future completes only after all of
/// them have. Failures are logged and recorded in the output stats.
pub(crate) fn scan_directory(ctx: Arc<ScanContext>, dir: PathBuf) -> ScanFuture {
    Box::pin(async move {
        let mut output = ScanOutput::default();

        let listing = match list_directory(&ctx.options, &dir).await {
            Ok(listing) => listing,
            Err(e) => {
                log::warn!("Cannot read dir {}: {e}", dir.display());
                output.stats.add_error(format!("{}: {e}", dir.display()));
                return output;
            }
        };
        output.stats.directories += 1;

        if !listing.descriptions.is_empty() {
            let sidecar = read_sidecars(&ctx, &listing.sidecars, &mut output.stats).await;
            for path in listing.descriptions {
                match describe(&ctx, path.clone(), &sidecar).await {
                    Ok(entry) => output.descriptions.push(entry),
                    Err(e) => record_skip(&mut output.stats, &path, &e),
                }
            }
        }

        for path in listing.binaries {
            match fingerprint_binary(&ctx, &dir, path.clone()).await {
                Ok(entry) => output.binaries.push(entry),
                Err(e) => record_skip(&mut output.stats, &path, &e),
            }
        }

        let children: Vec<_> = listing
            .subdirs
            .into_iter()
            .map(|sub| tokio::spawn(scan_directory(ctx.clone(), sub)))
            .collect();

        for child in children {
            match child.await {
                Ok(sub) => output.merge(sub),
                Err(e) => {
                    log::warn!("Directory scan task failed under {}: {e}", dir.display());
                    output.stats.add_error(format!("{}: {e}", dir.display()));
                }
            }
        }

        output
    })
}

fn record_skip(stats: &mut IndexStats, path: &Path, error: &IndexerError) {
    match error {
        IndexerError::TooLarge { .. } => log::debug!("Skipping {error}"),
        _ => log::warn!("Skipping {}: {error}", path.display()),
    }
    stats.add_skip(format!("{}: {error}", path.display()));
}

async fn list_directory(options: &ScanOptions, dir: &Path) -> Result<DirectoryListing> {
    let mut listing = DirectoryListing::default();
    let mut entries = tokio::fs::read_dir(dir).await?;

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Failed to read entry in {}: {e}", dir.display());
                break;
            }
        };
        // Symlinks are neither files nor directories here, which keeps the walk acyclic.
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                log::warn!("Failed to stat {}: {e}", entry.path().display());
                continue;
            }
        };

        let path = entry.path();
        if file_type.is_dir() {
            listing.subdirs.push(path);
        } else if file_type.is_file() {
            if options.is_description(&path) {
                listing.descriptions.push(path);
            } else if options.is_binary(&path) {
                listing.binaries.push(path);
            } else if options.is_sidecar(&path) {
                listing.sidecars.push(path);
            }
        }
    }

    listing.subdirs.sort();
    listing.descriptions.sort();
    listing.binaries.sort();
    listing.sidecars.sort();
    Ok(listing)
}

async fn read_file(options: &ScanOptions, path: &Path) -> Result<Vec<u8>> {
    let size = tokio::fs::metadata(path).await?.len();
    if size > options.max_file_bytes {
        return Err(IndexerError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: options.max_file_bytes,
        });
    }

    let timeout = options.read_timeout();
    match tokio::time::timeout(timeout, tokio::fs::read(path)).await {
        Ok(read) => Ok(read?),
        Err(_) => Err(IndexerError::Timeout {
            path: path.to_path_buf(),
            timeout_ms: timeout.as_millis(),
        }),
    }
}

async fn read_sidecars(
    ctx: &ScanContext,
    sidecars: &[PathBuf],
    stats: &mut IndexStats,
) -> DescriptionSignals {
    let mut signals = DescriptionSignals::default();
    for path in sidecars {
        match read_file(&ctx.options, path).await {
            Ok(bytes) => {
                signals.merge(DescriptionSignals::from_sidecar_text(&String::from_utf8_lossy(
                    &bytes,
                )));
            }
            Err(e) => {
                log::debug!("Ignoring sidecar {}: {e}", path.display());
                stats.add_error(format!("{}: {e}", path.display()));
            }
        }
    }
    signals
}

async fn describe(
    ctx: &ScanContext,
    path: PathBuf,
    sidecar: &DescriptionSignals,
) -> Result<DescriptionEntry> {
    let _permit = ctx.limiter.acquire().await;
    let bytes = read_file(&ctx.options, &path).await?;
    let sidecar = sidecar.clone();

    tokio::task::spawn_blocking(move || {
        let mut signals = DescriptionSignals::from_description_text(&String::from_utf8_lossy(&bytes));
        signals.merge(sidecar);
        DescriptionEntry::new(path, signals, bytes.len() as u64)
    })
    .await
    .map_err(|e| IndexerError::Other(format!("Description parse task failed: {e}")))
}

async fn fingerprint_binary(ctx: &ScanContext, dir: &Path, path: PathBuf) -> Result<BinaryEntry> {
    let _permit = ctx.limiter.acquire().await;
    let bytes = read_file(&ctx.options, &path).await?;
    let engine = ctx.engine;
    let dir = dir.to_path_buf();

    tokio::task::spawn_blocking(move || binary_entry(&engine, path, dir, &bytes))
        .await
        .map_err(|e| IndexerError::Other(format!("Fingerprint task failed: {e}")))
}

pub(crate) fn binary_entry(
    engine: &FingerprintEngine,
    path: PathBuf,
    dir: PathBuf,
    bytes: &[u8],
) -> BinaryEntry {
    let fingerprint = engine.fingerprint(bytes);
    let runs = extract_printable_runs(bytes, DEFAULT_MIN_RUN_LEN);
    BinaryEntry {
        path,
        dir,
        content_hash: fingerprint.content_hash,
        ascii_tokens: tokenize(&runs),
        chunk_hashes: fingerprint.chunk_hashes,
        kgram_hashes: fingerprint.kgram_hashes,
        size_bytes: fingerprint.size as u64,
        associated_descriptions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_by_extension_case_insensitively() {
        let options = ScanOptions::default();
        assert!(options.is_description(Path::new("x/EDC17.A2L")));
        assert!(options.is_description(Path::new("x/edc17.a2l")));
        assert!(options.is_binary(Path::new("x/stock.BIN")));
        assert!(!options.is_binary(Path::new("x/stock.bin.bak")));
        assert!(options.is_sidecar(Path::new("x/epk.TXT")));
        assert!(!options.is_sidecar(Path::new("x/notes.txt")));
    }

    #[tokio::test]
    async fn listing_sorts_and_ignores_unknown_files() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("b")).unwrap();
        fs::create_dir(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("z.bin"), b"z").unwrap();
        fs::write(temp.path().join("y.bin"), b"y").unwrap();
        fs::write(temp.path().join("readme.md"), b"").unwrap();
        fs::write(temp.path().join("ident.txt"), b"").unwrap();

        let listing = list_directory(&ScanOptions::default(), temp.path()).await.unwrap();
        assert_eq!(listing.subdirs, vec![temp.path().join("a"), temp.path().join("b")]);
        assert_eq!(listing.binaries, vec![temp.path().join("y.bin"), temp.path().join("z.bin")]);
        assert_eq!(listing.sidecars, vec![temp.path().join("ident.txt")]);
        assert!(listing.descriptions.is_empty());
    }

    #[tokio::test]
    async fn oversized_files_are_rejected_before_reading() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("big.bin");
        fs::write(&path, vec![0u8; 32]).unwrap();

        let options = ScanOptions {
            max_file_bytes: 16,
            ..ScanOptions::default()
        };
        let err = read_file(&options, &path).await.unwrap_err();
        assert!(matches!(err, IndexerError::TooLarge { size: 32, limit: 16, .. }));
    }

    #[test]
    fn binary_entry_collects_tokens_and_fingerprints() {
        let mut bytes = vec![0u8; 100];
        bytes.extend_from_slice(b"EDC17C46 SW1037508389");
        bytes.extend_from_slice(&[0u8; 100]);

        let entry = binary_entry(
            &FingerprintEngine::default(),
            PathBuf::from("/c/x/stock.bin"),
            PathBuf::from("/c/x"),
            &bytes,
        );
        assert_eq!(entry.size_bytes, 221);
        assert_eq!(entry.chunk_hashes.len(), 1);
        assert!(entry.ascii_tokens.contains("edc17c46"));
        assert!(entry.ascii_tokens.contains("sw1037508389"));
        assert!(entry.associated_descriptions.is_empty());
    }
}
