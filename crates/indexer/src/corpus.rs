use crate::entry::{BinaryEntry, DescriptionEntry, SimilarBinary};
use crate::stats::IndexStats;
use ecu_ident_fingerprint::{jaccard, overlap_ratio, FingerprintEngine};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Binaries reported per similarity query unless the caller asks otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// Frozen snapshot of a scanned corpus.
///
/// Built once by [`crate::CorpusBuilder`]; rebuilding means constructing a new
/// index. Lookup maps are derived from the entries at construction time.
#[derive(Debug)]
pub struct CorpusIndex {
    root: Option<PathBuf>,
    engine: FingerprintEngine,
    descriptions: Vec<DescriptionEntry>,
    binaries: Vec<BinaryEntry>,
    description_by_path: HashMap<PathBuf, usize>,
    dir_descriptions: HashMap<PathBuf, Vec<PathBuf>>,
    hash_descriptions: HashMap<String, Vec<PathBuf>>,
    stats: IndexStats,
}

impl CorpusIndex {
    pub(crate) fn from_parts(
        root: Option<PathBuf>,
        engine: FingerprintEngine,
        descriptions: Vec<DescriptionEntry>,
        binaries: Vec<BinaryEntry>,
        dir_descriptions: HashMap<PathBuf, Vec<PathBuf>>,
        hash_descriptions: HashMap<String, Vec<PathBuf>>,
        stats: IndexStats,
    ) -> Self {
        let description_by_path = descriptions
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.path.clone(), idx))
            .collect();
        Self {
            root,
            engine,
            descriptions,
            binaries,
            description_by_path,
            dir_descriptions,
            hash_descriptions,
            stats,
        }
    }

    /// A corpus with no entries, e.g. when the root is missing.
    pub fn empty(root: Option<PathBuf>) -> Self {
        Self::from_parts(
            root,
            FingerprintEngine::default(),
            Vec::new(),
            Vec::new(),
            HashMap::new(),
            HashMap::new(),
            IndexStats::new(),
        )
    }

    pub fn corpus_root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn fingerprint_engine(&self) -> &FingerprintEngine {
        &self.engine
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty() && self.binaries.is_empty()
    }

    pub fn descriptions(&self) -> &[DescriptionEntry] {
        &self.descriptions
    }

    pub fn binaries(&self) -> &[BinaryEntry] {
        &self.binaries
    }

    pub fn description(&self, path: &Path) -> Option<&DescriptionEntry> {
        self.description_by_path
            .get(path)
            .and_then(|idx| self.descriptions.get(*idx))
    }

    /// Descriptions associated with any binary whose content hash is `hash`.
    pub fn find_by_content_hash(&self, hash: &str) -> &[PathBuf] {
        self.hash_descriptions
            .get(&hash.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Description files directly inside `dir`.
    pub fn descriptions_in_dir(&self, dir: &Path) -> &[PathBuf] {
        self.dir_descriptions
            .get(dir)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Binaries ranked by Jaccard similarity of fixed chunk hashes.
    pub fn similar_by_chunks(&self, buf: &[u8], top_k: usize) -> Vec<SimilarBinary> {
        let upload = self.engine.chunk_hashes(buf);
        self.rank_binaries(top_k, |binary| jaccard(&upload, &binary.chunk_hashes))
    }

    /// Binaries ranked by Jaccard similarity of k-gram hashes.
    pub fn similar_by_kgrams(&self, buf: &[u8], top_k: usize) -> Vec<SimilarBinary> {
        let upload = self.engine.kgram_hashes(buf);
        self.rank_binaries(top_k, |binary| jaccard(&upload, &binary.kgram_hashes))
    }

    /// Binaries ranked by shared ASCII tokens over the smaller token set.
    pub fn similar_by_tokens(&self, tokens: &BTreeSet<String>, top_k: usize) -> Vec<SimilarBinary> {
        self.rank_binaries(top_k, |binary| overlap_ratio(tokens, &binary.ascii_tokens).ratio)
    }

    fn rank_binaries(
        &self,
        top_k: usize,
        similarity: impl Fn(&BinaryEntry) -> f64,
    ) -> Vec<SimilarBinary> {
        let mut scored: Vec<(f64, &BinaryEntry)> = self
            .binaries
            .iter()
            .map(|binary| (similarity(binary), binary))
            .filter(|(sim, _)| *sim > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.path.cmp(&b.1.path))
        });
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(sim, binary)| SimilarBinary::from_entry(binary, sim))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::binary_entry;
    use pretty_assertions::assert_eq;

    fn corpus_of(binaries: Vec<BinaryEntry>) -> CorpusIndex {
        CorpusIndex::from_parts(
            Some(PathBuf::from("/c")),
            FingerprintEngine::default(),
            Vec::new(),
            binaries,
            HashMap::new(),
            HashMap::new(),
            IndexStats::new(),
        )
    }

    fn binary(name: &str, bytes: &[u8]) -> BinaryEntry {
        binary_entry(
            &FingerprintEngine::default(),
            PathBuf::from(format!("/c/{name}")),
            PathBuf::from("/c"),
            bytes,
        )
    }

    #[test]
    fn empty_corpus_answers_every_query() {
        let corpus = CorpusIndex::empty(None);
        assert!(corpus.is_empty());
        assert!(corpus.corpus_root().is_none());
        assert!(corpus.find_by_content_hash("deadbeef").is_empty());
        assert!(corpus.similar_by_chunks(b"abcd", DEFAULT_TOP_K).is_empty());
        assert!(corpus.description(Path::new("/nope.a2l")).is_none());
    }

    #[test]
    fn ranking_drops_zero_similarity_and_breaks_ties_by_path() {
        let shared = vec![7u8; 4096];
        let corpus = corpus_of(vec![
            binary("b.bin", &shared),
            binary("a.bin", &shared),
            binary("other.bin", &[1u8; 4096]),
        ]);

        let ranked = corpus.similar_by_chunks(&shared, DEFAULT_TOP_K);
        let paths: Vec<_> = ranked.iter().map(|s| s.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("/c/a.bin"), PathBuf::from("/c/b.bin")]);
        assert_eq!(ranked[0].similarity, 1.0);
        assert_eq!(ranked[0].percent(), 100);
    }

    #[test]
    fn top_k_truncates() {
        let bytes = vec![3u8; 2048];
        let corpus = corpus_of((0..8).map(|i| binary(&format!("{i}.bin"), &bytes)).collect());
        assert_eq!(corpus.similar_by_kgrams(&bytes, 5).len(), 5);
    }

    #[test]
    fn token_similarity_uses_smaller_set() {
        let corpus = corpus_of(vec![binary("x.bin", b"\0EDC17C46\0TUNE\0BOSCH\0")]);
        let tokens: BTreeSet<String> = ["edc17c46".to_string()].into_iter().collect();
        let ranked = corpus.similar_by_tokens(&tokens, DEFAULT_TOP_K);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].similarity, 1.0);
    }
}
