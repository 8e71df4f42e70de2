use crate::error::{Result, SearchError};
use crate::ranking::{rank, MatchSet};
use crate::tiers::{metadata_match, Tier};
use ecu_ident_fingerprint::{content_hash, ENV_KGRAM_STEP};
use ecu_ident_indexer::{CorpusIndex, SimilarBinary, DEFAULT_TOP_K};
use ecu_ident_protocol::{Diagnostics, IdentifyReport, IndexedCounts};
use ecu_ident_signals::{
    extract_part_numbers, extract_printable_runs, extract_software_ids, tokenize,
    DEFAULT_MIN_RUN_LEN,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Similar binaries considered per similarity tier
    pub top_k_binaries: usize,

    /// Results returned after ranking
    pub max_results: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            top_k_binaries: DEFAULT_TOP_K,
            max_results: 5,
        }
    }
}

/// Text signals of an upload. Part numbers and software ids are lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSignals {
    pub tokens: BTreeSet<String>,
    pub part_numbers: BTreeSet<String>,
    pub software_ids: BTreeSet<String>,
    pub name_tokens: BTreeSet<String>,
}

impl UploadSignals {
    pub fn from_upload(buf: &[u8], filename: &str) -> Self {
        let runs = extract_printable_runs(buf, DEFAULT_MIN_RUN_LEN);
        Self {
            tokens: tokenize(&runs),
            part_numbers: lowercase(extract_part_numbers(&runs)),
            software_ids: lowercase(extract_software_ids(&runs)),
            name_tokens: tokenize(&[filename]),
        }
    }
}

fn lowercase(items: BTreeSet<String>) -> BTreeSet<String> {
    items.into_iter().map(|s| s.to_ascii_lowercase()).collect()
}

/// Identifies uploads against a shared, frozen corpus. Cheap to clone and safe
/// to use from many tasks at once.
#[derive(Debug, Clone)]
pub struct IdentificationEngine {
    corpus: Arc<CorpusIndex>,
    options: EngineOptions,
}

impl IdentificationEngine {
    pub fn new(corpus: Arc<CorpusIndex>) -> Self {
        Self::with_options(corpus, EngineOptions::default())
    }

    pub fn with_options(corpus: Arc<CorpusIndex>, options: EngineOptions) -> Self {
        Self { corpus, options }
    }

    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    /// Rank candidate descriptions for `buf`, uploaded under `filename`.
    pub fn identify(&self, buf: &[u8], filename: &str) -> Result<IdentifyReport> {
        if buf.is_empty() {
            return Err(SearchError::EmptyUpload);
        }

        let corpus = self.corpus.as_ref();
        let top_k = self.options.top_k_binaries;
        let hash = content_hash(buf);
        let upload = UploadSignals::from_upload(buf, filename);
        let mut matches = MatchSet::new();

        for path in corpus.find_by_content_hash(&hash) {
            if let Some(entry) = corpus.description(path) {
                matches.insert(
                    Tier::ExactHash,
                    entry,
                    Tier::ExactHash.max_score(),
                    vec![format!("Exact BIN hash match: {hash}")],
                    Vec::new(),
                );
            }
        }
        log::debug!("Exact hash tier: {} match(es)", matches.len());

        self.surface_similar(
            &mut matches,
            Tier::ChunkSimilarity,
            corpus.similar_by_chunks(buf, top_k),
        );
        self.surface_similar(
            &mut matches,
            Tier::KgramSimilarity,
            corpus.similar_by_kgrams(buf, top_k),
        );
        self.surface_similar(
            &mut matches,
            Tier::TokenOverlap,
            corpus.similar_by_tokens(&upload.tokens, top_k),
        );

        for entry in corpus.descriptions() {
            if matches.contains(entry) {
                continue;
            }
            if let Some(found) = metadata_match(entry, &upload) {
                matches.insert(Tier::Metadata, entry, found.score, found.reasons, found.hits);
            }
        }
        log::debug!("{} candidate(s) before ranking", matches.len());

        let ranked = rank(matches.into_candidates(), self.options.max_results);
        let diagnostics = ranked.is_empty().then(|| self.diagnostics());

        Ok(IdentifyReport {
            ok: true,
            content_hash: hash,
            received_bytes: buf.len(),
            matches: ranked,
            diagnostics,
        })
    }

    fn surface_similar(&self, matches: &mut MatchSet, tier: Tier, similar: Vec<SimilarBinary>) {
        let before = matches.len();
        for binary in &similar {
            let score = tier.similarity_score(binary.similarity);
            for path in &binary.associated_descriptions {
                let Some(entry) = self.corpus.description(path) else {
                    continue;
                };
                matches.insert(tier, entry, score, tier.similarity_reasons(binary), Vec::new());
            }
        }
        log::debug!(
            "{tier:?} tier: {} similar binar(ies), {} new match(es)",
            similar.len(),
            matches.len() - before
        );
    }

    fn diagnostics(&self) -> Diagnostics {
        let corpus = self.corpus.as_ref();
        let mut notes = vec![
            "No candidates found. Verify the corpus root and that indexing completed before identification."
                .to_string(),
            format!("Increase k-gram sensitivity with {ENV_KGRAM_STEP}=8 and rebuild the index."),
        ];
        match corpus.corpus_root() {
            None => notes.push("Corpus root is not configured.".to_string()),
            Some(root) if !root.is_dir() => {
                notes.push(format!("Corpus root does not exist: {}", root.display()))
            }
            Some(_) if corpus.is_empty() => {
                notes.push("Corpus root contains no description or binary files.".to_string())
            }
            Some(_) => {}
        }

        Diagnostics {
            corpus_root: corpus
                .corpus_root()
                .map(|root| root.to_string_lossy().into_owned()),
            indexed: IndexedCounts {
                descriptions: corpus.descriptions().len(),
                binaries: corpus.binaries().len(),
            },
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_upload_is_an_explicit_failure() {
        let engine = IdentificationEngine::new(Arc::new(CorpusIndex::empty(None)));
        assert_eq!(engine.identify(b"", "x.bin"), Err(SearchError::EmptyUpload));
    }

    #[test]
    fn empty_corpus_reports_diagnostics() {
        let engine = IdentificationEngine::new(Arc::new(CorpusIndex::empty(None)));
        let report = engine.identify(b"\x00EDC17C46\x00", "x.bin").unwrap();

        assert!(report.ok);
        assert!(report.matches.is_empty());
        assert_eq!(report.received_bytes, 10);
        let diagnostics = report.diagnostics.expect("diagnostics");
        assert_eq!(diagnostics.corpus_root, None);
        assert_eq!(diagnostics.indexed, IndexedCounts::default());
        assert_eq!(diagnostics.notes.len(), 3);
        assert!(diagnostics.notes[1].contains("ECU_IDENT_KGRAM_STEP=8"));
    }

    #[test]
    fn upload_signals_lowercase_identifiers() {
        let upload = UploadSignals::from_upload(b"\xffSW 1037508389 PN 03L907309AB\xff", "EDC17_Stage1.bin");
        assert!(upload.part_numbers.contains("03l907309ab"));
        assert!(upload.software_ids.contains("1037508389"));
        assert!(upload.name_tokens.contains("edc17"));
        assert!(upload.name_tokens.contains("stage1"));
    }
}
