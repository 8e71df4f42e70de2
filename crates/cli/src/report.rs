use ecu_ident_indexer::{BinaryEntry, CorpusIndex, DescriptionEntry, IndexStats};
use ecu_ident_protocol::IdentifyReport;
use serde::Serialize;
use std::path::Path;

/// Corpus summary printed by `index`.
#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub corpus_root: Option<String>,
    pub chunk_size: usize,
    pub kgram_k: usize,
    pub kgram_step: usize,
    #[serde(flatten)]
    pub stats: IndexStats,
}

impl IndexSummary {
    pub fn from_corpus(corpus: &CorpusIndex) -> Self {
        let config = corpus.fingerprint_engine().config();
        Self {
            corpus_root: corpus.corpus_root().map(display_path),
            chunk_size: config.chunk_size,
            kgram_k: config.kgram_k,
            kgram_step: config.kgram_step,
            stats: corpus.stats().clone(),
        }
    }
}

/// Binary listing row. Hash sets are reported by size only.
#[derive(Debug, Serialize)]
pub struct BinarySummary {
    pub path: String,
    pub content_hash: String,
    pub size_bytes: u64,
    pub chunks: usize,
    pub kgrams: usize,
    pub tokens: usize,
    pub associated_descriptions: Vec<String>,
}

impl From<&BinaryEntry> for BinarySummary {
    fn from(entry: &BinaryEntry) -> Self {
        Self {
            path: display_path(&entry.path),
            content_hash: entry.content_hash.clone(),
            size_bytes: entry.size_bytes,
            chunks: entry.chunk_hashes.len(),
            kgrams: entry.kgram_hashes.len(),
            tokens: entry.ascii_tokens.len(),
            associated_descriptions: entry
                .associated_descriptions
                .iter()
                .map(|p| display_path(p))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HashLookup {
    pub content_hash: String,
    pub descriptions: Vec<String>,
}

pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn render_index(summary: &IndexSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Corpus root: {}\n",
        summary.corpus_root.as_deref().unwrap_or("(not configured)")
    ));
    out.push_str(&format!(
        "Fingerprint: chunk_size={} kgram_k={} kgram_step={}\n",
        summary.chunk_size, summary.kgram_k, summary.kgram_step
    ));
    let stats = &summary.stats;
    out.push_str(&format!(
        "Indexed {} description(s), {} binary(ies) ({} associated) in {} director(ies), {} ms\n",
        stats.descriptions,
        stats.binaries,
        stats.associated_binaries,
        stats.directories,
        stats.time_ms
    ));
    if stats.skipped > 0 || !stats.errors.is_empty() {
        out.push_str(&format!("Skipped {} file(s)\n", stats.skipped));
        for error in stats.errors.iter().take(10) {
            out.push_str(&format!("  - {error}\n"));
        }
    }
    out.trim_end().to_string()
}

pub fn render_identify(report: &IdentifyReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Upload: {} byte(s), sha1 {}\n",
        report.received_bytes, report.content_hash
    ));

    if report.has_candidates() {
        for (rank, m) in report.matches.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {} [score {}]\n   {}\n",
                rank + 1,
                m.label,
                m.score,
                m.description_path
            ));
            for reason in &m.reasons {
                out.push_str(&format!("   - {reason}\n"));
            }
            if !m.hits.is_empty() {
                out.push_str(&format!("   hits: {}\n", m.hits.join(", ")));
            }
        }
    } else {
        out.push_str("\nNo candidate descriptions found.\n");
    }

    if let Some(diag) = &report.diagnostics {
        out.push_str(&format!(
            "\nCorpus: {} ({} description(s), {} binary(ies))\n",
            diag.corpus_root.as_deref().unwrap_or("(not configured)"),
            diag.indexed.descriptions,
            diag.indexed.binaries
        ));
        for note in &diag.notes {
            out.push_str(&format!("note: {note}\n"));
        }
    }
    out.trim_end().to_string()
}

pub fn render_descriptions(entries: &[DescriptionEntry]) -> String {
    if entries.is_empty() {
        return "No descriptions indexed.".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{}\t{}\tids={} parts={} sw={}\n",
            entry.label,
            entry.path.display(),
            entry.signals.identifiers.len(),
            join_set(&entry.signals.part_numbers),
            join_set(&entry.signals.software_ids),
        ));
    }
    out.trim_end().to_string()
}

pub fn render_binaries(rows: &[BinarySummary]) -> String {
    if rows.is_empty() {
        return "No binaries indexed.".to_string();
    }
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{}  {}  {} bytes  chunks={} kgrams={}\n",
            row.content_hash, row.path, row.size_bytes, row.chunks, row.kgrams
        ));
        for desc in &row.associated_descriptions {
            out.push_str(&format!("    -> {desc}\n"));
        }
    }
    out.trim_end().to_string()
}

pub fn render_hash_lookup(lookup: &HashLookup) -> String {
    if lookup.descriptions.is_empty() {
        return format!("No binary with hash {} is indexed.", lookup.content_hash);
    }
    lookup.descriptions.join("\n")
}

fn join_set(items: &std::collections::BTreeSet<String>) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecu_ident_protocol::{Diagnostics, IndexedCounts, MatchResult};

    #[test]
    fn identify_lists_reasons_and_hits() {
        let report = IdentifyReport {
            ok: true,
            content_hash: "ab".repeat(20),
            received_bytes: 4,
            matches: vec![MatchResult {
                description_path: "/corpus/ME7/ME7.a2l".to_string(),
                label: "ME7".to_string(),
                score: 100,
                reasons: vec!["Exact BIN hash match".to_string()],
                hits: vec!["1037508389".to_string()],
            }],
            diagnostics: None,
        };

        let text = render_identify(&report);
        assert!(text.contains("1. ME7 [score 100]"));
        assert!(text.contains("- Exact BIN hash match"));
        assert!(text.contains("hits: 1037508389"));
        assert!(!text.contains("note:"));
    }

    #[test]
    fn empty_identify_prints_notes() {
        let report = IdentifyReport {
            ok: true,
            content_hash: "00".repeat(20),
            received_bytes: 1,
            matches: Vec::new(),
            diagnostics: Some(Diagnostics {
                corpus_root: None,
                indexed: IndexedCounts::default(),
                notes: vec!["Corpus root is not configured".to_string()],
            }),
        };

        let text = render_identify(&report);
        assert!(text.contains("No candidate descriptions found."));
        assert!(text.contains("(not configured)"));
        assert!(text.contains("note: Corpus root is not configured"));
    }

    #[test]
    fn hash_lookup_without_hits_says_so() {
        let lookup = HashLookup {
            content_hash: "beef".to_string(),
            descriptions: Vec::new(),
        };
        assert_eq!(
            render_hash_lookup(&lookup),
            "No binary with hash beef is indexed."
        );
    }
}
