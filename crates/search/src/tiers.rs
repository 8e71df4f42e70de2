use crate::engine::UploadSignals;
use ecu_ident_indexer::{DescriptionEntry, SimilarBinary};
use std::collections::BTreeSet;

const LABEL_POINTS: u32 = 15;
const FOLDER_POINTS: u32 = 10;
const IDENTIFIER_POINTS: u32 = 4;
const PART_NUMBER_POINTS: u32 = 8;
const SOFTWARE_ID_POINTS: u32 = 10;

// Caps bound the examples reported in `hits`, not the score.
const MAX_IDENTIFIER_EXAMPLES: usize = 25;
const MAX_PART_NUMBER_EXAMPLES: usize = 10;
const MAX_SOFTWARE_ID_EXAMPLES: usize = 10;

/// Signal tiers in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    ExactHash,
    ChunkSimilarity,
    KgramSimilarity,
    TokenOverlap,
    Metadata,
}

impl Tier {
    /// Points awarded for a similarity of 1.0.
    pub fn max_score(self) -> u32 {
        match self {
            Tier::ExactHash => 100,
            Tier::ChunkSimilarity => 60,
            Tier::KgramSimilarity => 70,
            Tier::TokenOverlap => 50,
            Tier::Metadata => 0,
        }
    }

    pub fn similarity_score(self, similarity: f64) -> u32 {
        (similarity * f64::from(self.max_score())).round() as u32
    }

    /// Reasons attached to a description surfaced through a similar binary.
    pub fn similarity_reasons(self, similar: &SimilarBinary) -> Vec<String> {
        let headline = match self {
            Tier::ChunkSimilarity => "Similar to known BIN (fixed chunks)",
            Tier::KgramSimilarity => "Similar to known BIN (k-grams)",
            _ => "Similar BIN by ASCII tokens",
        };
        vec![
            format!("{headline}: {}%", similar.percent()),
            format!("BIN: {}", similar.path.display()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataMatch {
    pub score: u32,
    pub reasons: Vec<String>,
    pub hits: Vec<String>,
}

/// Heuristic score of one description against the upload's file name and
/// text signals. `None` when nothing matched.
pub fn metadata_match(entry: &DescriptionEntry, upload: &UploadSignals) -> Option<MetadataMatch> {
    let mut score = 0;
    let mut reasons = Vec::new();
    let mut hits = Vec::new();

    if upload.name_tokens.contains(&entry.label.to_lowercase()) {
        score += LABEL_POINTS;
        reasons.push(format!("Filename token matched label '{}'", entry.label));
        hits.push(entry.label.clone());
    }

    if let Some(folder) = entry.dir_name().filter(|name| !name.is_empty()) {
        if upload.name_tokens.contains(&folder.to_lowercase()) {
            score += FOLDER_POINTS;
            reasons.push(format!("Filename token matched folder '{folder}'"));
            hits.push(folder.to_string());
        }
    }

    let identifiers = intersect(&upload.tokens, &entry.signals.identifiers, MAX_IDENTIFIER_EXAMPLES);
    if identifiers.count > 0 {
        score += identifiers.count as u32 * IDENTIFIER_POINTS;
        reasons.push(format!("Matched {} identifier token(s)", identifiers.count));
        hits.extend(identifiers.examples);
    }

    let part_numbers = intersect(
        &upload.part_numbers,
        &entry.signals.part_numbers,
        MAX_PART_NUMBER_EXAMPLES,
    );
    if part_numbers.count > 0 {
        score += part_numbers.count as u32 * PART_NUMBER_POINTS;
        reasons.push(format!("Matched {} part number(s)", part_numbers.count));
        hits.extend(part_numbers.examples);
    }

    let software_ids = intersect(
        &upload.software_ids,
        &entry.signals.software_ids,
        MAX_SOFTWARE_ID_EXAMPLES,
    );
    if software_ids.count > 0 {
        score += software_ids.count as u32 * SOFTWARE_ID_POINTS;
        reasons.push(format!("Matched {} SW ID(s)", software_ids.count));
        hits.extend(software_ids.examples);
    }

    (score > 0).then_some(MetadataMatch {
        score,
        reasons,
        hits,
    })
}

struct Intersection {
    count: usize,
    examples: Vec<String>,
}

fn intersect(upload: &BTreeSet<String>, known: &BTreeSet<String>, max_examples: usize) -> Intersection {
    let mut count = 0;
    let mut examples = Vec::new();
    for item in upload.intersection(known) {
        count += 1;
        if examples.len() < max_examples {
            examples.push(item.clone());
        }
    }
    Intersection { count, examples }
}
