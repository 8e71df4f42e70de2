use crate::tiers::Tier;
use ecu_ident_indexer::DescriptionEntry;
use ecu_ident_protocol::MatchResult;
use std::collections::HashSet;
use std::path::PathBuf;

/// A scored description together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub tier: Tier,
    pub result: MatchResult,
}

/// Candidates collected across tiers. A description path is accepted once;
/// later tiers cannot re-add or re-score it.
#[derive(Debug, Default)]
pub struct MatchSet {
    seen: HashSet<PathBuf>,
    candidates: Vec<Candidate>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entry: &DescriptionEntry) -> bool {
        self.seen.contains(&entry.path)
    }

    /// Returns `false` when the description was already matched.
    pub fn insert(
        &mut self,
        tier: Tier,
        entry: &DescriptionEntry,
        score: u32,
        reasons: Vec<String>,
        hits: Vec<String>,
    ) -> bool {
        if !self.seen.insert(entry.path.clone()) {
            return false;
        }
        self.candidates.push(Candidate {
            tier,
            result: MatchResult {
                description_path: entry.path.to_string_lossy().into_owned(),
                label: entry.label.clone(),
                score,
                reasons,
                hits,
            },
        });
        true
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}

/// Order by score descending, then tier priority, then description path, and
/// keep the first `limit`.
pub fn rank(mut candidates: Vec<Candidate>, limit: usize) -> Vec<MatchResult> {
    candidates.sort_by(|a, b| {
        b.result
            .score
            .cmp(&a.result.score)
            .then_with(|| a.tier.cmp(&b.tier))
            .then_with(|| a.result.description_path.cmp(&b.result.description_path))
    });
    candidates
        .into_iter()
        .take(limit)
        .map(|candidate| candidate.result)
        .collect()
}
