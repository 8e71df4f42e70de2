use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

/// Intersection over union. Two empty sets are identical (`1.0`); an empty set
/// against a non-empty one scores `0.0`.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|item| large.contains(item)).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Items present in both sets
    pub matched: usize,

    /// `matched / min(|a|, |b|)`, with the denominator floored at one
    pub ratio: f64,
}

/// Containment-style overlap used for token sets, where a short upload should
/// still score highly against a long reference.
pub fn overlap_ratio<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> Overlap {
    let matched = a.intersection(b).count();
    let denominator = a.len().min(b.len()).max(1);
    Overlap {
        matched,
        ratio: matched as f64 / denominator as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn hs(items: &[u32]) -> HashSet<u32> {
        items.iter().copied().collect()
    }

    #[test]
    fn jaccard_conventions() {
        assert_eq!(jaccard(&hs(&[]), &hs(&[])), 1.0);
        assert_eq!(jaccard(&hs(&[]), &hs(&[1])), 0.0);
        assert_eq!(jaccard(&hs(&[1, 2]), &hs(&[3])), 0.0);
        assert_eq!(jaccard(&hs(&[1, 2, 3]), &hs(&[2, 3, 4])), 0.5);
    }

    #[test]
    fn overlap_uses_smaller_set() {
        let a: BTreeSet<&str> = ["ecu", "edc17", "tdi"].into_iter().collect();
        let b: BTreeSet<&str> = ["edc17", "tdi", "x", "y", "z"].into_iter().collect();
        let overlap = overlap_ratio(&a, &b);
        assert_eq!(overlap.matched, 2);
        assert!((overlap.ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn overlap_of_empty_sets_is_zero() {
        let empty: BTreeSet<String> = BTreeSet::new();
        assert_eq!(overlap_ratio(&empty, &empty), Overlap { matched: 0, ratio: 0.0 });
    }

    proptest! {
        #[test]
        fn jaccard_of_set_with_itself_is_one(items in proptest::collection::hash_set(any::<u32>(), 1..64)) {
            prop_assert_eq!(jaccard(&items, &items), 1.0);
        }

        #[test]
        fn jaccard_is_symmetric_and_bounded(
            a in proptest::collection::hash_set(0u32..32, 0..16),
            b in proptest::collection::hash_set(0u32..32, 0..16),
        ) {
            let ab = jaccard(&a, &b);
            prop_assert_eq!(ab, jaccard(&b, &a));
            prop_assert!((0.0..=1.0).contains(&ab));
        }

        #[test]
        fn disjoint_sets_score_zero(
            a in proptest::collection::hash_set(0u32..100, 0..16),
            b in proptest::collection::hash_set(100u32..200, 1..16),
        ) {
            prop_assert_eq!(jaccard(&a, &b), 0.0);
        }
    }
}
