//! Top-k selection shared by both engines.

use indexmap::IndexMap;
use std::cmp::Ordering;

/// Transient `doc -> running score` map for one search call.
///
/// Iteration order is the order documents were first inserted, which is the
/// tie-break order for ranking.
pub type CandidateScores<K> = IndexMap<K, f32, ahash::RandomState>;

/// Descending by score, then ascending by position.
#[inline]
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// Indices and scores of the best `k` entries of `scores`, ordered by
/// descending score with ties broken by lower index first.
pub fn top_k_positions(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, rank_order);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(rank_order);
    ranked
}

/// Best `min(k, scores.len())` entries by descending score, stable with
/// respect to insertion order on ties.
pub fn top_k<K: Clone>(scores: &CandidateScores<K>, k: usize) -> Vec<(K, f32)> {
    let values: Vec<f32> = scores.values().copied().collect();
    top_k_positions(&values, k)
        .into_iter()
        .filter_map(|(pos, score)| scores.get_index(pos).map(|(key, _)| (key.clone(), score)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(entries: &[(&'static str, f32)]) -> CandidateScores<&'static str> {
        entries.iter().copied().collect()
    }

    #[test]
    fn orders_by_descending_score() {
        let s = scores(&[("a", 0.1), ("b", 0.9), ("c", 0.5)]);
        assert_eq!(top_k(&s, 3), vec![("b", 0.9), ("c", 0.5), ("a", 0.1)]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let s = scores(&[("x", 1.0), ("y", 2.0), ("z", 1.0), ("w", 1.0)]);
        assert_eq!(
            top_k(&s, 3),
            vec![("y", 2.0), ("x", 1.0), ("z", 1.0)]
        );
    }

    #[test]
    fn k_larger_than_candidates() {
        let s = scores(&[("a", 1.0)]);
        assert_eq!(top_k(&s, 10).len(), 1);
        assert!(top_k(&s, 0).is_empty());
        assert!(top_k(&CandidateScores::<&str>::default(), 5).is_empty());
    }

    #[test]
    fn partial_selection_matches_full_sort() {
        let values: Vec<f32> = (0..100).map(|i| ((i * 37) % 17) as f32).collect();
        let full = top_k_positions(&values, values.len());
        let partial = top_k_positions(&values, 10);
        assert_eq!(&full[..10], partial.as_slice());
    }
}
