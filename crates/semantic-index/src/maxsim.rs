//! MaxSim late-interaction scoring.
//!
//! ```text
//! MaxSim(Q, D) = Σᵢ maxⱼ ⟨qᵢ, dⱼ⟩
//! ```
//!
//! Both sides are expected to be unit-norm already, so the inner product is
//! the cosine similarity.

/// Inner product of two equal-length vectors.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Sum over query vectors of each one's best similarity within `doc`.
///
/// Returns `None` when `doc` is empty (such a document has no score and must
/// not be ranked) and `Some(0.0)` when `query` is empty.
pub fn maxsim<Q, D>(query: &[Q], doc: &[D]) -> Option<f32>
where
    Q: AsRef<[f32]>,
    D: AsRef<[f32]>,
{
    if doc.is_empty() {
        return None;
    }
    let mut score = 0.0f32;
    for q in query {
        let q = q.as_ref();
        let best = doc
            .iter()
            .map(|d| dot(q, d.as_ref()))
            .fold(f32::NEG_INFINITY, f32::max);
        score += best;
    }
    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use proptest::prelude::*;

    #[test]
    fn picks_best_doc_vector_per_query_vector() {
        let query = [[1.0f32, 0.0], [0.0, 1.0]];
        let doc = [[1.0f32, 0.0], [0.6, 0.8]];
        // q0 best = 1.0, q1 best = 0.8
        let score = maxsim(&query, &doc).unwrap();
        assert!((score - 1.8).abs() < 1e-6);
    }

    #[test]
    fn empty_doc_has_no_score() {
        let doc: [[f32; 2]; 0] = [];
        assert_eq!(maxsim(&[[1.0f32, 0.0]], &doc), None);
    }

    #[test]
    fn empty_query_scores_zero() {
        let query: [[f32; 2]; 0] = [];
        assert_eq!(maxsim(&query, &[[1.0f32, 0.0]]), Some(0.0));
    }

    #[test]
    fn zero_vectors_score_zero() {
        assert_eq!(maxsim(&[[1.0f32, 0.0]], &[[0.0f32, 0.0]]), Some(0.0));
    }

    #[test]
    fn not_symmetric() {
        let q = normalize(&[[1.0f32, 0.0], [0.0, 1.0]]);
        let d = normalize(&[[1.0f32, 0.0]]);
        let qd = maxsim(&q, &d).unwrap();
        let dq = maxsim(&d, &q).unwrap();
        assert!((qd - 1.0).abs() < 1e-6);
        assert!((dq - 1.0).abs() < 1e-6);
        let d2 = normalize(&[[1.0f32, 0.0], [0.0, 1.0], [0.6, 0.8]]);
        assert!((maxsim(&q, &d2).unwrap() - maxsim(&d2, &q).unwrap()).abs() > 0.1);
    }

    fn vectors(dim: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
        prop::collection::vec(prop::collection::vec(-1.0f32..1.0, dim), 1..8)
    }

    proptest! {
        #[test]
        fn invariant_under_reordering(
            q in vectors(4),
            d in vectors(4),
            seed in any::<u64>(),
        ) {
            let q = normalize(&q);
            let d = normalize(&d);
            let base = maxsim(&q, &d).unwrap();

            let mut q_rev = q.clone();
            q_rev.reverse();
            let mut d_rot = d.clone();
            d_rot.rotate_left((seed as usize) % d.len());

            let permuted = maxsim(&q_rev, &d_rot).unwrap();
            prop_assert!((base - permuted).abs() < 1e-4);
        }
    }
}
