//! ANN-accelerated MaxSim.
//!
//! Every query vector asks the backend for its `k × overfetch` nearest stored
//! vectors. Within that candidate list the best hit per document is that
//! query vector's MaxSim term for the document; the terms are summed across
//! query vectors. A term is exact when the document's true best vector made
//! the candidate list. When none of the document's vectors made it, the term
//! is charged [`MISSING_TERM_SCORE`], the lowest similarity two unit vectors
//! can have, so the accumulated score never exceeds the true MaxSim score.
//!
//! Ties rank in document registration order, the same as exact search.

use core_types::{AnnParams, ScoredDoc};
use indexmap::IndexMap;

use crate::ann::NearestNeighborService;
use crate::error::IndexResult;
use crate::query::QueryVectorSet;
use crate::rank::{CandidateScores, top_k};
use crate::registry::DocumentVectorRegistry;

pub const DEFAULT_OVERFETCH_MULTIPLIER: usize = 20;

/// Term charged to a document absent from a query vector's candidates.
pub const MISSING_TERM_SCORE: f32 = -1.0;

pub struct ApproximateSearchEngine<'a, S: NearestNeighborService + ?Sized> {
    registry: &'a DocumentVectorRegistry,
    service: &'a S,
    overfetch_multiplier: usize,
}

impl<'a, S: NearestNeighborService + ?Sized> ApproximateSearchEngine<'a, S> {
    pub const fn new(registry: &'a DocumentVectorRegistry, service: &'a S) -> Self {
        Self {
            registry,
            service,
            overfetch_multiplier: DEFAULT_OVERFETCH_MULTIPLIER,
        }
    }

    /// Override the candidate multiplier; values below 1 are treated as 1.
    #[must_use]
    pub fn with_overfetch_multiplier(mut self, multiplier: usize) -> Self {
        self.overfetch_multiplier = multiplier.max(1);
        self
    }

    /// Top `k` documents by reconstructed MaxSim, ties in registration order.
    ///
    /// Backend errors propagate unchanged. Ids the registry cannot resolve
    /// are skipped.
    pub fn search(
        &self,
        query: &QueryVectorSet,
        k: usize,
        params: &AnnParams,
    ) -> IndexResult<Vec<ScoredDoc>> {
        let total = self.service.len();
        if total == 0 || query.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let n = k.saturating_mul(self.overfetch_multiplier).min(total);

        // ordinal -> (sum of found terms, query vectors that found the doc)
        let mut accumulator: IndexMap<usize, (f32, usize), ahash::RandomState> =
            IndexMap::default();
        let mut per_vector: CandidateScores<usize> = CandidateScores::default();
        let mut candidates = 0usize;
        let mut unresolved = 0usize;

        for q in query.vectors() {
            let hits = self.service.query(q, n, params)?;
            if hits.len() > n {
                tracing::warn!(
                    backend = self.service.name(),
                    requested = n,
                    returned = hits.len(),
                    "backend returned more candidates than requested"
                );
            }

            per_vector.clear();
            for hit in hits.iter().take(n) {
                candidates += 1;
                let Some(ordinal) = self.registry.resolve_ordinal(hit.id) else {
                    unresolved += 1;
                    tracing::trace!(vector_id = %hit.id, "skipping id unknown to registry");
                    continue;
                };
                per_vector
                    .entry(ordinal)
                    .and_modify(|best| *best = best.max(hit.similarity))
                    .or_insert(hit.similarity);
            }

            for (&ordinal, &best) in &per_vector {
                let (sum, found) = accumulator.entry(ordinal).or_insert((0.0, 0));
                *sum += best;
                *found += 1;
            }
        }

        let mut scores: CandidateScores<usize> = accumulator
            .into_iter()
            .map(|(ordinal, (sum, found))| {
                let missing = query.len() - found;
                let score = if missing == 0 {
                    sum
                } else {
                    (missing as f32).mul_add(MISSING_TERM_SCORE, sum)
                };
                (ordinal, score)
            })
            .collect();
        scores.sort_keys();

        tracing::debug!(
            backend = self.service.name(),
            query_vectors = query.len(),
            per_vector_n = n,
            candidates,
            unresolved,
            docs = scores.len(),
            k,
            "approximate search"
        );

        Ok(top_k(&scores, k)
            .into_iter()
            .filter_map(|(ordinal, score)| {
                self.registry.doc_id(ordinal).map(|doc_id| ScoredDoc {
                    doc_id: doc_id.clone(),
                    score,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ann::{FlatIndex, Neighbor};
    use crate::error::IndexError;
    use crate::exact::ExactSearchEngine;
    use core_types::VectorId;

    fn build(docs: &[(&str, Vec<[f32; 2]>)]) -> (DocumentVectorRegistry, FlatIndex) {
        let mut reg = DocumentVectorRegistry::new(2).unwrap();
        let flat = FlatIndex::new(2);
        for (doc_id, vectors) in docs {
            let batch = reg.prepare(vectors).unwrap();
            flat.index(batch.vectors(), &batch.ids()).unwrap();
            reg.commit((*doc_id).into(), batch).unwrap();
        }
        (reg, flat)
    }

    fn query(vectors: &[[f32; 2]]) -> QueryVectorSet {
        QueryVectorSet::new(vectors, 2).unwrap()
    }

    #[test]
    fn full_overfetch_matches_exact() {
        let (reg, flat) = build(&[
            ("d1", vec![[1.0, 0.0], [0.0, 1.0]]),
            ("d2", vec![[0.7, 0.7]]),
            ("d3", vec![[0.2, 0.9], [-1.0, 0.1]]),
        ]);
        let q = query(&[[1.0, 0.2], [0.1, 1.0]]);
        let exact = ExactSearchEngine::new(&reg).search(&q, 3);
        let approx = ApproximateSearchEngine::new(&reg, &flat)
            .search(&q, 3, &AnnParams::default())
            .unwrap();
        assert_eq!(exact, approx);
    }

    #[test]
    fn small_window_underestimates() {
        // d2's only vector is far from q, so with n = 1 it never shows up and
        // d1 keeps its exact score.
        let (reg, flat) = build(&[
            ("d1", vec![[1.0, 0.0]]),
            ("d2", vec![[0.0, 1.0]]),
        ]);
        let q = query(&[[1.0, 0.0]]);
        let approx = ApproximateSearchEngine::new(&reg, &flat)
            .with_overfetch_multiplier(1)
            .search(&q, 1, &AnnParams::default())
            .unwrap();
        assert_eq!(approx.len(), 1);
        assert_eq!(approx[0].doc_id.as_str(), "d1");
        assert!((approx[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_backend_yields_nothing() {
        let reg = DocumentVectorRegistry::new(2).unwrap();
        let flat = FlatIndex::new(2);
        let hits = ApproximateSearchEngine::new(&reg, &flat)
            .search(&query(&[[1.0, 0.0]]), 5, &AnnParams::default())
            .unwrap();
        assert!(hits.is_empty());
    }

    /// Backend that knows about ids the registry never issued.
    struct StaleBackend;

    impl NearestNeighborService for StaleBackend {
        fn name(&self) -> &'static str {
            "stale"
        }
        fn dim(&self) -> usize {
            2
        }
        fn len(&self) -> usize {
            3
        }
        fn index(&self, _: &[Vec<f32>], _: &[VectorId]) -> IndexResult<()> {
            Ok(())
        }
        fn query(&self, _: &[f32], _: usize, _: &AnnParams) -> IndexResult<Vec<Neighbor>> {
            Ok(vec![
                Neighbor {
                    id: VectorId(99),
                    similarity: 0.99,
                },
                Neighbor {
                    id: VectorId(0),
                    similarity: 0.5,
                },
            ])
        }
    }

    #[test]
    fn unresolved_ids_are_skipped() {
        let mut reg = DocumentVectorRegistry::new(2).unwrap();
        reg.add_document("known", &[[1.0f32, 0.0]]).unwrap();
        let hits = ApproximateSearchEngine::new(&reg, &StaleBackend)
            .search(&query(&[[1.0, 0.0]]), 2, &AnnParams::default())
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id.as_str(), "known");
        assert!((hits[0].score - 0.5).abs() < 1e-6);
    }

    struct FailingBackend;

    impl NearestNeighborService for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn dim(&self) -> usize {
            2
        }
        fn len(&self) -> usize {
            1
        }
        fn index(&self, _: &[Vec<f32>], _: &[VectorId]) -> IndexResult<()> {
            Ok(())
        }
        fn query(&self, _: &[f32], _: usize, _: &AnnParams) -> IndexResult<Vec<Neighbor>> {
            Err(IndexError::Backend("disk on fire".into()))
        }
    }

    #[test]
    fn backend_errors_propagate() {
        let reg = DocumentVectorRegistry::new(2).unwrap();
        let err = ApproximateSearchEngine::new(&reg, &FailingBackend)
            .search(&query(&[[1.0, 0.0]]), 1, &AnnParams::default())
            .unwrap_err();
        assert!(matches!(err, IndexError::Backend(_)));
    }

    #[test]
    fn ties_follow_registration_order() {
        // "b" is indexed first in the backend but "a" is registered first
        let mut reg = DocumentVectorRegistry::new(2).unwrap();
        let flat = FlatIndex::new(2);
        let a = reg.prepare(&[[1.0f32, 0.0]]).unwrap();
        let a_ids = a.ids();
        let a_vecs = a.vectors().to_vec();
        reg.commit("a".into(), a).unwrap();
        let b = reg.prepare(&[[1.0f32, 0.0]]).unwrap();
        flat.index(b.vectors(), &b.ids()).unwrap();
        reg.commit("b".into(), b).unwrap();
        flat.index(&a_vecs, &a_ids).unwrap();

        let hits = ApproximateSearchEngine::new(&reg, &flat)
            .search(&query(&[[1.0, 0.0]]), 2, &AnnParams::default())
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn tied_scores_rank_like_exact() {
        // a and b both score 0.6 + 0.8, but b is closer to the first query
        // vector and shows up first in its candidate list
        let (reg, flat) = build(&[("a", vec![[0.6, 0.8]]), ("b", vec![[0.8, 0.6]])]);
        let q = query(&[[1.0, 0.0], [0.0, 1.0]]);
        let exact = ExactSearchEngine::new(&reg).search(&q, 2);
        let approx = ApproximateSearchEngine::new(&reg, &flat)
            .search(&q, 2, &AnnParams::default())
            .unwrap();
        assert_eq!(exact, approx);
        assert_eq!(approx[0].doc_id.as_str(), "a");
    }

    #[test]
    fn missing_terms_never_overestimate() {
        // with n = 2 the second query vector only sees a and b, so x is
        // charged the floor for that term instead of 0
        let (reg, flat) = build(&[
            ("x", vec![[1.0, -0.5]]),
            ("a", vec![[-1.0, 0.1]]),
            ("b", vec![[-1.0, 0.05]]),
        ]);
        let q = query(&[[1.0, 0.0], [0.0, 1.0]]);
        let exact = ExactSearchEngine::new(&reg).search(&q, 3);
        let approx = ApproximateSearchEngine::new(&reg, &flat)
            .with_overfetch_multiplier(1)
            .search(&q, 2, &AnnParams::default())
            .unwrap();
        assert!(!approx.is_empty());
        for hit in &approx {
            let truth = exact.iter().find(|e| e.doc_id == hit.doc_id).unwrap();
            assert!(hit.score <= truth.score + 1e-6, "{hit:?} > {truth:?}");
        }
        let x = approx.iter().find(|h| h.doc_id.as_str() == "x").unwrap();
        assert!((x.score - (0.894_427_2 - 1.0)).abs() < 1e-5);
    }
}
