use core_types::ScoredDoc;
use rayon::prelude::*;

use crate::maxsim::maxsim;
use crate::query::QueryVectorSet;
use crate::rank::{CandidateScores, top_k};
use crate::registry::DocumentVectorRegistry;

/// Brute-force MaxSim over every registered document.
///
/// Cost is `docs × vectors/doc × query vectors`; this is the reference
/// answer the approximate engine is measured against.
#[derive(Debug, Clone, Copy)]
pub struct ExactSearchEngine<'a> {
    registry: &'a DocumentVectorRegistry,
}

impl<'a> ExactSearchEngine<'a> {
    pub const fn new(registry: &'a DocumentVectorRegistry) -> Self {
        Self { registry }
    }

    /// Top `k` documents by MaxSim, ties in registration order.
    pub fn search(&self, query: &QueryVectorSet, k: usize) -> Vec<ScoredDoc> {
        if query.is_empty() || k == 0 || self.registry.is_empty() {
            return Vec::new();
        }

        let registry = self.registry;
        let scores: Vec<Option<f32>> = (0..registry.num_documents())
            .into_par_iter()
            .map(|ordinal| maxsim(query.vectors(), &registry.doc_vectors(ordinal)))
            .collect();

        // Documents without vectors have no score and are left out.
        let candidates: CandidateScores<usize> = scores
            .into_iter()
            .enumerate()
            .filter_map(|(ordinal, score)| score.map(|s| (ordinal, s)))
            .collect();

        tracing::debug!(
            docs = registry.num_documents(),
            scored = candidates.len(),
            query_vectors = query.len(),
            k,
            "exact search"
        );

        top_k(&candidates, k)
            .into_iter()
            .filter_map(|(ordinal, score)| {
                registry.doc_id(ordinal).map(|doc_id| ScoredDoc {
                    doc_id: doc_id.clone(),
                    score,
                })
            })
            .collect()
    }
}
