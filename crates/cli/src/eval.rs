//! Retrieval quality metrics.

use ahash::AHashSet;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievalMetrics {
    pub k: usize,
    pub recall_at_k: f64,
    pub mrr: f64,
    /// Queries searched.
    pub num_queries: usize,
    /// Queries with judgments; the MRR denominator.
    pub judged_queries: usize,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Recall@k and MRR over the queries that have judgments.
///
/// Recall averages only queries with at least one relevant document; MRR
/// counts a judged query with no relevant hit in the top `k` as 0.
pub fn evaluate(
    results: &IndexMap<String, Vec<String>>,
    qrels: &IndexMap<String, Vec<String>>,
    k: usize,
) -> RetrievalMetrics {
    let mut recalls = Vec::new();
    let mut reciprocal_ranks = Vec::new();

    for (query_id, retrieved) in results {
        let Some(relevant) = qrels.get(query_id) else {
            continue;
        };
        let relevant: AHashSet<&str> = relevant.iter().map(String::as_str).collect();
        let top = &retrieved[..retrieved.len().min(k)];

        if !relevant.is_empty() {
            let found = top
                .iter()
                .map(String::as_str)
                .collect::<AHashSet<_>>()
                .intersection(&relevant)
                .count();
            recalls.push(found as f64 / relevant.len() as f64);
        }

        let rr = top
            .iter()
            .position(|doc| relevant.contains(doc.as_str()))
            .map_or(0.0, |rank| 1.0 / (rank + 1) as f64);
        reciprocal_ranks.push(rr);
    }

    RetrievalMetrics {
        k,
        recall_at_k: mean(&recalls),
        mrr: mean(&reciprocal_ranks),
        num_queries: results.len(),
        judged_queries: reciprocal_ranks.len(),
    }
}

/// Mean fraction of each reference top-k list recovered by the candidate
/// list, e.g. approximate hits measured against exact hits.
pub fn overlap_at_k(
    reference: &IndexMap<String, Vec<String>>,
    candidate: &IndexMap<String, Vec<String>>,
    k: usize,
) -> f64 {
    let overlaps: Vec<f64> = reference
        .iter()
        .filter(|(_, truth)| !truth.is_empty())
        .map(|(query_id, truth)| {
            let truth: AHashSet<&str> = truth.iter().take(k).map(String::as_str).collect();
            let found = candidate.get(query_id).map_or(0, |hits| {
                hits.iter()
                    .take(k)
                    .filter(|doc| truth.contains(doc.as_str()))
                    .count()
            });
            found as f64 / truth.len() as f64
        })
        .collect();
    mean(&overlaps)
}
