use ahash::AHashSet;
use core_types::config::HnswConfig;
use core_types::{AnnParams, VectorId};
use hnsw_rs::prelude::*;
use parking_lot::Mutex;

use super::{NearestNeighborService, Neighbor};
use crate::error::{IndexError, IndexResult, check_dims};

/// HNSW graph over normalized vectors, ranked by inner product.
pub struct HnswIndex {
    dim: usize,
    index: Hnsw<'static, f32, DistDot>,
    /// Ids already inserted; hnsw_rs would otherwise store duplicates.
    indexed: Mutex<AHashSet<VectorId>>,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("dim", &self.dim)
            .field("len", &self.indexed.lock().len())
            .finish_non_exhaustive()
    }
}

impl HnswIndex {
    pub fn new(dim: usize, config: &HnswConfig) -> Self {
        tracing::info!(
            dim,
            max_degree = config.max_degree,
            ef_construction = config.ef_construction,
            "creating hnsw backend"
        );
        let index = Hnsw::new(
            config.max_degree,
            config.max_elements,
            config.max_layer,
            config.ef_construction,
            DistDot {},
        );
        Self {
            dim,
            index,
            indexed: Mutex::new(AHashSet::new()),
        }
    }
}

impl NearestNeighborService for HnswIndex {
    fn name(&self) -> &'static str {
        "hnsw"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.indexed.lock().len()
    }

    fn index(&self, vectors: &[Vec<f32>], ids: &[VectorId]) -> IndexResult<()> {
        if vectors.len() != ids.len() {
            return Err(IndexError::Backend(format!(
                "{} vectors supplied with {} ids",
                vectors.len(),
                ids.len()
            )));
        }
        check_dims(vectors, self.dim)?;

        let mut indexed = self.indexed.lock();
        for (vector, &id) in vectors.iter().zip(ids) {
            if !indexed.insert(id) {
                continue;
            }
            let data_id = usize::try_from(id.0)
                .map_err(|_| IndexError::Backend(format!("vector id {id} exceeds usize")))?;
            self.index.insert_slice((vector.as_slice(), data_id));
        }
        Ok(())
    }

    fn query(&self, vector: &[f32], n: usize, params: &AnnParams) -> IndexResult<Vec<Neighbor>> {
        check_dims(&[vector], self.dim)?;
        if n == 0 {
            return Ok(Vec::new());
        }
        let ef = params.ef_search.max(n);
        let hits = self
            .index
            .search(vector, n, ef)
            .into_iter()
            .take(n)
            .map(|hit| Neighbor {
                id: VectorId(hit.d_id as u64),
                // DistDot is 1 - <a, b> for unit vectors.
                similarity: 1.0 - hit.distance,
            })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_exact_match() {
        let hnsw = HnswIndex::new(2, &HnswConfig::default());
        hnsw.index(
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8]],
            &[VectorId(0), VectorId(1), VectorId(2)],
        )
        .unwrap();
        let hits = hnsw.query(&[0.0, 1.0], 1, &AnnParams::default()).unwrap();
        assert_eq!(hits[0].id, VectorId(1));
        assert!((hits[0].similarity - 1.0).abs() < 1e-5);
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let hnsw = HnswIndex::new(2, &HnswConfig::default());
        hnsw.index(&[vec![1.0, 0.0]], &[VectorId(0)]).unwrap();
        hnsw.index(&[vec![1.0, 0.0]], &[VectorId(0)]).unwrap();
        assert_eq!(hnsw.len(), 1);
    }
}
