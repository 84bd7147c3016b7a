use ahash::AHashMap;
use core_types::{AnnParams, VectorId};
use parking_lot::RwLock;

use super::{NearestNeighborService, Neighbor};
use crate::error::{IndexError, IndexResult, check_dims};
use crate::maxsim::dot;
use crate::rank::top_k_positions;

#[derive(Debug, Default)]
struct FlatState {
    /// Row-major vectors in insertion order.
    vectors: Vec<f32>,
    ids: Vec<VectorId>,
    slots: AHashMap<VectorId, usize>,
}

/// Exhaustive inner-product scan.
///
/// Scores are computed with the same [`dot`] the MaxSim scorer uses, so an
/// approximate search that fetches every vector reproduces exact scores.
#[derive(Debug)]
pub struct FlatIndex {
    dim: usize,
    state: RwLock<FlatState>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            state: RwLock::new(FlatState::default()),
        }
    }
}

impl NearestNeighborService for FlatIndex {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.state.read().ids.len()
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

        let mut state = self.state.write();
        for (vector, &id) in vectors.iter().zip(ids) {
            if let Some(&slot) = state.slots.get(&id) {
                let start = slot * self.dim;
                state.vectors[start..start + self.dim].copy_from_slice(vector);
                continue;
            }
            let slot = state.ids.len();
            state.vectors.extend_from_slice(vector);
            state.ids.push(id);
            state.slots.insert(id, slot);
        }
        Ok(())
    }

    fn query(&self, vector: &[f32], n: usize, _params: &AnnParams) -> IndexResult<Vec<Neighbor>> {
        check_dims(&[vector], self.dim)?;
        let state = self.state.read();
        let sims: Vec<f32> = state
            .vectors
            .chunks_exact(self.dim)
            .map(|row| dot(vector, row))
            .collect();
        Ok(top_k_positions(&sims, n)
            .into_iter()
            .map(|(slot, similarity)| Neighbor {
                id: state.ids[slot],
                similarity,
            })
            .collect())
    }
}
