//! Nearest-neighbor backends consumed by the approximate engine.
//!
//! The backend owns the vector graph/scan; the index only ever hands it
//! normalized vectors under ids the registry allocated, and asks it for the
//! `n` most similar ids to one query vector at a time.

mod flat;
#[cfg(feature = "hnsw_rs")]
mod hnsw;

pub use flat::FlatIndex;
#[cfg(feature = "hnsw_rs")]
pub use hnsw::HnswIndex;

use core_types::{AnnParams, VectorId};

use crate::error::IndexResult;

/// One backend hit; `similarity` is an inner product (higher is closer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: VectorId,
    pub similarity: f32,
}

/// Backend contract:
/// - `index` adds vectors under caller-assigned ids; re-adding an id is a no-op
///   or an overwrite, never a duplicate
/// - `query` returns at most `n` hits ordered by descending similarity
pub trait NearestNeighborService: Send + Sync {
    fn name(&self) -> &'static str;

    fn dim(&self) -> usize;

    /// Number of vectors currently searchable.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(&self, vectors: &[Vec<f32>], ids: &[VectorId]) -> IndexResult<()>;

    fn query(&self, vector: &[f32], n: usize, params: &AnnParams) -> IndexResult<Vec<Neighbor>>;
}
