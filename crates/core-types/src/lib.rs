//! Core identifiers and shared lightweight types for multivec.
//!
//! These types intentionally avoid heavy dependencies so that the index,
//! the CLI, and any embedding host can share them without pulling in the
//! search machinery.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub mod config;

/// Identifier of a single stored embedding vector.
///
/// Allocated by the registry in strictly increasing order starting at 0; the
/// value doubles as the vector's slot in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VectorId(pub u64);

impl VectorId {
    /// Arena slot for this id.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied opaque document key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(pub String);

impl DocId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DocId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for DocId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

/// Split ranked results into parallel `(doc_ids, scores)` columns.
pub fn unzip_hits(hits: Vec<ScoredDoc>) -> (Vec<DocId>, Vec<f32>) {
    hits.into_iter().map(|h| (h.doc_id, h.score)).unzip()
}

/// Which engine answers a search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Brute-force MaxSim over every registered document.
    #[default]
    Exact,
    /// Per-query-vector ANN candidates folded into document scores.
    Approximate,
}

/// Quality knobs forwarded to the nearest-neighbor backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnParams {
    /// Size of the dynamic candidate list for graph backends.
    pub ef_search: usize,
}

impl Default for AnnParams {
    fn default() -> Self {
        Self { ef_search: 100 }
    }
}

/// Index lifecycle: `Empty` until the first successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexState {
    Empty,
    Populated,
}

/// Summary counters reported by `stats()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub num_documents: usize,
    pub num_vectors: usize,
    pub avg_vectors_per_doc: f64,
    pub dim: usize,
    pub index_type: String,
}
