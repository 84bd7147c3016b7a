//! Multi-vector (late-interaction) document retrieval.
//!
//! Each document is a bag of embedding vectors, e.g. one per token. A query is
//! also a bag of vectors and documents are ranked by MaxSim: every query
//! vector contributes its single best similarity within the document, and the
//! contributions are summed.
//!
//! Two engines share one [`DocumentVectorRegistry`] and one ranking policy:
//!
//! - [`ExactSearchEngine`] scores every document directly.
//! - [`ApproximateSearchEngine`] asks a [`NearestNeighborService`] for each
//!   query vector's nearest stored vectors and rebuilds document scores from
//!   those candidates. Its scores never exceed the exact ones.
//!
//! [`MultiVectorIndex`] ties the registry and a backend together behind a
//! reader-writer lock and is the intended entry point.

pub mod ann;
pub mod approximate;
mod error;
pub mod exact;
mod index;
pub mod maxsim;
pub mod normalize;
pub mod query;
pub mod rank;
pub mod registry;

pub use ann::{FlatIndex, NearestNeighborService, Neighbor};
#[cfg(feature = "hnsw_rs")]
pub use ann::HnswIndex;
pub use approximate::{ApproximateSearchEngine, DEFAULT_OVERFETCH_MULTIPLIER, MISSING_TERM_SCORE};
pub use error::{IndexError, IndexResult};
pub use exact::ExactSearchEngine;
pub use index::MultiVectorIndex;
pub use maxsim::maxsim;
pub use normalize::normalize;
pub use query::QueryVectorSet;
pub use registry::{DocumentVectorRegistry, PreparedBatch, RegistryStats};

pub use core_types::{
    AnnParams, DocId, IndexState, IndexStats, ScoredDoc, SearchMode, VectorId, unzip_hits,
};
