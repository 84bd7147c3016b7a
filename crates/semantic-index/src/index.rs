use std::sync::Arc;

use core_types::config::{BackendKind, HnswConfig, IndexConfig};
use core_types::{AnnParams, DocId, IndexState, IndexStats, ScoredDoc, SearchMode};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::ann::{FlatIndex, NearestNeighborService};
use crate::approximate::{ApproximateSearchEngine, DEFAULT_OVERFETCH_MULTIPLIER};
use crate::error::{IndexError, IndexResult, check_dims};
use crate::exact::ExactSearchEngine;
use crate::query::QueryVectorSet;
use crate::registry::DocumentVectorRegistry;

/// Multi-vector document index with exact and approximate MaxSim search.
///
/// Ingestion holds the registry write lock for the whole call, so concurrent
/// `add_document` calls serialize; searches share the read lock and see the
/// registry as of the moment they acquired it.
///
/// The registry's `doc_id ↔ vector_id` mapping is not persisted by the
/// backend. Callers that snapshot the backend must save the mapping
/// alongside it (see [`MultiVectorIndex::registry`]).
pub struct MultiVectorIndex {
    registry: RwLock<DocumentVectorRegistry>,
    backend: Arc<dyn NearestNeighborService>,
    overfetch_multiplier: usize,
    ann_params: AnnParams,
}

impl std::fmt::Debug for MultiVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiVectorIndex")
            .field("backend", &self.backend.name())
            .field("registry", &self.registry.read().stats())
            .field("overfetch_multiplier", &self.overfetch_multiplier)
            .finish_non_exhaustive()
    }
}

impl MultiVectorIndex {
    /// Index over `backend`; both must agree on `dim`.
    pub fn new(dim: usize, backend: Arc<dyn NearestNeighborService>) -> IndexResult<Self> {
        if backend.dim() != dim {
            return Err(IndexError::BackendMismatch {
                index_dim: dim,
                backend_dim: backend.dim(),
            });
        }
        Ok(Self {
            registry: RwLock::new(DocumentVectorRegistry::new(dim)?),
            backend,
            overfetch_multiplier: DEFAULT_OVERFETCH_MULTIPLIER,
            ann_params: AnnParams::default(),
        })
    }

    /// Index backed by an exhaustive [`FlatIndex`].
    pub fn with_flat_backend(dim: usize) -> IndexResult<Self> {
        Self::new(dim, Arc::new(FlatIndex::new(dim)))
    }

    pub fn from_config(index: &IndexConfig, hnsw: &HnswConfig) -> IndexResult<Self> {
        let backend = build_backend(index, hnsw)?;
        tracing::info!(
            dim = index.dim,
            backend = backend.name(),
            overfetch = index.overfetch_multiplier,
            ef_search = index.ef_search,
            "creating multi-vector index"
        );
        Ok(Self::new(index.dim, backend)?
            .with_overfetch_multiplier(index.overfetch_multiplier)
            .with_ann_params(AnnParams {
                ef_search: index.ef_search,
            }))
    }

    #[must_use]
    pub fn with_overfetch_multiplier(mut self, multiplier: usize) -> Self {
        self.overfetch_multiplier = multiplier.max(1);
        self
    }

    /// Default backend parameters for searches that pass none.
    #[must_use]
    pub const fn with_ann_params(mut self, params: AnnParams) -> Self {
        self.ann_params = params;
        self
    }

    pub fn dim(&self) -> usize {
        self.registry.read().dim()
    }

    /// Append `vectors` to `doc_id`, creating the document if new.
    ///
    /// Nothing is recorded if any vector has the wrong dimension or the
    /// backend rejects the batch.
    pub fn add_document<V: AsRef<[f32]>>(
        &self,
        doc_id: impl Into<DocId>,
        vectors: &[V],
    ) -> IndexResult<()> {
        let mut registry = self.registry.write();
        self.ingest(&mut registry, doc_id.into(), vectors)
    }

    /// Ingest several documents under one write lock.
    ///
    /// Every vector in the batch is dimension-checked before the first
    /// document is recorded. Returns the number of documents ingested.
    ///
    /// A backend error is not rolled back across documents: the documents
    /// before the failing one stay ingested, the failing one and everything
    /// after it are not. Compare [`MultiVectorIndex::stats`] before and after
    /// to see how far the batch got.
    pub fn add_documents<D, V>(&self, batch: impl IntoIterator<Item = (D, Vec<V>)>) -> IndexResult<usize>
    where
        D: Into<DocId>,
        V: AsRef<[f32]>,
    {
        let batch: Vec<(DocId, Vec<V>)> = batch
            .into_iter()
            .map(|(doc_id, vectors)| (doc_id.into(), vectors))
            .collect();

        let mut registry = self.registry.write();
        for (_, vectors) in &batch {
            check_dims(vectors, registry.dim())?;
        }
        let count = batch.len();
        for (doc_id, vectors) in batch {
            self.ingest(&mut registry, doc_id, &vectors)?;
        }
        Ok(count)
    }

    fn ingest<V: AsRef<[f32]>>(
        &self,
        registry: &mut DocumentVectorRegistry,
        doc_id: DocId,
        vectors: &[V],
    ) -> IndexResult<()> {
        let batch = registry.prepare(vectors)?;
        if !batch.is_empty() {
            self.backend.index(batch.vectors(), &batch.ids())?;
        }
        let ids = registry.commit(doc_id, batch)?;
        tracing::trace!(vectors = ids.len(), "document ingested");
        Ok(())
    }

    /// Top `k` documents for `query_vectors`.
    ///
    /// Query vectors are normalized here. `ann_params` falls back to the
    /// index defaults and is ignored by exact search.
    pub fn search<V: AsRef<[f32]>>(
        &self,
        query_vectors: &[V],
        k: usize,
        mode: SearchMode,
        ann_params: Option<&AnnParams>,
    ) -> IndexResult<Vec<ScoredDoc>> {
        let registry = self.registry.read();
        let query = QueryVectorSet::new(query_vectors, registry.dim())?;
        match mode {
            SearchMode::Exact => Ok(ExactSearchEngine::new(&registry).search(&query, k)),
            SearchMode::Approximate => {
                ApproximateSearchEngine::new(&registry, self.backend.as_ref())
                    .with_overfetch_multiplier(self.overfetch_multiplier)
                    .search(&query, k, ann_params.unwrap_or(&self.ann_params))
            }
        }
    }

    pub fn stats(&self) -> IndexStats {
        let stats = self.registry.read().stats();
        IndexStats {
            num_documents: stats.num_documents,
            num_vectors: stats.num_vectors,
            avg_vectors_per_doc: stats.avg_vectors_per_doc,
            dim: stats.dim,
            index_type: self.backend.name().to_string(),
        }
    }

    pub fn state(&self) -> IndexState {
        if self.registry.read().is_empty() {
            IndexState::Empty
        } else {
            IndexState::Populated
        }
    }

    /// Read access to the document registry, e.g. to persist the mapping.
    pub fn registry(&self) -> RwLockReadGuard<'_, DocumentVectorRegistry> {
        self.registry.read()
    }

    pub fn backend(&self) -> &dyn NearestNeighborService {
        self.backend.as_ref()
    }
}

fn build_backend(
    index: &IndexConfig,
    hnsw: &HnswConfig,
) -> IndexResult<Arc<dyn NearestNeighborService>> {
    match index.backend {
        BackendKind::Flat => Ok(Arc::new(FlatIndex::new(index.dim))),
        #[cfg(feature = "hnsw_rs")]
        BackendKind::Hnsw => Ok(Arc::new(crate::ann::HnswIndex::new(index.dim, hnsw))),
        #[cfg(not(feature = "hnsw_rs"))]
        BackendKind::Hnsw => {
            let _ = hnsw;
            Err(IndexError::InvalidConfig(
                "hnsw backend requires the `hnsw_rs` feature".into(),
            ))
        }
    }
}
