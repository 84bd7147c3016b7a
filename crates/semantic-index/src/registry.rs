//! Document ↔ vector bookkeeping.
//!
//! Vectors live in an append-only arena addressed by [`VectorId`]: the id is
//! the slot, embeddings are stored back to back with a stride of `dim`, and a
//! parallel column records the owning document's ordinal. Documents are kept
//! in an [`IndexMap`] so that ordinal order is first-registration order, which
//! the exact engine relies on for tie-breaking.

use core_types::{DocId, VectorId};
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::{IndexError, IndexResult, check_dims};
use crate::normalize::normalize_in_place;

/// Rows borrowed from the arena for one document.
pub type DocVectors<'a> = SmallVec<[&'a [f32]; 32]>;

/// Registry counters, without the backend label the facade adds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryStats {
    pub num_documents: usize,
    pub num_vectors: usize,
    pub avg_vectors_per_doc: f64,
    pub dim: usize,
}

/// Normalized vectors with ids reserved but not yet recorded.
///
/// Produced by [`DocumentVectorRegistry::prepare`]; nothing in the registry
/// changes until [`DocumentVectorRegistry::commit`] consumes it.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    first_id: u64,
    vectors: Vec<Vec<f32>>,
}

impl PreparedBatch {
    pub fn ids(&self) -> Vec<VectorId> {
        (self.first_id..self.first_id + self.vectors.len() as u64)
            .map(VectorId)
            .collect()
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[derive(Debug)]
pub struct DocumentVectorRegistry {
    dim: usize,
    /// Row-major embeddings, `dim` floats per vector id.
    embeddings: Vec<f32>,
    /// Owning document ordinal per vector id.
    owners: Vec<usize>,
    docs: IndexMap<DocId, Vec<VectorId>>,
}

impl DocumentVectorRegistry {
    pub fn new(dim: usize) -> IndexResult<Self> {
        if dim == 0 {
            return Err(IndexError::InvalidConfig(
                "dimension must be greater than zero".into(),
            ));
        }
        Ok(Self {
            dim,
            embeddings: Vec::new(),
            owners: Vec::new(),
            docs: IndexMap::new(),
        })
    }

    pub const fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_documents(&self) -> usize {
        self.docs.len()
    }

    pub fn num_vectors(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Validate and normalize `vectors`, reserving the next unused ids.
    pub fn prepare<V: AsRef<[f32]>>(&self, vectors: &[V]) -> IndexResult<PreparedBatch> {
        check_dims(vectors, self.dim)?;
        let vectors = vectors
            .iter()
            .map(|v| {
                let mut owned = v.as_ref().to_vec();
                normalize_in_place(&mut owned);
                owned
            })
            .collect();
        Ok(PreparedBatch {
            first_id: self.owners.len() as u64,
            vectors,
        })
    }

    /// Record a prepared batch under `doc_id`, appending to an existing
    /// document rather than replacing it.
    ///
    /// Fails if another batch was committed after `batch` was prepared.
    pub fn commit(&mut self, doc_id: DocId, batch: PreparedBatch) -> IndexResult<Vec<VectorId>> {
        if batch.first_id != self.owners.len() as u64 {
            return Err(IndexError::StaleBatch {
                reserved: batch.first_id,
                next: self.owners.len() as u64,
            });
        }

        let ids = batch.ids();
        let entry = self.docs.entry(doc_id);
        let ordinal = entry.index();
        entry.or_default().extend_from_slice(&ids);

        self.embeddings.reserve(batch.vectors.len() * self.dim);
        for v in batch.vectors {
            self.embeddings.extend_from_slice(&v);
            self.owners.push(ordinal);
        }
        Ok(ids)
    }

    /// Validate, normalize, and record `vectors` under `doc_id`.
    ///
    /// All-or-nothing: a dimension mismatch on any vector leaves the
    /// registry untouched.
    pub fn add_document<V: AsRef<[f32]>>(
        &mut self,
        doc_id: impl Into<DocId>,
        vectors: &[V],
    ) -> IndexResult<Vec<VectorId>> {
        let batch = self.prepare(vectors)?;
        self.commit(doc_id.into(), batch)
    }

    /// Owning document of `id`, or `None` for ids this registry never issued.
    pub fn resolve(&self, id: VectorId) -> Option<&DocId> {
        self.resolve_ordinal(id)
            .and_then(|ord| self.docs.get_index(ord))
            .map(|(doc_id, _)| doc_id)
    }

    /// Registration ordinal of the document owning `id`.
    pub fn resolve_ordinal(&self, id: VectorId) -> Option<usize> {
        self.owners.get(id.index()).copied()
    }

    pub fn doc_id(&self, ordinal: usize) -> Option<&DocId> {
        self.docs.get_index(ordinal).map(|(doc_id, _)| doc_id)
    }

    /// Vector ids owned by `doc_id`, in insertion order.
    pub fn vector_ids(&self, doc_id: &str) -> Option<&[VectorId]> {
        self.docs.get(doc_id).map(Vec::as_slice)
    }

    pub fn embedding(&self, id: VectorId) -> Option<&[f32]> {
        let start = id.index().checked_mul(self.dim)?;
        self.embeddings.get(start..start + self.dim)
    }

    /// Embeddings owned by the document at `ordinal`.
    pub fn doc_vectors(&self, ordinal: usize) -> DocVectors<'_> {
        self.docs
            .get_index(ordinal)
            .map(|(_, ids)| ids.iter().filter_map(|&id| self.embedding(id)).collect())
            .unwrap_or_default()
    }

    /// Documents in registration order.
    pub fn documents(&self) -> impl Iterator<Item = (&DocId, &[VectorId])> {
        self.docs.iter().map(|(doc_id, ids)| (doc_id, ids.as_slice()))
    }

    pub fn stats(&self) -> RegistryStats {
        let num_documents = self.num_documents();
        let num_vectors = self.num_vectors();
        RegistryStats {
            num_documents,
            num_vectors,
            avg_vectors_per_doc: num_vectors as f64 / num_documents.max(1) as f64,
            dim: self.dim,
        }
    }
}
