use thiserror::Error;

/// Failures surfaced by ingestion and search.
///
/// Empty queries, unresolved backend ids, and an empty backend are not
/// errors; those calls return an empty result instead.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid index configuration: {0}")]
    InvalidConfig(String),
    #[error("backend dimension {backend_dim} does not match index dimension {index_dim}")]
    BackendMismatch { index_dim: usize, backend_dim: usize },
    #[error("stale batch: reserved vector id {reserved} but next id is {next}")]
    StaleBatch { reserved: u64, next: u64 },
    #[error("nearest-neighbor backend failed: {0}")]
    Backend(String),
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Fail with `DimensionMismatch` unless every vector has length `dim`.
pub(crate) fn check_dims<V: AsRef<[f32]>>(vectors: &[V], dim: usize) -> IndexResult<()> {
    match vectors.iter().map(|v| v.as_ref().len()).find(|&len| len != dim) {
        Some(actual) => Err(IndexError::DimensionMismatch {
            expected: dim,
            actual,
        }),
        None => Ok(()),
    }
}
