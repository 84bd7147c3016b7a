use crate::error::{IndexResult, check_dims};
use crate::normalize::normalize;

/// Normalized query vectors for a single search call.
#[derive(Debug, Clone, Default)]
pub struct QueryVectorSet {
    vectors: Vec<Vec<f32>>,
}

impl QueryVectorSet {
    /// Validate every vector against `dim` and normalize.
    pub fn new<V: AsRef<[f32]>>(raw: &[V], dim: usize) -> IndexResult<Self> {
        check_dims(raw, dim)?;
        Ok(Self {
            vectors: normalize(raw),
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexError;

    #[test]
    fn rejects_wrong_dimension() {
        let err = QueryVectorSet::new(&[vec![1.0f32, 0.0, 0.0]], 2).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn normalizes_on_construction() {
        let q = QueryVectorSet::new(&[vec![2.0f32, 0.0]], 2).unwrap();
        assert_eq!(q.vectors()[0], vec![1.0, 0.0]);
    }
}
