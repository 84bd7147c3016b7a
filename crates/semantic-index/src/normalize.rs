//! L2 normalization for ingested and query vectors.

/// Scale `vector` to unit L2 norm in place.
///
/// A zero vector stays all-zero (its divisor is taken as 1), so it scores 0
/// against everything.
pub fn normalize_in_place(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    let divisor = if norm == 0.0 { 1.0 } else { norm };
    for x in vector.iter_mut() {
        *x /= divisor;
    }
}

/// Return unit-norm copies of `vectors`.
pub fn normalize<V: AsRef<[f32]>>(vectors: &[V]) -> Vec<Vec<f32>> {
    vectors
        .iter()
        .map(|v| {
            let mut owned = v.as_ref().to_vec();
            normalize_in_place(&mut owned);
            owned
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn l2(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn zero_vector_stays_zero() {
        let out = normalize(&[vec![0.0f32; 4]]);
        assert_eq!(out[0], vec![0.0; 4]);
    }

    #[test]
    fn scales_to_unit_length() {
        let out = normalize(&[vec![3.0f32, 4.0]]);
        assert!((out[0][0] - 0.6).abs() < 1e-6);
        assert!((out[0][1] - 0.8).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn normalized_vectors_have_unit_norm(
            v in prop::collection::vec(-100.0f32..100.0, 1..64)
        ) {
            let out = normalize(&[v.clone()]);
            if v.iter().all(|x| *x == 0.0) {
                prop_assert!(out[0].iter().all(|x| *x == 0.0));
            } else {
                prop_assert!((l2(&out[0]) - 1.0).abs() < 1e-4);
            }
        }
    }
}
