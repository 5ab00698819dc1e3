use crate::error::{ApiError, Result};
use ndarray::ArrayView1;

/// Fixed-length visual embedding of an outfit image
pub type Embedding = Vec<f32>;

/// Cosine similarity between two embeddings, in [-1, 1].
///
/// Fails on length mismatch and on zero-magnitude (or empty) vectors, whose
/// direction is undefined.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ApiError::Computation(format!(
            "embedding lengths differ: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Err(ApiError::Computation("empty embedding".to_string()));
    }

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);

    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ApiError::Computation(
            "zero-magnitude embedding".to_string(),
        ));
    }

    let similarity = a.dot(&b) / (norm_a * norm_b);
    if !similarity.is_finite() {
        return Err(ApiError::Computation(format!(
            "non-finite similarity: {}",
            similarity
        )));
    }

    // Rounding can push parallel vectors a hair past 1.0
    Ok(similarity.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_identical_vectors() {
        let v = vec![0.3, -1.2, 4.0];
        assert!(approx_eq(cosine_similarity(&v, &v).unwrap(), 1.0));
    }

    #[test]
    fn test_scale_invariance() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![10.0, 20.0, 30.0];
        assert!(approx_eq(cosine_similarity(&a, &b).unwrap(), 1.0));
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert!(approx_eq(
            cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(),
            0.0
        ));
        assert!(approx_eq(
            cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap(),
            -1.0
        ));
    }

    #[test]
    fn test_preserves_relative_order() {
        let reference = [1.0, 0.0, 0.0];
        let close = cosine_similarity(&reference, &[0.9, 0.1, 0.0]).unwrap();
        let far = cosine_similarity(&reference, &[0.1, 0.9, 0.0]).unwrap();
        assert!(close > far);
    }

    #[test]
    fn test_zero_magnitude_fails() {
        assert!(matches!(
            cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]),
            Err(ApiError::Computation(_))
        ));
        assert!(matches!(
            cosine_similarity(&[], &[]),
            Err(ApiError::Computation(_))
        ));
    }

    #[test]
    fn test_length_mismatch_fails() {
        assert!(matches!(
            cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]),
            Err(ApiError::Computation(_))
        ));
    }
}
