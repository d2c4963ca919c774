//! Cosine similarity between embedding vectors, and the threshold test used for
//! job-description deduplication.

use thiserror::Error;

/// Absorbs float rounding at the threshold boundary so a pair sitting exactly on
/// the threshold still counts as a match.
pub const THRESHOLD_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimilarityError {
    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Cosine similarity in [-1, 1].
///
/// Returns `Ok(None)` when similarity is undefined: either vector is empty or has
/// zero magnitude. Callers must treat `None` as "not comparable", which is distinct
/// from a low score.
pub fn similarity(a: &[f32], b: &[f32]) -> Result<Option<f64>, SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Ok(None);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(None);
    }

    Ok(Some((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)))
}

/// True when both vectors are comparable and their similarity reaches `threshold`.
pub fn is_match(a: &[f32], b: &[f32], threshold: f64) -> Result<bool, SimilarityError> {
    Ok(similarity(a, b)?.is_some_and(|score| score + THRESHOLD_TOLERANCE >= threshold))
}
