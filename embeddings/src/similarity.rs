//! Similarity computation for embeddings.

use crate::error::{Result, SimilarityError};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// Unlike a lenient cosine, a zero-magnitude input is an error rather than a
/// silent 0.0: the angle is undefined and the caller must decide what to do.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    ensure_finite(a)?;
    ensure_finite(b)?;

    let magnitude_a = norm_f64(a);
    let magnitude_b = norm_f64(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Err(SimilarityError::ZeroVector);
    }

    // Stay in f64 until after the division; f32 partial sums overflow for
    // large finite components.
    let cosine = dot_f64(a, b) / (magnitude_a * magnitude_b);
    Ok(cosine.clamp(-1.0, 1.0) as f32)
}

/// Map a cosine similarity in `[-1, 1]` onto a whole percentage in `[0, 100]`.
///
/// `round((sim + 1) / 2 * 100)`; non-finite input maps to 0.
pub fn similarity_to_percentage(sim: f32) -> u8 {
    if !sim.is_finite() {
        return 0;
    }
    let percentage = ((f64::from(sim) + 1.0) / 2.0 * 100.0).round();
    percentage.clamp(0.0, 100.0) as u8
}

/// Compute the dot product between two embeddings.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(dot_f64(a, b) as f32)
}

/// Euclidean norm of an embedding.
pub fn magnitude(embedding: &[f32]) -> f32 {
    norm_f64(embedding) as f32
}

/// Validate that an embedding can take part in a cosine comparison.
pub fn validate(embedding: &[f32]) -> Result<()> {
    ensure_finite(embedding)?;
    if norm_f64(embedding) == 0.0 {
        return Err(SimilarityError::ZeroVector);
    }
    Ok(())
}

/// Normalize an embedding to unit length.
pub fn normalize(embedding: &mut [f32]) {
    let magnitude = norm_f64(embedding);
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x = (f64::from(*x) / magnitude) as f32;
        }
    }
}

fn dot_f64(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

fn norm_f64(embedding: &[f32]) -> f64 {
    embedding
        .iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}

fn ensure_finite(embedding: &[f32]) -> Result<()> {
    if embedding.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(SimilarityError::NonFinite)
    }
}
