//! Vector math over embeddings.
//!
//! Providers emit unit-length vectors, so ranking uses the plain inner
//! product. [`cosine_similarity`] exists for vectors of unknown length.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Inner product of two vectors of the same dimension.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Cosine of the angle between `a` and `b`; zero if either is a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let denominator = norm(a) * norm(b);
    Ok(if denominator > 0.0 { dot / denominator } else { 0.0 })
}

/// Scale `v` to unit length in place. Zero vectors stay zero.
pub fn normalize(v: &mut [f32]) {
    let length = norm(v);
    if length > 0.0 {
        v.iter_mut().for_each(|x| *x /= length);
    }
}

/// A candidate position paired with its inner-product score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredIndex {
    /// Position of the candidate in the searched collection.
    pub index: usize,

    /// Inner-product score against the query.
    pub score: f32,
}

/// The `k` candidates with the highest inner product against `query`.
///
/// Results are sorted by descending score. Equal scores keep their
/// collection order.
pub fn top_k<'a, I>(query: &[f32], candidates: I, k: usize) -> Result<Vec<ScoredIndex>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scored = candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| {
            Ok(ScoredIndex {
                index,
                score: dot_product(query, candidate)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    scored.sort_by_key(|hit| std::cmp::Reverse(OrderedFloat(hit.score)));
    scored.truncate(k);
    Ok(scored)
}
