//! Cosine similarity over dense embeddings.
//!
//! Similarity is computed in `f64` and clipped to `[0, 1]`: anti-correlated
//! notes are simply unrelated for graph purposes. Bitwise-identical vectors
//! short-circuit to exactly `1.0` so ties between duplicates are exact.

/// A vector with its squared norm precomputed.
#[derive(Debug, Clone, Copy)]
pub struct Embedding<'a> {
    pub values: &'a [f32],
    pub norm_sq: f64,
}

impl<'a> Embedding<'a> {
    pub fn new(values: &'a [f32]) -> Self {
        Embedding {
            values,
            norm_sq: squared_norm(values),
        }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

pub fn squared_norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x) * f64::from(x)).sum()
}

/// Clipped cosine similarity of two prepared embeddings.
///
/// Returns `None` when the dimensions differ or either norm is zero.
pub fn cosine(a: Embedding<'_>, b: Embedding<'_>) -> Option<f32> {
    if a.dim() != b.dim() || a.norm_sq <= 0.0 || b.norm_sq <= 0.0 {
        return None;
    }
    if a.values == b.values {
        return Some(1.0);
    }
    let dot: f64 = a
        .values
        .iter()
        .zip(b.values)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();
    let sim = dot / (a.norm_sq * b.norm_sq).sqrt();
    if sim.is_finite() {
        Some(sim.clamp(0.0, 1.0) as f32)
    } else {
        None
    }
}

/// Clipped cosine similarity of two raw vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    cosine(Embedding::new(a), Embedding::new(b))
}
