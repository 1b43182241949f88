//! Embedding Generator
//!
//! Maps canonical text strings to fixed-dimension, L2-normalized vectors.
//! Batched; deterministic within a run; batching never changes results.
//!
//! Two implementations share the `EmbeddingGenerator` trait:
//! - [`dummy::DummyEmbedder`]: always available, deterministic
//!   hash-derived fallback used under `strict_embedding = false` or in
//!   tests.
//! - [`local::FastEmbedder`] (feature `embeddings`): local ONNX inference
//!   via `fastembed`.

mod dummy;
mod local;

pub use dummy::DummyEmbedder;
#[cfg(feature = "embeddings")]
pub use local::FastEmbedder;

/// Default embedding dimension (`embedding_dim`).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum EmbeddingError {
    ModelInit(String),
    EmbeddingFailed(String),
    InvalidInput(String),
    DimensionMismatch { expected: usize, got: usize },
}

impl std::fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingError::ModelInit(e) => write!(f, "model initialization failed: {e}"),
            EmbeddingError::EmbeddingFailed(e) => write!(f, "embedding generation failed: {e}"),
            EmbeddingError::InvalidInput(e) => write!(f, "invalid input: {e}"),
            EmbeddingError::DimensionMismatch { expected, got } => {
                write!(f, "dimension mismatch: expected {expected}, got {got}")
            }
        }
    }
}

impl std::error::Error for EmbeddingError {}

/// Contract every embedding backend must satisfy.
pub trait EmbeddingGenerator: Send + Sync {
    /// Declared output dimension `D`.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts. Output rows are L2-normalized.
    /// Identical inputs yield bit-identical outputs within a run;
    /// batching must not change results (each text is embedded
    /// independently of its neighbors in the batch).
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text. Default implementation defers to
    /// `embed_batch` so callers get the same determinism guarantee.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = self.embed_batch(&[text])?;
        v.pop()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("no embedding produced".into()))
    }
}

/// L2-normalize a vector in place. A no-op on a zero vector.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Truncate a vector to `dim` entries and re-normalize (Matryoshka-style
/// truncation, as nomic-embed-text-v1.5 supports natively).
pub fn truncate_and_normalize(mut vector: Vec<f32>, dim: usize) -> Vec<f32> {
    if vector.len() > dim {
        vector.truncate(dim);
    } else if vector.len() < dim {
        vector.resize(dim, 0.0);
    }
    normalize(&mut vector);
    vector
}

/// Cosine similarity between two equal-length vectors. Returns 0.0 on
/// length mismatch or zero-norm input rather than panicking.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = (norm_a * norm_b).sqrt();
    if denom > 0.0 {
        dot / denom
    } else {
        0.0
    }
}

#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
