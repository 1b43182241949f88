//! Deterministic fallback embedding.
//!
//! Used when `strict_embedding = false` and the real model cannot be
//! loaded, and as the default backend in tests so they never depend on
//! downloading a real model.
//!
//! The vector is a pure function of the input text: hash the text with a
//! fixed-seed FNV-1a, then expand that single 64-bit hash into `D` floats
//! via a splitmix64-style mixing step (cheap, deterministic, no RNG
//! crate — randomness here would break the "identical inputs yield
//! bit-identical outputs" guarantee if it ever touched the clock or OS
//! entropy).

use super::{normalize, EmbeddingError, EmbeddingGenerator, DEFAULT_EMBEDDING_DIM};

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a(text: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in text.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// One step of splitmix64, used to expand a single hash into a stream
/// of pseudo-independent 64-bit words.
fn splitmix64_next(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Deterministic text -> D floats in [-1, 1] -> L2-normalized.
pub fn hash_embed(text: &str, dim: usize) -> Vec<f32> {
    let mut state = fnv1a(text);
    let mut vector = Vec::with_capacity(dim);
    for _ in 0..dim {
        let word = splitmix64_next(&mut state);
        // Top 24 bits give enough precision for an f32 in [-1, 1].
        let unit = (word >> 40) as f32 / (1u64 << 24) as f32; // [0, 1)
        vector.push(unit * 2.0 - 1.0);
    }
    normalize(&mut vector);
    vector
}

/// Deterministic pseudo-embedding backend, no model download required.
pub struct DummyEmbedder {
    dimensions: usize,
}

impl DummyEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for DummyEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl EmbeddingGenerator for DummyEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| hash_embed(t, self.dimensions)).collect())
    }
}
