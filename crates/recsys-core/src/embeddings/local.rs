//! Local semantic embeddings via `fastembed`.
//!
//! ## Model
//!
//! Nomic Embed Text v1.5 (ONNX, 768d native, 8192 token context). Its
//! Matryoshka representation learning means the first `D` dimensions of
//! the 768-dim output already form a valid `D`-dim embedding, so
//! truncating to [`DEFAULT_EMBEDDING_DIM`] (or whatever `dim` the caller
//! configures) costs only a few points of MTEB quality in exchange for
//! much smaller vectors on disk.

use super::{truncate_and_normalize, EmbeddingError, EmbeddingGenerator, DEFAULT_EMBEDDING_DIM};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Mutex, OnceLock};

/// Maximum text length for embedding (characters beyond this are dropped).
pub const MAX_TEXT_LENGTH: usize = 8192;

/// Batch size for model inference calls.
pub const BATCH_SIZE: usize = 32;

static EMBEDDING_MODEL_RESULT: OnceLock<Result<Mutex<TextEmbedding>, String>> = OnceLock::new();

/// Cache directory for downloaded model weights. Respects
/// `FASTEMBED_CACHE_PATH`, falls back to the platform cache dir.
fn get_cache_dir() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("FASTEMBED_CACHE_PATH") {
        return std::path::PathBuf::from(path);
    }
    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "recsys", "core") {
        return proj_dirs.cache_dir().join("fastembed");
    }
    if let Some(base_dirs) = directories::BaseDirs::new() {
        return base_dirs.home_dir().join(".cache/recsys/fastembed");
    }
    std::path::PathBuf::from(".fastembed_cache")
}

fn get_model() -> Result<std::sync::MutexGuard<'static, TextEmbedding>, EmbeddingError> {
    let result = EMBEDDING_MODEL_RESULT.get_or_init(|| {
        let cache_dir = get_cache_dir();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!("failed to create embedding cache dir {:?}: {}", cache_dir, e);
        }

        let options = InitOptions::new(EmbeddingModel::NomicEmbedTextV15)
            .with_show_download_progress(true)
            .with_cache_dir(cache_dir);

        TextEmbedding::try_new(options).map(Mutex::new).map_err(|e| {
            format!(
                "failed to initialize nomic-embed-text-v1.5: {e}. \
                 ensure ONNX runtime is available and model files can be downloaded"
            )
        })
    });

    match result {
        Ok(model) => model
            .lock()
            .map_err(|e| EmbeddingError::ModelInit(format!("lock poisoned: {e}"))),
        Err(err) => Err(EmbeddingError::ModelInit(err.clone())),
    }
}

fn truncate_text(text: &str) -> &str {
    if text.len() > MAX_TEXT_LENGTH {
        // Find a char boundary at or before the byte limit.
        let mut end = MAX_TEXT_LENGTH;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    } else {
        text
    }
}

/// ONNX-backed embedding generator (feature `embeddings`).
///
/// Truncates the model's native 768-dim output to `dim` and re-normalizes,
/// per Matryoshka representation learning.
pub struct FastEmbedder {
    dim: usize,
}

impl FastEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Fails if the ONNX model cannot be loaded (missing runtime, no
    /// network access to download weights, corrupted cache). Call this
    /// eagerly at startup so a bad config fails fast rather than on the
    /// first request.
    pub fn check_ready(&self) -> Result<(), EmbeddingError> {
        get_model().map(|_| ())
    }
}

impl Default for FastEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl EmbeddingGenerator for FastEmbedder {
    fn dimensions(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        for t in texts {
            if t.is_empty() {
                return Err(EmbeddingError::InvalidInput("text cannot be empty".into()));
            }
        }

        let mut model = get_model()?;
        let mut out = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let truncated: Vec<&str> = chunk.iter().map(|t| truncate_text(t)).collect();
            let embeddings = model
                .embed(truncated, None)
                .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;
            for emb in embeddings {
                out.push(truncate_and_normalize(emb, self.dim));
            }
        }

        Ok(out)
    }
}
