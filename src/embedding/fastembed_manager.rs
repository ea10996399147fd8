use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use anyhow::{Context, Result, anyhow};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;

/// FastEmbed-based embedding provider
pub struct FastEmbedManager {
    // fastembed needs `&mut self` to embed
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: String,
}

/// Resolve a configured model name to a FastEmbed model and its dimension
fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize, &'static str)> {
    let name = name.strip_prefix("sentence-transformers/").unwrap_or(name);
    let name = name.strip_prefix("BAAI/").unwrap_or(name);
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384, "all-MiniLM-L6-v2")),
        "all-minilm-l12-v2" => Some((EmbeddingModel::AllMiniLML12V2, 384, "all-MiniLM-L12-v2")),
        "bge-small-en-v1.5" => Some((
            EmbeddingModel::BGESmallENV15,
            384,
            "BAAI/bge-small-en-v1.5",
        )),
        "bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768, "BAAI/bge-base-en-v1.5")),
        _ => None,
    }
}

impl FastEmbedManager {
    /// Create a new FastEmbedManager with the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self> {
        Self::from_model_name("all-MiniLM-L6-v2", None)
    }

    /// Create a manager for a model given by name, e.g. "BAAI/bge-small-en-v1.5"
    ///
    /// Models are downloaded into `cache_dir` when given, otherwise into
    /// fastembed's default location.
    pub fn from_model_name(name: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        let (model, dimension, canonical) = resolve_model(name).ok_or_else(|| {
            EmbeddingError::InitializationFailed(format!("unsupported model '{}'", name))
        })?;

        tracing::info!("Initializing FastEmbed model: {}", canonical);

        let mut options = InitOptions::new(model).with_show_download_progress(true);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let embedding_model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitializationFailed(format!("{}: {:#}", canonical, e)))?;

        Ok(Self {
            model: Mutex::new(embedding_model),
            dimension,
            model_name: canonical.to_string(),
        })
    }
}

impl EmbeddingProvider for FastEmbedManager {
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut model = self
            .model
            .lock()
            .map_err(|e| anyhow!("Embedding model lock poisoned: {}", e))?;
        let embeddings = model
            .embed(texts, None)
            .context("Failed to generate embeddings")?;

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
