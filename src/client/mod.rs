//! Core library client for doc-rag
//!
//! This module provides the main client interface for using doc-rag as a
//! library: upload documents, chat over them, inspect and clear the corpus.

mod context;
mod corpus;
mod upload;

pub use context::{AssembledPrompt, ContextAssembler};
pub use corpus::{Corpus, CorpusSnapshot, CorpusUpdate};

use crate::chat::{ChatProvider, OpenAiChat};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedManager};
use crate::error::{EmbeddingError, RagError, ValidationError};
use crate::indexer::TextChunker;
use crate::types::*;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main client for interacting with the RAG system
///
/// Holds the embedding and chat providers, the configured chunker, and the
/// session corpus. Clones share the same corpus.
///
/// # Example
///
/// ```no_run
/// use doc_rag::{ChatRequest, FileUpload, RagClient, UploadRequest};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = RagClient::new().await?;
///
///     let upload = UploadRequest {
///         files: vec![FileUpload {
///             path: "/path/to/report.pdf".to_string(),
///             filename: None,
///         }],
///     };
///     let response = client.upload_files(upload).await?;
///     println!("Corpus now has {} chunks", response.total_chunks);
///
///     let reply = client
///         .chat(ChatRequest {
///             message: "Summarize the report".to_string(),
///             use_rag: true,
///         })
///         .await?;
///     println!("{}", reply.response);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RagClient {
    pub(crate) embedding_provider: Arc<dyn EmbeddingProvider>,
    pub(crate) chat_provider: Arc<dyn ChatProvider>,
    pub(crate) chunker: TextChunker,
    pub(crate) assembler: ContextAssembler,
    pub(crate) corpus: Arc<Corpus>,
    pub(crate) config: Arc<Config>,
}

impl RagClient {
    /// Create a new RAG client with configuration from the default location
    /// and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration cannot be loaded
    /// - Embedding model cannot be initialized
    /// - The chat API key is not set
    pub async fn new() -> Result<Self> {
        let config = Config::new().context("Failed to load configuration")?;
        Self::with_config(config).await
    }

    /// Create a new RAG client with custom configuration
    pub async fn with_config(config: Config) -> Result<Self> {
        tracing::info!("Initializing RAG client with configuration");
        tracing::debug!("Embedding model: {}", config.embedding.model_name);
        tracing::debug!(
            "Chunk size: {}, overlap: {}",
            config.chunking.chunk_size,
            config.chunking.chunk_overlap
        );

        let model_name = config.embedding.model_name.clone();
        let cache_dir = config.embedding.cache_dir.clone();
        // Model loading may download weights and is CPU heavy
        let embedding_provider = tokio::task::spawn_blocking(move || {
            FastEmbedManager::from_model_name(&model_name, Some(cache_dir))
        })
        .await
        .context("Embedding initialization task panicked")?
        .context("Failed to initialize embedding provider")?;

        let chat_provider =
            OpenAiChat::from_config(&config.chat).context("Failed to initialize chat provider")?;

        Self::with_providers(config, Arc::new(embedding_provider), Arc::new(chat_provider))
    }

    /// Create a client from already constructed providers
    pub fn with_providers(
        config: Config,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        chat_provider: Arc<dyn ChatProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)
            .map_err(RagError::from)?;
        let assembler =
            ContextAssembler::new(config.chat.system_prompt.clone(), config.retrieval.top_k);

        Ok(Self {
            embedding_provider,
            chat_provider,
            chunker,
            assembler,
            corpus: Arc::new(Corpus::new()),
            config: Arc::new(config),
        })
    }

    /// Answer a message, grounding the reply in uploaded documents when asked
    ///
    /// Retrieval never fails the request: an empty corpus, no hits, or a
    /// failure to embed the message all fall back to the base system prompt.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = Instant::now();

        if request.message.trim().is_empty() {
            return Err(RagError::from(ValidationError::Empty("message".to_string())).into());
        }

        let prompt = if request.use_rag {
            self.retrieve_context(&request.message).await
        } else {
            self.assembler.base_only()
        };

        tracing::debug!(
            "Chat with {} retrieved chunks using {}",
            prompt.retrieved.len(),
            self.chat_provider.model()
        );

        let response = self
            .chat_provider
            .complete(&prompt.system_prompt, &request.message)
            .await
            .map_err(RagError::from)?;

        Ok(ChatResponse {
            response,
            context_used: prompt.context_used(),
            retrieved_chunks: prompt.retrieved.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Build the system prompt for `message` from the current corpus
    pub async fn retrieve_context(&self, message: &str) -> AssembledPrompt {
        let snapshot = self.corpus.snapshot();
        let Some(index) = snapshot.index().filter(|index| !index.is_empty()) else {
            return self.assembler.base_only();
        };

        match self.embed_all(vec![message.to_string()]).await {
            Ok(mut embeddings) => match embeddings.pop() {
                Some(query) => self.assembler.assemble(Some(index), &query),
                None => self.assembler.base_only(),
            },
            Err(e) => {
                tracing::warn!("Failed to embed message for retrieval: {}", e);
                self.assembler.base_only()
            }
        }
    }

    /// Remove every uploaded file, chunk and the index
    pub async fn clear(&self) -> Result<ClearResponse> {
        let previous = self.corpus.clear().await;
        tracing::info!(
            "Cleared {} files and {} chunks",
            previous.filenames().len(),
            previous.chunk_count()
        );

        Ok(ClearResponse {
            success: true,
            message: format!(
                "Cleared {} files and {} chunks",
                previous.filenames().len(),
                previous.chunk_count()
            ),
        })
    }

    /// Current corpus and model status
    pub fn status(&self) -> StatusResponse {
        let snapshot = self.corpus.snapshot();
        StatusResponse {
            filenames: snapshot.filenames().to_vec(),
            total_chunks: snapshot.chunk_count(),
            embedding_model: self.embedding_provider.model_name().to_string(),
            embedding_dimension: self.embedding_provider.dimension(),
            chat_model: self.chat_provider.model().to_string(),
            chunk_size: self.chunker.chunk_size(),
            chunk_overlap: self.chunker.chunk_overlap(),
        }
    }

    /// Embed texts in configured batches, each bounded by the embedding timeout
    ///
    /// Any failed batch fails the whole call.
    pub(crate) async fn embed_all(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, RagError> {
        let batch_size = self.config.embedding.batch_size;
        let timeout_secs = self.config.embedding.timeout_secs;
        let mut all_embeddings = Vec::with_capacity(texts.len());
        let total_batches = texts.len().div_ceil(batch_size);

        for (batch_idx, batch) in texts.chunks(batch_size).enumerate() {
            let batch: Vec<String> = batch.to_vec();
            let expected = batch.len();

            let provider = Arc::clone(&self.embedding_provider);
            let embed_future = tokio::task::spawn_blocking(move || provider.embed_batch(batch));

            let embeddings =
                match tokio::time::timeout(Duration::from_secs(timeout_secs), embed_future).await {
                    Ok(Ok(Ok(embeddings))) => embeddings,
                    Ok(Ok(Err(e))) => {
                        return Err(EmbeddingError::GenerationFailed(format!("{:#}", e)).into());
                    }
                    Ok(Err(e)) => {
                        return Err(EmbeddingError::GenerationFailed(format!(
                            "Embedding task panicked: {}",
                            e
                        ))
                        .into());
                    }
                    Err(_) => return Err(EmbeddingError::Timeout(timeout_secs).into()),
                };

            if embeddings.len() != expected {
                return Err(EmbeddingError::CountMismatch {
                    expected,
                    actual: embeddings.len(),
                }
                .into());
            }

            tracing::debug!("Embedded batch {}/{}", batch_idx + 1, total_batches);
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session corpus
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Get the embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embedding_provider.dimension()
    }
}
