/// Centralized error types for doc-rag using thiserror
///
/// Provides domain-specific error types so callers can tell access problems
/// from content problems, and configuration mistakes from runtime failures.
use thiserror::Error;

/// Main error type for the RAG system
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector index error: {0}")]
    VectorDb(#[from] VectorDbError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while turning uploaded files into documents
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: String, reason: String },

    #[error("Cannot access file at '{path}': {reason}")]
    Access { path: String, reason: String },

    #[error("Error processing file at '{path}': {reason}")]
    Processing { path: String, reason: String },

    #[error("Unsupported file type: {extension} ({filename})")]
    UnsupportedFormat { filename: String, extension: String },

    #[error("File '{file}' exceeds maximum size: {size} > {max}")]
    FileTooLarge { file: String, size: u64, max: u64 },

    #[error("No valid documents could be loaded from the upload")]
    NoDocuments,
}

/// Errors related to text chunking
#[derive(Error, Debug)]
pub enum ChunkingError {
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(String),
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    InitializationFailed(String),

    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),

    #[error("Embedding generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Errors related to the vector index
#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("Chunk and embedding counts differ: {chunks} chunks, {embeddings} embeddings")]
    LengthMismatch { chunks: usize, embeddings: usize },

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index does not extend the current {base} chunks (index has {indexed})")]
    BaseNotExtended { base: usize, indexed: usize },
}

/// Errors returned by the chat completion service
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("API key not set in environment variable {0}")]
    MissingApiKey(String),

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Empty {0}")]
    Empty(String),
}

// Conversion from anyhow::Error to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Other(format!("{:#}", err))
    }
}

impl LoaderError {
    /// Map an I/O failure of the open step to the right error kind.
    ///
    /// Missing files and permission problems are access errors; anything else
    /// that goes wrong while opening is a processing error.
    pub fn from_open(path: &std::path::Path, err: &std::io::Error) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                LoaderError::Access {
                    path,
                    reason: err.to_string(),
                }
            }
            _ => LoaderError::Processing {
                path,
                reason: err.to_string(),
            },
        }
    }
}

// Helper methods for RagError
impl RagError {
    /// Check if this is a user error (bad input, bad config) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RagError::Validation(_)
                | RagError::Chunking(_)
                | RagError::Config(ConfigError::InvalidValue { .. })
                | RagError::Loader(
                    LoaderError::InvalidInput { .. }
                        | LoaderError::UnsupportedFormat { .. }
                        | LoaderError::FileTooLarge { .. }
                )
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RagError::Embedding(EmbeddingError::Timeout(_))
                | RagError::Chat(ChatError::RequestFailed(_))
                | RagError::Io(_)
        )
    }
}
