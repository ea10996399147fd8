use crate::indexer::FileOutcome;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A file to add to the corpus
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileUpload {
    /// Path to the file on disk
    pub path: String,
    /// Name used to detect the format and attribute documents
    /// (defaults to the last component of `path`)
    #[serde(default)]
    pub filename: Option<String>,
}

/// Request to upload a batch of files
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadRequest {
    /// Files to load; .txt, .pdf and .docx are supported
    pub files: Vec<FileUpload>,
}

/// Response from an upload
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    /// One outcome per uploaded file, in request order
    pub files: Vec<FileOutcome>,
    /// Chunks added by this upload
    pub new_chunks: usize,
    /// Chunks in the corpus after this upload
    pub total_chunks: usize,
    /// Every filename uploaded so far, in first-seen order
    pub filenames: Vec<String>,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

/// Request to chat with the assistant
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,
    /// Ground the reply in uploaded documents (default: true)
    #[serde(default = "default_use_rag")]
    pub use_rag: bool,
}

fn default_use_rag() -> bool {
    true
}

impl UploadRequest {
    /// Check the request shape before touching the filesystem
    pub fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() {
            return Err("files must not be empty".to_string());
        }
        for (i, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                return Err(format!("files[{}].path must not be empty", i));
            }
            if let Some(name) = &file.filename
                && name.trim().is_empty()
            {
                return Err(format!("files[{}].filename must not be blank", i));
            }
        }
        Ok(())
    }
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.message.trim().is_empty() {
            return Err("message must not be empty".to_string());
        }
        Ok(())
    }
}

/// Response from a chat turn
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatResponse {
    /// The assistant's reply
    pub response: String,
    /// Whether retrieved context was added to the system prompt
    pub context_used: bool,
    /// Number of chunks folded into the prompt
    pub retrieved_chunks: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

/// Request to clear all uploaded files
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClearRequest {}

/// Response from clear operation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClearResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Optional message
    pub message: String,
}

/// Request for the current corpus status
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusRequest {}

/// Current corpus and model status
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
    /// Uploaded filenames, in first-seen order
    pub filenames: Vec<String>,
    /// Chunks currently indexed
    pub total_chunks: usize,
    /// Embedding model name
    pub embedding_model: String,
    /// Embedding dimension
    pub embedding_dimension: usize,
    /// Chat completion model
    pub chat_model: String,
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Chunk overlap in characters
    pub chunk_overlap: usize,
}

#[cfg(test)]
mod tests;
