//! # Doc RAG - Retrieval-Augmented Chat over Uploaded Documents
//!
//! A Rust library and Model Context Protocol (MCP) server that turns
//! uploaded plain text, PDF and Word documents into a searchable session
//! corpus, and grounds chat replies in the most relevant passages.
//!
//! ## Overview
//!
//! Uploaded files are decoded (text files may be in any of six encodings),
//! split into overlapping fixed-size chunks, embedded locally with FastEmbed,
//! and held in an in-memory vector index. On each chat turn the message is
//! embedded, the closest chunks are retrieved, and they are folded into the
//! system prompt sent to an OpenAI-compatible chat completion endpoint.
//!
//! ## Key Features
//!
//! - **Multi-format Loading**: `.txt`, `.pdf` (per-page isolation) and `.docx`
//! - **Encoding Fallback**: UTF-8, UTF-16 (BOM, LE, BE), Latin-1, Windows-1252
//! - **Fault Isolation**: a broken page or file never aborts its siblings
//! - **Character Chunking**: fixed window with configurable overlap
//! - **Local Embeddings**: FastEmbed (all-MiniLM-L6-v2 by default)
//! - **Session Corpus**: uploads accumulate until cleared; readers never see a
//!   half-built index
//! - **MCP Protocol**: 4 tools and 3 slash commands
//!
//! ## Architecture
//!
//! ```text
//!  uploads ──► MultiFileLoader ──► TextChunker ──► EmbeddingProvider
//!                (txt/pdf/docx)                          │
//!                                                        ▼
//!  chat ──► embed message ──► MemoryVectorIndex ◄── Corpus snapshot
//!                                   │
//!                                   ▼
//!                           ContextAssembler ──► ChatProvider
//! ```
//!
//! ## Modules
//!
//! - [`mcp_server`]: MCP protocol server implementation with tools and prompts
//! - [`client`]: Upload, chat, clear and status operations over a session corpus
//! - [`indexer`]: Decoding, document loaders and chunking
//! - [`embedding`]: Embedding generation using FastEmbed
//! - [`vector_db`]: In-memory cosine similarity index
//! - [`chat`]: Chat completion providers
//! - [`config`]: Configuration management with environment variable support
//! - [`types`]: MCP request/response types with JSON schema
//! - [`error`]: Error types
//! - [`paths`]: Platform config and cache locations
//!
//! ## Usage Example
//!
//! ```no_run
//! use doc_rag::{Config, RagMcpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Serve over stdio (MCP protocol)
//!     RagMcpServer::serve_stdio(Config::new()?).await?;
//!     Ok(())
//! }
//! ```

/// Chat completion providers (OpenAI-compatible)
pub mod chat;

/// Library client: upload, chat, clear and status
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding generation using FastEmbed
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Text decoding, document loaders and chunking
pub mod indexer;

/// MCP server implementation with tools and prompts
pub mod mcp_server;

/// Platform-specific config and cache directories
pub mod paths;

/// MCP request/response types with JSON schema definitions
pub mod types;

/// In-memory vector index
pub mod vector_db;

#[cfg(test)]
mod test_support;

pub use client::RagClient;
pub use config::Config;
pub use error::RagError;
pub use mcp_server::RagMcpServer;
pub use types::{
    ChatRequest, ChatResponse, ClearRequest, ClearResponse, FileUpload, StatusRequest,
    StatusResponse, UploadRequest, UploadResponse,
};
