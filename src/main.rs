use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_rag::config::Config;
use doc_rag::indexer::{FileOutcome, MultiFileLoader, TextChunker, UploadedFile};
use doc_rag::mcp_server::RagMcpServer;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "doc-rag", version, about = "Chat over your documents", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config location)
    #[arg(long, short, global = true, env = "DOC_RAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the MCP server over stdio (default)
    Serve,
    /// Load and chunk files, then print a report without embedding them
    Ingest {
        /// Files to load (.txt, .pdf, .docx)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print version and build information
    Version,
}

#[derive(Debug, Serialize)]
struct IngestReport {
    files: Vec<FileOutcome>,
    documents: usize,
    characters: usize,
    chunks: usize,
    chunk_size: usize,
    chunk_overlap: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config =
                Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
            RagMcpServer::serve_stdio(config).await?;
        }
        Command::Ingest { files } => {
            let config =
                Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
            let report = tokio::task::spawn_blocking(move || ingest(&config, files))
                .await
                .context("Ingest task panicked")??;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Version => {
            println!("doc-rag {}", env!("CARGO_PKG_VERSION"));
            println!("built:  {}", env!("BUILD_TIMESTAMP"));
            println!("commit: {}", env!("GIT_COMMIT_HASH"));
        }
    }

    Ok(())
}

fn ingest(config: &Config, files: Vec<PathBuf>) -> Result<IngestReport> {
    let uploads: Vec<UploadedFile> = files
        .into_iter()
        .map(|path| UploadedFile::from_path(path, None))
        .collect();

    let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    let mut loader = MultiFileLoader::new().with_max_file_size(config.loading.max_file_size);
    let outcomes = loader.load_batch(&uploads)?;

    let documents = loader.documents();
    let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
    let chunks = chunker.split_batch(&texts);

    tracing::info!(
        "Ingested {} documents into {} chunks",
        documents.len(),
        chunks.len()
    );

    Ok(IngestReport {
        documents: documents.len(),
        characters: documents.iter().map(|d| d.char_count).sum(),
        chunks: chunks.len(),
        chunk_size: chunker.chunk_size(),
        chunk_overlap: chunker.chunk_overlap(),
        files: outcomes,
    })
}
