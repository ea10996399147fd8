//! Upload flow: load, chunk, embed, index, publish

use super::RagClient;
use crate::error::{LoaderError, RagError, ValidationError};
use crate::indexer::{FileOutcome, MultiFileLoader, UploadedFile};
use crate::types::{UploadRequest, UploadResponse};
use crate::vector_db::MemoryVectorIndex;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

impl RagClient {
    /// Upload files from disk
    pub async fn upload_files(&self, request: UploadRequest) -> Result<UploadResponse> {
        let files = request
            .files
            .into_iter()
            .map(|file| UploadedFile::from_path(file.path, file.filename))
            .collect();
        self.upload(files).await
    }

    /// Upload in-memory files given as (filename, content) pairs
    pub async fn upload_bytes(&self, files: Vec<(String, Vec<u8>)>) -> Result<UploadResponse> {
        let files = files
            .into_iter()
            .map(|(filename, bytes)| UploadedFile::from_bytes(filename, bytes))
            .collect();
        self.upload(files).await
    }

    /// Add a batch of files to the corpus
    ///
    /// An unsupported extension anywhere in the batch rejects the batch
    /// before any file is read. Files that fail to load are reported in
    /// their outcome; if none loads, the upload fails with `NoDocuments`.
    /// The index is rebuilt over the whole accumulated chunk sequence, and
    /// the corpus is only replaced once that succeeds.
    pub async fn upload(&self, files: Vec<UploadedFile>) -> Result<UploadResponse> {
        let start = Instant::now();

        if files.is_empty() {
            return Err(RagError::from(ValidationError::Empty("file list".to_string())).into());
        }
        MultiFileLoader::check_formats(&files).map_err(RagError::from)?;

        tracing::info!("Loading {} uploaded files", files.len());

        let max_file_size = self.config.loading.max_file_size;
        let chunker = self.chunker;
        let (outcomes, new_chunks) = tokio::task::spawn_blocking(
            move || -> Result<(Vec<FileOutcome>, Vec<String>), LoaderError> {
                let mut loader = MultiFileLoader::new().with_max_file_size(max_file_size);
                let outcomes = loader.load_batch(&files)?;
                let (documents, _provenance) = loader.into_parts();
                let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
                Ok((outcomes, chunker.split_batch(&texts)))
            },
        )
        .await
        .context("Loader task panicked")?
        .map_err(RagError::from)?;

        let loaded: Vec<String> = outcomes
            .iter()
            .filter(|outcome| outcome.is_loaded())
            .map(|outcome| outcome.filename.clone())
            .collect();
        if loaded.is_empty() {
            return Err(RagError::from(LoaderError::NoDocuments).into());
        }

        let update = self.corpus.begin_update().await;
        let base_chunks = update.base().chunk_count();

        let index = if new_chunks.is_empty() {
            // Nothing new to embed; keep the current index as is
            update.base().shared_index()
        } else {
            let mut all_chunks = update.base().chunks().to_vec();
            all_chunks.extend(new_chunks.iter().cloned());

            tracing::info!(
                "Embedding {} chunks ({} new)",
                all_chunks.len(),
                new_chunks.len()
            );
            let embeddings = self.embed_all(all_chunks.clone()).await?;
            Some(Arc::new(
                MemoryVectorIndex::build(all_chunks, embeddings).map_err(RagError::from)?,
            ))
        };

        let snapshot = update.publish(&loaded, index).map_err(RagError::from)?;

        tracing::info!(
            "Upload complete: {} files loaded, {} new chunks, {} total",
            loaded.len(),
            new_chunks.len(),
            snapshot.chunk_count()
        );

        Ok(UploadResponse {
            files: outcomes,
            new_chunks: snapshot.chunk_count() - base_chunks,
            total_chunks: snapshot.chunk_count(),
            filenames: snapshot.filenames().to_vec(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
