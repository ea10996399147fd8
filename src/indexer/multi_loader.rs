use super::docx_extractor::DocxLoader;
use super::document::{Document, DocumentFormat};
use super::pdf_extractor::PdfLoader;
use super::text_loader::TextFileLoader;
use crate::error::LoaderError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where an uploaded file's content comes from
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// A file on disk
    Path(PathBuf),
    /// Content already in memory
    Bytes(Vec<u8>),
}

/// One uploaded file: its content plus the filename used for routing and provenance
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub source: UploadSource,
}

impl UploadedFile {
    /// A file on disk, named after the last path component unless a name is given
    pub fn from_path(path: impl Into<PathBuf>, filename: Option<String>) -> Self {
        let path = path.into();
        let filename = filename.unwrap_or_else(|| super::text_loader::file_name(&path));
        Self {
            filename,
            source: UploadSource::Path(path),
        }
    }

    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            source: UploadSource::Bytes(bytes),
        }
    }

    fn size(&self) -> Option<u64> {
        match &self.source {
            UploadSource::Path(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            UploadSource::Bytes(bytes) => Some(bytes.len() as u64),
        }
    }
}

/// Result of loading one file of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FileOutcome {
    pub filename: String,
    pub format: DocumentFormat,
    #[serde(flatten)]
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Loaded { documents: usize, characters: usize },
    Failed { reason: String },
}

impl FileOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, FileStatus::Loaded { .. })
    }
}

/// Routes files to a format loader and records which file each document came from
///
/// `documents()` and `provenance()` always have the same length; entry `i`
/// of the latter names the uploaded file behind document `i`.
#[derive(Debug, Default)]
pub struct MultiFileLoader {
    documents: Vec<Document>,
    provenance: Vec<String>,
    max_file_size: Option<u64>,
}

impl MultiFileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject files larger than `max` bytes
    pub fn with_max_file_size(mut self, max: u64) -> Self {
        self.max_file_size = Some(max);
        self
    }

    /// Check that every file in a batch has a supported extension
    ///
    /// Runs before any file is touched, so one bad name fails the whole batch.
    pub fn check_formats(files: &[UploadedFile]) -> Result<Vec<DocumentFormat>, LoaderError> {
        files
            .iter()
            .map(|file| {
                DocumentFormat::from_filename(&file.filename).ok_or_else(|| {
                    LoaderError::UnsupportedFormat {
                        filename: file.filename.clone(),
                        extension: DocumentFormat::extension_of(&file.filename),
                    }
                })
            })
            .collect()
    }

    /// Load a single file and record its documents
    pub fn load_file(&mut self, file: &UploadedFile) -> Result<usize, LoaderError> {
        let format = DocumentFormat::from_filename(&file.filename).ok_or_else(|| {
            LoaderError::UnsupportedFormat {
                filename: file.filename.clone(),
                extension: DocumentFormat::extension_of(&file.filename),
            }
        })?;
        let documents = self.load_one(file, format)?;
        Ok(self.record(&file.filename, documents))
    }

    /// Load a batch concurrently, one outcome per file in input order
    ///
    /// Extensions are checked for the whole batch first. After that, a file
    /// that fails to load is reported in its outcome and does not affect the
    /// others.
    pub fn load_batch(&mut self, files: &[UploadedFile]) -> Result<Vec<FileOutcome>, LoaderError> {
        let formats = Self::check_formats(files)?;

        let results: Vec<Result<Vec<Document>, LoaderError>> = files
            .par_iter()
            .zip(formats.par_iter())
            .map(|(file, format)| self.load_one(file, *format))
            .collect();

        let outcomes = files
            .iter()
            .zip(formats)
            .zip(results)
            .map(|((file, format), result)| {
                let status = match result {
                    Ok(documents) => {
                        let characters = documents.iter().map(|d| d.char_count).sum();
                        let count = self.record(&file.filename, documents);
                        tracing::debug!(
                            "Loaded {} ({} documents, {} characters)",
                            file.filename,
                            count,
                            characters
                        );
                        FileStatus::Loaded {
                            documents: count,
                            characters,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", file.filename, e);
                        FileStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                FileOutcome {
                    filename: file.filename.clone(),
                    format,
                    status,
                }
            })
            .collect();

        Ok(outcomes)
    }

    fn load_one(
        &self,
        file: &UploadedFile,
        format: DocumentFormat,
    ) -> Result<Vec<Document>, LoaderError> {
        if let (Some(max), Some(size)) = (self.max_file_size, file.size())
            && size > max
        {
            return Err(LoaderError::FileTooLarge {
                file: file.filename.clone(),
                size,
                max,
            });
        }

        let mut documents = match &file.source {
            // Temporary upload paths may not carry the declared extension; those
            // are read directly and decoded as the declared format.
            UploadSource::Path(path) if DocumentFormat::from_path(path) == Some(format) => {
                match format {
                    DocumentFormat::Text => TextFileLoader::new(path).load()?,
                    DocumentFormat::Pdf => PdfLoader::new(path).load()?,
                    DocumentFormat::Docx => DocxLoader::new(path).load()?,
                }
            }
            UploadSource::Path(path) => {
                let bytes = std::fs::read(path).map_err(|e| LoaderError::from_open(path, &e))?;
                vec![Self::load_bytes(&file.filename, &bytes, format)?]
            }
            UploadSource::Bytes(bytes) => vec![Self::load_bytes(&file.filename, bytes, format)?],
        };

        // Documents are attributed to the uploaded name, not a temporary path
        for document in documents.iter_mut() {
            document.filename = file.filename.clone();
        }
        Ok(documents)
    }

    fn load_bytes(
        filename: &str,
        bytes: &[u8],
        format: DocumentFormat,
    ) -> Result<Document, LoaderError> {
        match format {
            DocumentFormat::Text => Ok(TextFileLoader::load_bytes(filename, bytes)),
            DocumentFormat::Pdf => Ok(PdfLoader::load_bytes(filename, bytes)),
            DocumentFormat::Docx => {
                DocxLoader::load_bytes(filename, bytes).map_err(|e| LoaderError::Processing {
                    path: filename.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn record(&mut self, filename: &str, documents: Vec<Document>) -> usize {
        let count = documents.len();
        for document in documents {
            self.documents.push(document);
            self.provenance.push(filename.to_string());
        }
        count
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn provenance(&self) -> &[String] {
        &self.provenance
    }

    /// Consume the loader, returning documents and their provenance
    pub fn into_parts(self) -> (Vec<Document>, Vec<String>) {
        (self.documents, self.provenance)
    }
}
