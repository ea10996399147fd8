use super::document::{Document, DocumentFormat};
use super::text_loader::file_name;
use crate::error::LoaderError;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Extract the text of a PDF, isolating failures page by page
///
/// A page that fails to extract is skipped with a warning. A document that
/// cannot be parsed at all, or whose pages yield only whitespace, produces
/// an empty string.
pub fn extract_pdf_text(bytes: &[u8], source: &str) -> String {
    let start = Instant::now();

    let document = match lopdf::Document::load_mem(bytes) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Failed to parse PDF {}: {}", source, e);
            return String::new();
        }
    };

    let pages = document.get_pages().into_keys().map(|page_num| {
        let text = document
            .extract_text(&[page_num])
            .map_err(|e| e.to_string());
        (page_num, text)
    });
    let text = assemble_pages(pages, source);

    tracing::debug!(
        "Finished processing PDF {}, took {}ms",
        source,
        start.elapsed().as_millis()
    );
    text
}

/// Join per-page extraction results into one document text
///
/// Every extracted page is followed by a line break. Failed pages are logged
/// and left out.
pub fn assemble_pages<I>(pages: I, source: &str) -> String
where
    I: IntoIterator<Item = (u32, Result<String, String>)>,
{
    let mut text = String::new();
    for (page_num, page) in pages {
        match page {
            Ok(content) => {
                text.push_str(&content);
                text.push('\n');
            }
            Err(e) => tracing::warn!("Skipping page {} of {}: {}", page_num, source, e),
        }
    }

    if text.trim().is_empty() {
        String::new()
    } else {
        text
    }
}

/// Loads PDF files into documents, one document per file
pub struct PdfLoader {
    path: PathBuf,
}

impl PdfLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<Vec<Document>, LoaderError> {
        if self.path.is_dir() {
            return Ok(self.load_directory());
        }

        // Opening the file is its own step so access problems are reported
        // separately from unreadable content.
        let bytes = std::fs::read(&self.path).map_err(|e| LoaderError::from_open(&self.path, &e))?;
        if !is_pdf(&self.path) {
            return Err(LoaderError::InvalidInput {
                path: self.path.display().to_string(),
                reason: "Provided path is neither a valid directory nor a .pdf file".to_string(),
            });
        }

        Ok(vec![Self::load_bytes(&file_name(&self.path), &bytes)])
    }

    fn load_directory(&self) -> Vec<Document> {
        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_pdf(path) {
                continue;
            }

            let filename = file_name(path);
            match std::fs::read(path) {
                Ok(bytes) => documents.push(Self::load_bytes(&filename, &bytes)),
                Err(e) => {
                    tracing::warn!("Failed to read PDF {:?}: {}", path, e);
                    documents.push(Document::empty(filename, DocumentFormat::Pdf));
                }
            }
        }

        documents
    }

    /// Extract an in-memory PDF into a document. Never fails.
    pub fn load_bytes(filename: &str, bytes: &[u8]) -> Document {
        Document::new(extract_pdf_text(bytes, filename), filename, DocumentFormat::Pdf)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
}
