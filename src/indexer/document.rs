//! Document model shared by the format loaders

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source format of an uploaded file, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Extension of a filename: the lowercased text after the last '.'
    ///
    /// A filename with no '.' yields the whole lowercased name.
    pub fn extension_of(filename: &str) -> String {
        filename
            .rsplit('.')
            .next()
            .unwrap_or(filename)
            .to_lowercase()
    }

    /// Route a filename to its format, case-insensitively
    pub fn from_filename(filename: &str) -> Option<Self> {
        Self::from_extension(&Self::extension_of(filename))
    }

    /// Format named by a path's own extension
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| Self::from_extension(&ext.to_string_lossy()))
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "txt" => Some(DocumentFormat::Text),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Text => "txt",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A single logical unit of text extracted from one uploaded file
///
/// The text may be empty when extraction produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub filename: String,
    pub format: DocumentFormat,
    /// SHA-256 of the extracted text, hex encoded
    pub hash: String,
    /// Length of the text in characters
    pub char_count: usize,
}

impl Document {
    pub fn new(text: String, filename: impl Into<String>, format: DocumentFormat) -> Self {
        let hash = calculate_hash(&text);
        let char_count = text.chars().count();
        Self {
            text,
            filename: filename.into(),
            format,
            hash,
            char_count,
        }
    }

    /// An empty placeholder for a file whose extraction yielded nothing
    pub fn empty(filename: impl Into<String>, format: DocumentFormat) -> Self {
        Self::new(String::new(), filename, format)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
