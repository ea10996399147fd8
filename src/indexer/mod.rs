//! Document loading and chunking
//!
//! Turns uploaded plain-text, PDF and DOCX files into documents, recovering
//! from unknown text encodings and unreadable PDF pages, and splits document
//! text into overlapping fixed-size chunks for embedding.

mod chunker;
pub mod decoder;
mod document;
mod docx_extractor;
mod multi_loader;
mod pdf_extractor;
mod text_loader;

pub use chunker::TextChunker;
pub use decoder::{Decoded, TextEncoding, decode_text};
pub use document::{Document, DocumentFormat};
pub use docx_extractor::{DocxLoader, extract_docx_text};
pub use multi_loader::{FileOutcome, FileStatus, MultiFileLoader, UploadSource, UploadedFile};
pub use pdf_extractor::{PdfLoader, assemble_pages, extract_pdf_text};
pub use text_loader::TextFileLoader;
