use super::document::{Document, DocumentFormat};
use super::text_loader::file_name;
use crate::error::LoaderError;
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild, read_docx,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extract the text of a DOCX package
///
/// Body paragraphs come first, in order, then the cells of every table in
/// row-major order. Each paragraph and each cell is followed by a line break.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, docx_rs::ReaderError> {
    let docx = read_docx(bytes)?;

    let mut paragraphs = String::new();
    let mut tables = String::new();
    for child in docx.document.children.iter() {
        match child {
            DocumentChild::Paragraph(p) => {
                paragraphs.push_str(&paragraph_text(p));
                paragraphs.push('\n');
            }
            DocumentChild::Table(table) => push_table_cells(table, &mut tables),
            other => debug!("Skipping DOCX element {:?}", other),
        }
    }

    paragraphs.push_str(&tables);
    Ok(paragraphs)
}

fn push_table_cells(table: &Table, out: &mut String) {
    for row in table.rows.iter() {
        #[allow(irrefutable_let_patterns)]
        let TableChild::TableRow(row) = row else {
            continue;
        };

        for cell in row.cells.iter() {
            #[allow(irrefutable_let_patterns)]
            let TableRowChild::TableCell(cell) = cell else {
                continue;
            };

            // A cell's text is its paragraphs joined by line breaks
            let cell_text: Vec<String> = cell
                .children
                .iter()
                .filter_map(|content| match content {
                    TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                    _ => None,
                })
                .collect();
            out.push_str(&cell_text.join("\n"));
            out.push('\n');
        }
    }
}

fn paragraph_text(p: &Paragraph) -> String {
    let mut out = String::new();

    for child in p.children.iter() {
        match child {
            ParagraphChild::Run(run) => push_run_children(&run.children, &mut out),
            ParagraphChild::Hyperlink(link) => {
                for link_child in link.children.iter() {
                    if let ParagraphChild::Run(run) = link_child {
                        push_run_children(&run.children, &mut out);
                    }
                }
            }
            _ => {}
        }
    }

    out
}

fn push_run_children(children: &[RunChild], out: &mut String) {
    for child in children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Loads a single DOCX file into a document
pub struct DocxLoader {
    path: PathBuf,
}

impl DocxLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<Vec<Document>, LoaderError> {
        let bytes = std::fs::read(&self.path).map_err(|e| LoaderError::from_open(&self.path, &e))?;
        if !is_docx(&self.path) {
            return Err(LoaderError::InvalidInput {
                path: self.path.display().to_string(),
                reason: "Provided path is not a .docx file".to_string(),
            });
        }

        let document = Self::load_bytes(&file_name(&self.path), &bytes).map_err(|e| {
            LoaderError::Processing {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(vec![document])
    }

    /// Extract an in-memory DOCX into a document
    ///
    /// Malformed packages are not recovered from.
    pub fn load_bytes(filename: &str, bytes: &[u8]) -> Result<Document, docx_rs::ReaderError> {
        let text = extract_docx_text(bytes)?;
        Ok(Document::new(text, filename, DocumentFormat::Docx))
    }
}

fn is_docx(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("docx"))
}
