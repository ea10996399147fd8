use super::decoder::decode_text;
use super::document::{Document, DocumentFormat};
use crate::error::LoaderError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads plain-text files, recovering from unknown encodings
///
/// A directory path loads every `.txt` file beneath it; a file path must be a
/// regular `.txt` file.
pub struct TextFileLoader {
    path: PathBuf,
}

impl TextFileLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<Vec<Document>, LoaderError> {
        if self.path.is_dir() {
            Ok(self.load_directory())
        } else if self.path.is_file() && has_txt_extension(&self.path) {
            Ok(vec![self.load_file()?])
        } else {
            Err(LoaderError::InvalidInput {
                path: self.path.display().to_string(),
                reason: "Provided path is neither a valid directory nor a .txt file".to_string(),
            })
        }
    }

    fn load_file(&self) -> Result<Document, LoaderError> {
        let bytes = std::fs::read(&self.path).map_err(|e| LoaderError::from_open(&self.path, &e))?;
        Ok(Self::load_bytes(&file_name(&self.path), &bytes))
    }

    fn load_directory(&self) -> Vec<Document> {
        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !has_txt_extension(path) {
                continue;
            }

            match std::fs::read(path) {
                Ok(bytes) => documents.push(Self::load_bytes(&file_name(path), &bytes)),
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }

        tracing::debug!(
            "Loaded {} text files from {:?}",
            documents.len(),
            self.path
        );
        documents
    }

    /// Decode an in-memory upload into a document. Never fails.
    pub fn load_bytes(filename: &str, bytes: &[u8]) -> Document {
        let decoded = decode_text(bytes);
        if decoded.encoding.is_none() {
            tracing::warn!(
                "{} matched no known encoding, invalid bytes were dropped",
                filename
            );
        }
        Document::new(decoded.text, filename, DocumentFormat::Text)
    }
}

// Matches upload routing, which ignores extension case
fn has_txt_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("txt"))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, "hello world").unwrap();

        let docs = TextFileLoader::new(&path).load().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "hello world");
        assert_eq!(docs[0].filename, "notes.txt");
        assert_eq!(docs[0].format, DocumentFormat::Text);
    }

    #[test]
    fn test_load_uppercase_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("NOTES.TXT");
        fs::write(&path, "shouting").unwrap();

        let docs = TextFileLoader::new(&path).load().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "shouting");
        assert_eq!(docs[0].filename, "NOTES.TXT");
    }

    #[test]
    fn test_load_latin1_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacy.txt");
        fs::write(&path, [b'n', b'a', 0xEF, b'v', b'e']).unwrap();

        let docs = TextFileLoader::new(&path).load().unwrap();
        assert_eq!(docs[0].text, "naïve");
    }

    #[test]
    fn test_wrong_extension_is_invalid_input() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.md");
        fs::write(&path, "# heading").unwrap();

        let result = TextFileLoader::new(&path).load();
        assert!(matches!(result, Err(LoaderError::InvalidInput { .. })));
    }

    #[test]
    fn test_missing_path_is_invalid_input() {
        let result = TextFileLoader::new("/nonexistent/file.txt").load();
        assert!(matches!(result, Err(LoaderError::InvalidInput { .. })));
    }

    #[test]
    fn test_load_directory_recurses_and_filters() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(temp_dir.path().join("a.txt"), "first").unwrap();
        fs::write(nested.join("b.txt"), "second").unwrap();
        fs::write(nested.join("C.TXT"), "third").unwrap();
        fs::write(temp_dir.path().join("skip.csv"), "x,y").unwrap();

        let docs = TextFileLoader::new(temp_dir.path()).load().unwrap();
        assert_eq!(docs.len(), 3);
        let mut texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        texts.sort();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_load_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let docs = TextFileLoader::new(temp_dir.path()).load().unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_load_bytes_never_fails() {
        let doc = TextFileLoader::load_bytes("junk.txt", &[b'o', 0x81, b'k']);
        assert_eq!(doc.text, "ok");
        assert_eq!(doc.filename, "junk.txt");
    }

    #[test]
    fn test_load_bytes_utf16() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "wide".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let doc = TextFileLoader::load_bytes("wide.txt", &bytes);
        assert_eq!(doc.text, "wide");
    }
}
