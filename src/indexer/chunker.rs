use crate::error::ChunkingError;

/// Fixed-window character splitter with overlap
///
/// Windows start at offset 0 and advance by `chunk_size - chunk_overlap`
/// characters, so consecutive chunks share exactly `chunk_overlap`
/// characters. The last chunk may be shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::InvalidChunkSize(format!(
                "chunk_size ({}) must be greater than chunk_overlap ({})",
                chunk_size, chunk_overlap
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Split one text into overlapping chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        // Byte offset of every char boundary, including the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = boundaries.len() - 1;

        let mut chunks = Vec::with_capacity(char_len.div_ceil(self.step()));
        let mut start = 0;
        while start < char_len {
            let end = (start + self.chunk_size).min(char_len);
            chunks.push(text[boundaries[start]..boundaries[end]].to_string());
            start += self.step();
        }

        chunks
    }

    /// Split several texts, flattened in document order then position order
    pub fn split_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts
            .iter()
            .flat_map(|text| self.split(text.as_ref()))
            .collect()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}
