use crate::error::VectorDbError;
use serde::{Deserialize, Serialize};

/// A chunk returned by a nearest-neighbor query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchHit {
    /// The chunk text
    pub text: String,
    /// Cosine similarity to the query (-1.0 to 1.0)
    pub score: f32,
    /// Position of the chunk in the corpus chunk sequence
    pub position: usize,
}

/// Immutable in-memory index pairing each chunk with its embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryVectorIndex {
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
}

impl MemoryVectorIndex {
    /// Build an index over `chunks`, where `embeddings[i]` embeds `chunks[i]`
    pub fn build(chunks: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Self, VectorDbError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorDbError::LengthMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(VectorDbError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        tracing::debug!(
            "Built vector index with {} chunks (dimension {})",
            chunks.len(),
            dimension
        );

        Ok(Self {
            chunks,
            embeddings,
            dimension,
        })
    }

    /// The `k` chunks most similar to `query`, by descending cosine similarity
    ///
    /// Ties keep corpus order. A query of the wrong dimension matches nothing.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if k == 0 || self.chunks.is_empty() || query.len() != self.dimension {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(position, embedding)| (position, cosine_similarity(query, embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(position, score)| SearchHit {
                text: self.chunks[position].clone(),
                score,
                position,
            })
            .collect()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity of two vectors; 0.0 when either is zero or they differ in length
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
