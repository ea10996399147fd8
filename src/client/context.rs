use crate::vector_db::{MemoryVectorIndex, SearchHit};

const CONTEXT_HEADER: &str = "Use the following excerpts from the user's uploaded documents to answer their question. \
If the excerpts do not contain the answer, say so instead of guessing.";

/// Folds retrieved chunks into the base system prompt
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    base_prompt: String,
    top_k: usize,
}

/// A system prompt plus the chunks that went into it
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub system_prompt: String,
    pub retrieved: Vec<SearchHit>,
}

impl AssembledPrompt {
    pub fn context_used(&self) -> bool {
        !self.retrieved.is_empty()
    }
}

impl ContextAssembler {
    pub fn new(base_prompt: impl Into<String>, top_k: usize) -> Self {
        Self {
            base_prompt: base_prompt.into(),
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    /// Query `index` with an embedded message and build the prompt
    ///
    /// No index, or no hits, leaves the base prompt unchanged.
    pub fn assemble(&self, index: Option<&MemoryVectorIndex>, query: &[f32]) -> AssembledPrompt {
        let retrieved = index
            .map(|index| index.search(query, self.top_k))
            .unwrap_or_default();
        self.with_hits(retrieved)
    }

    /// Build the prompt from chunks that were already retrieved
    pub fn with_hits(&self, retrieved: Vec<SearchHit>) -> AssembledPrompt {
        if retrieved.is_empty() {
            return self.base_only();
        }

        let context = retrieved
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        AssembledPrompt {
            system_prompt: format!(
                "{}\n\n{}\n\nContext:\n{}",
                self.base_prompt, CONTEXT_HEADER, context
            ),
            retrieved,
        }
    }

    /// The base prompt with no retrieved context
    pub fn base_only(&self) -> AssembledPrompt {
        AssembledPrompt {
            system_prompt: self.base_prompt.clone(),
            retrieved: Vec::new(),
        }
    }
}
