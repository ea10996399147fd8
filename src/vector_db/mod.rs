//! Vector index over the chunk corpus
//!
//! The index is rebuilt from the full chunk sequence on every upload, so it
//! only needs brute-force cosine search over an immutable set of vectors.

mod memory_index;

pub use memory_index::{MemoryVectorIndex, SearchHit, cosine_similarity};
