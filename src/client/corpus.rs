//! Running state of everything uploaded in a session
//!
//! Readers take an `Arc<CorpusSnapshot>` and never see a half-built state.
//! Writers serialize on an async mutex, build the next snapshot off to the
//! side, then swap it in.

use crate::error::VectorDbError;
use crate::vector_db::MemoryVectorIndex;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, MutexGuard};

/// Immutable view of the corpus at one point in time
///
/// The chunk sequence is owned by the index, so the index always covers
/// exactly the chunks reported.
#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    filenames: Vec<String>,
    index: Option<Arc<MemoryVectorIndex>>,
}

impl CorpusSnapshot {
    /// Uploaded filenames in first-seen order, without duplicates
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Every chunk across all uploads, in upload order
    pub fn chunks(&self) -> &[String] {
        self.index.as_deref().map(|i| i.chunks()).unwrap_or(&[])
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks().len()
    }

    pub fn index(&self) -> Option<&MemoryVectorIndex> {
        self.index.as_deref()
    }

    /// Shared handle to the index, for carrying it into the next snapshot
    pub fn shared_index(&self) -> Option<Arc<MemoryVectorIndex>> {
        self.index.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty() && self.chunk_count() == 0
    }
}

/// Session-scoped corpus shared by every request
#[derive(Debug, Default)]
pub struct Corpus {
    writer: Mutex<()>,
    current: RwLock<Arc<CorpusSnapshot>>,
}

/// Exclusive right to replace the corpus, held for a whole upload
pub struct CorpusUpdate<'a> {
    _guard: MutexGuard<'a, ()>,
    corpus: &'a Corpus,
    base: Arc<CorpusSnapshot>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&current)
    }

    /// Wait for any other writer, then start an update from the current state
    pub async fn begin_update(&self) -> CorpusUpdate<'_> {
        let guard = self.writer.lock().await;
        CorpusUpdate {
            _guard: guard,
            corpus: self,
            base: self.snapshot(),
        }
    }

    /// Reset filenames, chunks and index together
    pub async fn clear(&self) -> Arc<CorpusSnapshot> {
        let _guard = self.writer.lock().await;
        self.swap(Arc::new(CorpusSnapshot::default()))
    }

    fn swap(&self, next: Arc<CorpusSnapshot>) -> Arc<CorpusSnapshot> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *current, next)
    }
}

impl CorpusUpdate<'_> {
    /// The state this update builds on
    pub fn base(&self) -> &CorpusSnapshot {
        &self.base
    }

    /// Publish a snapshot with `filenames` added and the given index
    ///
    /// The index must cover the base chunks, in order, followed by the new
    /// ones. Anything else is rejected and the current snapshot stays.
    pub fn publish(
        self,
        filenames: &[String],
        index: Option<Arc<MemoryVectorIndex>>,
    ) -> Result<Arc<CorpusSnapshot>, VectorDbError> {
        let base = self.base.chunks();
        let indexed = index.as_deref().map(|i| i.chunks()).unwrap_or(&[]);
        if !indexed.starts_with(base) {
            return Err(VectorDbError::BaseNotExtended {
                base: base.len(),
                indexed: indexed.len(),
            });
        }

        let next = Arc::new(CorpusSnapshot {
            filenames: union_filenames(&self.base.filenames, filenames),
            index,
        });
        self.corpus.swap(Arc::clone(&next));
        Ok(next)
    }
}

/// `existing` followed by each name of `added` not seen before
fn union_filenames(existing: &[String], added: &[String]) -> Vec<String> {
    let mut merged = existing.to_vec();
    for name in added {
        if !merged.contains(name) {
            merged.push(name.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(chunks: &[&str]) -> Arc<MemoryVectorIndex> {
        let chunks: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();
        let embeddings = chunks.iter().map(|_| vec![1.0, 0.0]).collect();
        Arc::new(MemoryVectorIndex::build(chunks, embeddings).unwrap())
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_union_keeps_first_seen_order() {
        let merged = union_filenames(&names(&["a", "b"]), &names(&["c", "a", "c", "d"]));
        assert_eq!(merged, names(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_new_corpus_is_empty() {
        let corpus = Corpus::new();
        let snapshot = corpus.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.chunk_count(), 0);
        assert!(snapshot.index().is_none());
    }

    #[tokio::test]
    async fn test_publish_replaces_snapshot() {
        let corpus = Corpus::new();

        let update = corpus.begin_update().await;
        update
            .publish(&names(&["a.txt"]), Some(index_of(&["one", "two"])))
            .unwrap();

        let snapshot = corpus.snapshot();
        assert_eq!(snapshot.filenames(), ["a.txt"]);
        assert_eq!(snapshot.chunks(), ["one", "two"]);
    }

    #[tokio::test]
    async fn test_old_snapshot_is_unchanged_by_publish() {
        let corpus = Corpus::new();
        corpus
            .begin_update()
            .await
            .publish(&names(&["a.txt"]), Some(index_of(&["one"])))
            .unwrap();
        let before = corpus.snapshot();

        corpus
            .begin_update()
            .await
            .publish(&names(&["b.txt"]), Some(index_of(&["one", "two"])))
            .unwrap();

        assert_eq!(before.chunk_count(), 1);
        assert_eq!(before.filenames(), ["a.txt"]);
        assert_eq!(corpus.snapshot().chunk_count(), 2);
        assert_eq!(corpus.snapshot().filenames(), ["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_dropped_update_keeps_state() {
        let corpus = Corpus::new();
        corpus
            .begin_update()
            .await
            .publish(&names(&["a.txt"]), Some(index_of(&["one"])))
            .unwrap();

        {
            let update = corpus.begin_update().await;
            assert_eq!(update.base().chunk_count(), 1);
            // dropped without publishing
        }

        assert_eq!(corpus.snapshot().filenames(), ["a.txt"]);
        assert_eq!(corpus.snapshot().chunk_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let corpus = Corpus::new();
        corpus
            .begin_update()
            .await
            .publish(&names(&["a.txt"]), Some(index_of(&["one"])))
            .unwrap();

        let previous = corpus.clear().await;
        assert_eq!(previous.chunk_count(), 1);

        let snapshot = corpus.snapshot();
        assert!(snapshot.is_empty());
        assert!(snapshot.filenames().is_empty());
        assert!(snapshot.index().is_none());
    }

    #[tokio::test]
    async fn test_writers_are_serialized() {
        let corpus = Arc::new(Corpus::new());
        let update = corpus.begin_update().await;

        let other = Arc::clone(&corpus);
        let waiter = tokio::spawn(async move {
            let update = other.begin_update().await;
            let base_files = update.base().filenames().to_vec();
            let index = update.base().shared_index();
            update.publish(&names(&["second.txt"]), index).unwrap();
            base_files
        });

        tokio::task::yield_now().await;
        update
            .publish(&names(&["first.txt"]), Some(index_of(&["x"])))
            .unwrap();

        // The second writer started from the first writer's result
        let base_files = waiter.await.unwrap();
        assert_eq!(base_files, names(&["first.txt"]));
        assert_eq!(corpus.snapshot().filenames(), ["first.txt", "second.txt"]);
        assert_eq!(corpus.snapshot().chunks(), ["x"]);
    }

    #[tokio::test]
    async fn test_publish_rejects_index_missing_base_chunks() {
        let corpus = Corpus::new();
        corpus
            .begin_update()
            .await
            .publish(&names(&["a.txt"]), Some(index_of(&["one", "two"])))
            .unwrap();

        let err = corpus
            .begin_update()
            .await
            .publish(&names(&["b.txt"]), Some(index_of(&["one"])))
            .unwrap_err();
        assert!(matches!(
            err,
            VectorDbError::BaseNotExtended {
                base: 2,
                indexed: 1
            }
        ));

        let err = corpus
            .begin_update()
            .await
            .publish(&names(&["c.txt"]), None)
            .unwrap_err();
        assert!(matches!(err, VectorDbError::BaseNotExtended { base: 2, indexed: 0 }));

        let err = corpus
            .begin_update()
            .await
            .publish(&names(&["d.txt"]), Some(index_of(&["two", "one", "three"])))
            .unwrap_err();
        assert!(matches!(err, VectorDbError::BaseNotExtended { .. }));

        let snapshot = corpus.snapshot();
        assert_eq!(snapshot.filenames(), ["a.txt"]);
        assert_eq!(snapshot.chunks(), ["one", "two"]);
    }

    #[tokio::test]
    async fn test_publish_without_index_on_empty_base() {
        let corpus = Corpus::new();
        let snapshot = corpus
            .begin_update()
            .await
            .publish(&names(&["empty.txt"]), None)
            .unwrap();
        assert_eq!(snapshot.filenames(), ["empty.txt"]);
        assert_eq!(snapshot.chunk_count(), 0);
    }
}
