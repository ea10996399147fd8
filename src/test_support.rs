//! Deterministic providers for unit tests

use crate::chat::ChatProvider;
use crate::client::RagClient;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::ChatError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const FAKE_DIM: usize = 16;

/// Bag-of-words embedder hashing each word into one of `FAKE_DIM` buckets
#[derive(Default)]
pub(crate) struct FakeEmbedder {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub delay_ms: u64,
}

impl EmbeddingProvider for FakeEmbedder {
    fn embed_batch(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.delay_ms));
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("model unavailable");
        }
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    fn dimension(&self) -> usize {
        FAKE_DIM
    }

    fn model_name(&self) -> &str {
        "fake-embedder"
    }
}

fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; FAKE_DIM];
    for word in text.split_whitespace() {
        let word = word.to_lowercase();
        let bucket = word.bytes().map(usize::from).sum::<usize>() % FAKE_DIM;
        v[bucket] += 1.0;
    }
    v
}

/// Chat provider that records every prompt and echoes the user message
#[derive(Default)]
pub(crate) struct RecordingChat {
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl RecordingChat {
    pub fn last_system_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().unwrap().0.clone()
    }
}

#[async_trait]
impl ChatProvider for RecordingChat {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, ChatError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_message.to_string()));
        Ok(format!("echo: {}", user_message))
    }

    fn model(&self) -> &str {
        "recording-chat"
    }
}

/// Small chunks and batches so short fixtures exercise the whole pipeline
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.chunking.chunk_size = 100;
    config.chunking.chunk_overlap = 20;
    config.embedding.batch_size = 4;
    config
}

pub(crate) fn create_client_with(
    config: Config,
    embedder: FakeEmbedder,
) -> (RagClient, Arc<FakeEmbedder>, Arc<RecordingChat>) {
    let embedder = Arc::new(embedder);
    let chat = Arc::new(RecordingChat::default());
    let client = RagClient::with_providers(config, embedder.clone(), chat.clone()).unwrap();
    (client, embedder, chat)
}

pub(crate) fn create_test_client() -> (RagClient, Arc<FakeEmbedder>, Arc<RecordingChat>) {
    create_client_with(test_config(), FakeEmbedder::default())
}

pub(crate) fn text_file(name: &str, text: &str) -> (String, Vec<u8>) {
    (name.to_string(), text.as_bytes().to_vec())
}
