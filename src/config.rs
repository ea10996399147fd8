/// Configuration system for doc-rag
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, RagError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Chat completion configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// File loading configuration
    #[serde(default)]
    pub loading: LoadingConfig,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2", "BAAI/bge-small-en-v1.5")
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Batch size for embedding generation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Timeout in seconds for one embedding batch
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Directory where downloaded models are cached
    #[serde(default = "default_model_cache_dir")]
    pub cache_dir: PathBuf,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks; must be smaller than chunk_size
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks folded into the system prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Chat completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Completion model name
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base system prompt used for every chat turn
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Request timeout in seconds
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,

    /// Retries on rate limiting and server errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// File loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    /// Maximum size of a single uploaded file (in bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

// Default value functions
fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_model_cache_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_model_cache_dir()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    3
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful AI assistant with a retro neon aesthetic. Keep your responses concise and engaging.".to_string()
}

fn default_chat_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout(),
            cache_dir: default_model_cache_dir(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_chat_model(),
            api_key_env: default_api_key_env(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_chat_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, RagError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), RagError> {
        if self.embedding.batch_size == 0 {
            return Err(invalid("embedding.batch_size", "must be greater than 0"));
        }

        if self.embedding.timeout_secs == 0 {
            return Err(invalid("embedding.timeout_secs", "must be greater than 0"));
        }

        if self.chunking.chunk_size == 0 {
            return Err(invalid("chunking.chunk_size", "must be greater than 0"));
        }

        // A zero stride would never advance through the text
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(invalid(
                "chunking.chunk_overlap",
                &format!(
                    "must be less than chunk_size ({}), got {}",
                    self.chunking.chunk_size, self.chunking.chunk_overlap
                ),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(invalid("retrieval.top_k", "must be greater than 0"));
        }

        if self.chat.timeout_secs == 0 {
            return Err(invalid("chat.timeout_secs", "must be greater than 0"));
        }

        if self.chat.api_base.trim().is_empty() {
            return Err(invalid("chat.api_base", "must not be empty"));
        }

        if self.loading.max_file_size == 0 {
            return Err(invalid("loading.max_file_size", "must be greater than 0"));
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    ///
    /// Values that fail to parse are ignored and the current value is kept.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("DOC_RAG_MODEL") {
            self.embedding.model_name = model;
        }

        if let Some(size) = lookup("DOC_RAG_BATCH_SIZE").and_then(|v| v.parse().ok()) {
            self.embedding.batch_size = size;
        }

        if let Some(size) = lookup("DOC_RAG_CHUNK_SIZE").and_then(|v| v.parse().ok()) {
            self.chunking.chunk_size = size;
        }

        if let Some(overlap) = lookup("DOC_RAG_CHUNK_OVERLAP").and_then(|v| v.parse().ok()) {
            self.chunking.chunk_overlap = overlap;
        }

        if let Some(top_k) = lookup("DOC_RAG_TOP_K").and_then(|v| v.parse().ok()) {
            self.retrieval.top_k = top_k;
        }

        if let Some(api_base) = lookup("DOC_RAG_CHAT_API_BASE") {
            self.chat.api_base = api_base;
        }

        if let Some(model) = lookup("DOC_RAG_CHAT_MODEL") {
            self.chat.model = model;
        }
    }

    /// Load from an explicit file when given, otherwise the default location,
    /// then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, RagError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::load_or_default()?,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, RagError> {
        Self::load(None)
    }
}

fn invalid(key: &str, reason: &str) -> RagError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.embedding.model_name, "all-MiniLM-L6-v2");
        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.chat.model, "gpt-4.1-mini");
        assert_eq!(config.chat.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_overlap_equal_to_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 100;

        let result = config.validate();
        assert!(matches!(
            result.unwrap_err(),
            RagError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "chunking.chunk_overlap"
        ));
    }

    #[test]
    fn test_validate_overlap_greater_than_size() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 0;
        config.chunking.chunk_overlap = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_batch_size() {
        let mut config = Config::default();
        config.embedding.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            RagError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_empty_api_base() {
        let mut config = Config::default();
        config.chat.api_base = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let mut config = Config::default();
        config.embedding.batch_size = 64;
        config.chunking.chunk_size = 500;
        config.chunking.chunk_overlap = 50;

        config.save(path).unwrap();
        let loaded = Config::from_file(path).unwrap();

        assert_eq!(loaded.embedding.batch_size, 64);
        assert_eq!(loaded.chunking.chunk_size, 500);
        assert_eq!(loaded.chunking.chunk_overlap, 50);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::from_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(
            result.unwrap_err(),
            RagError::Config(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "invalid toml {{{ content").unwrap();

        let result = Config::from_file(temp_file.path());
        assert!(matches!(
            result.unwrap_err(),
            RagError::Config(ConfigError::ParseFailed(_))
        ));
    }

    #[test]
    fn test_from_file_empty_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "").unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.retrieval.top_k, 3);
    }

    #[test]
    fn test_from_file_partial_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let partial_config = r#"
[chunking]
chunk_size = 400
        "#;
        std::fs::write(temp_file.path(), partial_config).unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.embedding.model_name, "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_from_file_rejects_invalid_overlap() {
        let temp_file = NamedTempFile::new().unwrap();
        let bad_config = r#"
[chunking]
chunk_size = 100
chunk_overlap = 150
        "#;
        std::fs::write(temp_file.path(), bad_config).unwrap();

        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("model_name"));
        assert!(toml_str.contains("chunk_overlap"));
        assert!(toml_str.contains("top_k"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup_from(&[
            ("DOC_RAG_MODEL", "BAAI/bge-small-en-v1.5"),
            ("DOC_RAG_BATCH_SIZE", "8"),
            ("DOC_RAG_CHUNK_SIZE", "300"),
            ("DOC_RAG_CHUNK_OVERLAP", "30"),
            ("DOC_RAG_TOP_K", "5"),
            ("DOC_RAG_CHAT_MODEL", "gpt-4o-mini"),
            ("DOC_RAG_CHAT_API_BASE", "http://localhost:8080/v1"),
        ]));

        assert_eq!(config.embedding.model_name, "BAAI/bge-small-en-v1.5");
        assert_eq!(config.embedding.batch_size, 8);
        assert_eq!(config.chunking.chunk_size, 300);
        assert_eq!(config.chunking.chunk_overlap, 30);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.chat.model, "gpt-4o-mini");
        assert_eq!(config.chat.api_base, "http://localhost:8080/v1");
    }

    #[test]
    fn test_apply_overrides_with_invalid_values() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup_from(&[
            ("DOC_RAG_BATCH_SIZE", "not_a_number"),
            ("DOC_RAG_TOP_K", "-1"),
        ]));

        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.retrieval.top_k, 3);
    }

    #[test]
    fn test_apply_overrides_can_break_validation() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup_from(&[("DOC_RAG_CHUNK_OVERLAP", "1000")]));
        assert!(config.validate().is_err());
    }
}
