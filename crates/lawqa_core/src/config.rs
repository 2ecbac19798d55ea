//! TOML configuration for the corpus, chunker, artifact paths and Ollama endpoints.
//!
//! Every field has a default so an empty (or absent) file yields a working setup
//! that reads `data/docs` and talks to Ollama on `127.0.0.1:11434`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Marker for the top-level "Article" unit of a Vietnamese legal text.
pub const DEFAULT_MARKER_PATTERN: &str = r"^Điều \d+\.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LawQaConfig {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusConfig {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Soft cap on chunk length, in whitespace-separated words.
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    /// Words shared by consecutive sliding windows over an oversized line.
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
    #[serde(default = "default_marker_pattern")]
    pub marker_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    #[serde(default = "default_chunk_cache_path")]
    pub chunk_cache_path: PathBuf,
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OllamaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("data/docs")
}
fn default_chunk_size() -> usize {
    400
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_marker_pattern() -> String {
    DEFAULT_MARKER_PATTERN.to_string()
}
fn default_chunk_cache_path() -> PathBuf {
    PathBuf::from("data/chunks.json")
}
fn default_index_path() -> PathBuf {
    PathBuf::from("data/vector_store.json")
}
fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}
fn default_embed_model() -> String {
    "bge-m3".to_string()
}
fn default_chat_model() -> String {
    "llama3.2".to_string()
}
fn default_embed_batch_size() -> usize {
    32
}
fn default_top_k() -> usize {
    3
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
            marker_pattern: default_marker_pattern(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            chunk_cache_path: default_chunk_cache_path(),
            index_path: default_index_path(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embed_model: default_embed_model(),
            chat_model: default_chat_model(),
            embed_batch_size: default_embed_batch_size(),
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

impl LawQaConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new("CONFIG_READ_FAILED", "Failed to read config file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&raw).map_err(|e| {
            let inner = e.details.clone().unwrap_or_default();
            e.with_details(format!("path={}; {}", path.display(), inner))
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        let cfg: Self = toml::from_str(raw).map_err(|e| {
            AppError::new("CONFIG_INVALID", "Failed to parse config TOML").with_details(e.to_string())
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunking.size == 0 {
            return Err(AppError::new("CONFIG_INVALID", "chunking.size must be at least 1"));
        }
        if self.chunking.marker_pattern.trim().is_empty() {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "chunking.marker_pattern must not be empty",
            ));
        }
        if self.ollama.embed_batch_size == 0 {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "ollama.embed_batch_size must be at least 1",
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(AppError::new("CONFIG_INVALID", "retrieval.top_k must be at least 1"));
        }
        for (name, p) in [
            ("corpus.docs_dir", &self.corpus.docs_dir),
            ("storage.chunk_cache_path", &self.storage.chunk_cache_path),
            ("storage.index_path", &self.storage.index_path),
        ] {
            if p.as_os_str().is_empty() {
                return Err(AppError::new("CONFIG_INVALID", "Configured path is empty")
                    .with_details(format!("field={name}")));
            }
        }
        if self.storage.chunk_cache_path == self.storage.index_path {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "Chunk cache and index must be stored at different paths",
            )
            .with_details(format!("path={}", self.storage.index_path.display())));
        }
        Ok(())
    }

    /// Re-root every relative path under `base` (absolute paths are kept).
    pub fn rooted_at(mut self, base: &Path) -> Self {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.corpus.docs_dir);
        fix(&mut self.storage.chunk_cache_path);
        fix(&mut self.storage.index_path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = LawQaConfig::from_toml_str("").expect("parse");
        assert_eq!(cfg, LawQaConfig::default());
        assert_eq!(cfg.chunking.size, 400);
        assert_eq!(cfg.chunking.overlap, 50);
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.ollama.base_url, "http://127.0.0.1:11434");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = LawQaConfig::from_toml_str(
            r#"
[chunking]
size = 120

[ollama]
chat_model = "qwen2.5"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.chunking.size, 120);
        assert_eq!(cfg.chunking.overlap, 50);
        assert_eq!(cfg.ollama.chat_model, "qwen2.5");
        assert_eq!(cfg.ollama.embed_model, "bge-m3");
    }

    #[test]
    fn rejects_zero_size_and_zero_top_k() {
        let err = LawQaConfig::from_toml_str("[chunking]\nsize = 0\n").expect_err("size");
        assert_eq!(err.code, "CONFIG_INVALID");
        let err = LawQaConfig::from_toml_str("[retrieval]\ntop_k = 0\n").expect_err("top_k");
        assert_eq!(err.code, "CONFIG_INVALID");
    }

    #[test]
    fn rejects_shared_artifact_path() {
        let err = LawQaConfig::from_toml_str(
            "[storage]\nchunk_cache_path = \"x.json\"\nindex_path = \"x.json\"\n",
        )
        .expect_err("same path");
        assert_eq!(err.code, "CONFIG_INVALID");
    }

    #[test]
    fn malformed_toml_is_config_invalid() {
        let err = LawQaConfig::from_toml_str("[chunking\nsize = 1").expect_err("bad toml");
        assert_eq!(err.code, "CONFIG_INVALID");
    }

    #[test]
    fn rooted_at_only_touches_relative_paths() {
        let mut cfg = LawQaConfig::default();
        cfg.storage.index_path = PathBuf::from("/abs/index.json");
        let cfg = cfg.rooted_at(Path::new("/srv/lawqa"));
        assert_eq!(cfg.corpus.docs_dir, PathBuf::from("/srv/lawqa/data/docs"));
        assert_eq!(cfg.storage.index_path, PathBuf::from("/abs/index.json"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = LawQaConfig::load_or_default(&dir.path().join("nope.toml")).expect("defaults");
        assert_eq!(cfg, LawQaConfig::default());
    }
}
