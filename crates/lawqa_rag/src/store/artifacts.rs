//! On-disk chunk cache and index blob, published as an aligned pair.
//!
//! Both files are staged under `<name>.tmp` and renamed into place, chunk cache first and
//! index last. The cache records a digest of the exact index bytes it was built with,
//! so a pair left half-replaced by an interrupted build is detected on the next load.

use std::fs;
use std::path::{Path, PathBuf};

use lawqa_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::index::FlatIndex;

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub chunk_cache: PathBuf,
    pub index: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkCache {
    pub version: u32,
    /// Digest of the ordered chunk texts.
    pub build_id: String,
    /// Digest of the index blob published alongside this cache.
    pub index_sha256: String,
    pub embed_model: String,
    pub dims: usize,
    pub built_at: String,
    pub chunks: Vec<String>,
}

impl ChunkCache {
    pub fn new(
        chunks: Vec<String>,
        index_bytes: &[u8],
        embed_model: &str,
        dims: usize,
        built_at: String,
    ) -> Self {
        Self {
            version: CACHE_VERSION,
            build_id: build_id(&chunks),
            index_sha256: sha256_hex(index_bytes),
            embed_model: embed_model.to_string(),
            dims,
            built_at,
            chunks,
        }
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { cache: ChunkCache, index: FlatIndex },
    Missing { path: PathBuf },
    Misaligned { reason: String },
}

/// Digest over the ordered chunk texts; each text is length-prefixed so boundaries count.
pub fn build_id(chunks: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((chunks.len() as u64).to_le_bytes());
    for c in chunks {
        hasher.update((c.len() as u64).to_le_bytes());
        hasher.update(c.as_bytes());
    }
    hex::encode(hasher.finalize())
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new("RAG_ARTIFACT_WRITE_FAILED", "Failed to create artifact directory")
                .with_details(format!("path={}; err={}", parent.display(), e))
        })?;
    }
    Ok(())
}

fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf, AppError> {
    ensure_parent(path)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| {
        AppError::new("RAG_ARTIFACT_WRITE_FAILED", "Failed to write artifact")
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    Ok(tmp)
}

fn commit(tmp: &Path, path: &Path) -> Result<(), AppError> {
    fs::rename(tmp, path).map_err(|e| {
        AppError::new("RAG_ARTIFACT_WRITE_FAILED", "Failed to finalize artifact write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}

/// Write `bytes` to `path` through a temporary sibling and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let tmp = stage(path, bytes)?;
    commit(&tmp, path)
}

/// Stage both artifacts, then publish the chunk cache followed by the index.
pub fn publish(paths: &ArtifactPaths, cache: &ChunkCache, index_bytes: &[u8]) -> Result<(), AppError> {
    let cache_bytes = serde_json::to_vec_pretty(cache).map_err(|e| {
        AppError::new("RAG_ARTIFACT_WRITE_FAILED", "Failed to encode chunk cache")
            .with_details(e.to_string())
    })?;

    let cache_tmp = stage(&paths.chunk_cache, &cache_bytes)?;
    let index_tmp = match stage(&paths.index, index_bytes) {
        Ok(tmp) => tmp,
        Err(e) => {
            let _ = fs::remove_file(&cache_tmp);
            return Err(e);
        }
    };

    commit(&cache_tmp, &paths.chunk_cache)?;
    commit(&index_tmp, &paths.index)
}

/// Just enough of the chunk cache to tell which schema wrote it.
#[derive(Deserialize)]
struct CacheHeader {
    version: u32,
}

fn read_file(path: &Path, what: &str) -> Result<Vec<u8>, AppError> {
    fs::read(path).map_err(|e| {
        AppError::new("RAG_ARTIFACT_READ_FAILED", format!("Failed to read {what}"))
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

/// Load and cross-check the pair. IO failures are errors; a missing file, a file that
/// does not decode (truncated write, other schema) or a pair that does not belong
/// together is reported as an outcome.
pub fn load(paths: &ArtifactPaths) -> Result<LoadOutcome, AppError> {
    for p in [&paths.chunk_cache, &paths.index] {
        if !p.exists() {
            return Ok(LoadOutcome::Missing { path: p.clone() });
        }
    }

    let cache_bytes = read_file(&paths.chunk_cache, "chunk cache")?;
    let index_bytes = read_file(&paths.index, "vector index")?;

    let header: CacheHeader = match serde_json::from_slice(&cache_bytes) {
        Ok(h) => h,
        Err(e) => {
            return Ok(LoadOutcome::Misaligned {
                reason: format!("chunk cache is unreadable: {e}"),
            })
        }
    };
    if header.version != CACHE_VERSION {
        return Ok(LoadOutcome::Misaligned {
            reason: format!("unsupported chunk cache version {}", header.version),
        });
    }
    let cache: ChunkCache = match serde_json::from_slice(&cache_bytes) {
        Ok(c) => c,
        Err(e) => {
            return Ok(LoadOutcome::Misaligned {
                reason: format!("chunk cache is unreadable: {e}"),
            })
        }
    };

    if build_id(&cache.chunks) != cache.build_id {
        return Ok(LoadOutcome::Misaligned {
            reason: "chunk cache contents do not match its build id".to_string(),
        });
    }
    let index_sha256 = sha256_hex(&index_bytes);
    if index_sha256 != cache.index_sha256 {
        return Ok(LoadOutcome::Misaligned {
            reason: format!(
                "index digest {} does not match chunk cache record {}",
                &index_sha256[..12],
                cache.index_sha256.get(..12).unwrap_or(&cache.index_sha256)
            ),
        });
    }

    let index = match FlatIndex::from_bytes(&index_bytes) {
        Ok(index) => index,
        Err(e) => {
            return Ok(LoadOutcome::Misaligned {
                reason: format!("vector index is unreadable: {}", e.describe()),
            })
        }
    };
    if index.len() != cache.chunks.len() {
        return Ok(LoadOutcome::Misaligned {
            reason: format!(
                "index holds {} vectors for {} chunks",
                index.len(),
                cache.chunks.len()
            ),
        });
    }

    Ok(LoadOutcome::Loaded { cache, index })
}
