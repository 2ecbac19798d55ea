use std::path::PathBuf;

use lawqa_core::config::LawQaConfig;
use lawqa_core::error::AppError;
use lawqa_core::ingest::{default_readers, load_corpus, DocumentReader};
use lawqa_core::normalize::text::snippet;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::chunking::Chunker;
use crate::embeddings::Embedder;
use crate::index::FlatIndex;

pub mod artifacts;

use artifacts::{ArtifactPaths, ChunkCache, LoadOutcome};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildReport {
    pub documents: usize,
    pub skipped_documents: usize,
    pub chunk_count: usize,
    pub dims: usize,
    pub build_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreStatus {
    pub chunk_count: usize,
    pub dims: usize,
    pub build_id: String,
    pub embed_model: String,
    pub built_at: String,
    pub chunk_cache_path: String,
    pub index_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Position in the chunk cache (equal to the index entry id).
    pub position: usize,
    pub distance: f32,
    pub text: String,
}

/// What a query runs against: the chunk texts and the index, aligned by position.
#[derive(Debug)]
struct KnowledgeBase {
    chunks: Vec<String>,
    index: FlatIndex,
    build_id: String,
    embed_model: String,
    built_at: String,
}

/// Chunk cache plus vector index over one documents directory.
///
/// Construct once with [`RetrievalStore::open`] and share by reference. `build` takes
/// `&mut self`, so a rebuild can never interleave with a query on the same value.
pub struct RetrievalStore {
    docs_dir: PathBuf,
    paths: ArtifactPaths,
    chunker: Chunker,
    embedder: Box<dyn Embedder>,
    readers: Vec<Box<dyn DocumentReader>>,
    batch_size: usize,
    kb: KnowledgeBase,
}

impl RetrievalStore {
    pub fn open(config: &LawQaConfig, embedder: Box<dyn Embedder>) -> Result<Self, AppError> {
        Self::open_with_readers(config, embedder, default_readers())
    }

    /// Load both persisted artifacts, or build them when either is missing or the
    /// pair is inconsistent.
    pub fn open_with_readers(
        config: &LawQaConfig,
        embedder: Box<dyn Embedder>,
        readers: Vec<Box<dyn DocumentReader>>,
    ) -> Result<Self, AppError> {
        let mut store = Self::unloaded(config, embedder, readers)?;

        match artifacts::load(&store.paths)? {
            LoadOutcome::Loaded { cache, .. } if cache.embed_model != store.embedder.model() => {
                tracing::warn!(
                    cached = %cache.embed_model,
                    configured = %store.embedder.model(),
                    "knowledge base was built with a different embedding model; rebuilding"
                );
                store.build()?;
            }
            LoadOutcome::Loaded { cache, index } => {
                tracing::info!(
                    chunks = cache.chunks.len(),
                    dims = index.dims(),
                    build_id = %cache.build_id,
                    "knowledge base loaded"
                );
                store.kb = KnowledgeBase {
                    chunks: cache.chunks,
                    index,
                    build_id: cache.build_id,
                    embed_model: cache.embed_model,
                    built_at: cache.built_at,
                };
            }
            LoadOutcome::Missing { path } => {
                tracing::warn!(path = %path.display(), "knowledge base artifact missing; building");
                store.build()?;
            }
            LoadOutcome::Misaligned { reason } => {
                tracing::warn!(%reason, "knowledge base artifacts are out of sync; rebuilding");
                store.build()?;
            }
        }

        Ok(store)
    }

    /// Build fresh artifacts without looking at the persisted ones, so the corpus is
    /// embedded exactly once.
    pub fn rebuild(config: &LawQaConfig, embedder: Box<dyn Embedder>) -> Result<(Self, BuildReport), AppError> {
        Self::rebuild_with_readers(config, embedder, default_readers())
    }

    pub fn rebuild_with_readers(
        config: &LawQaConfig,
        embedder: Box<dyn Embedder>,
        readers: Vec<Box<dyn DocumentReader>>,
    ) -> Result<(Self, BuildReport), AppError> {
        let mut store = Self::unloaded(config, embedder, readers)?;
        let report = store.build()?;
        Ok((store, report))
    }

    fn unloaded(
        config: &LawQaConfig,
        embedder: Box<dyn Embedder>,
        readers: Vec<Box<dyn DocumentReader>>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let chunker = Chunker::new(&config.chunking)?;
        Ok(Self {
            docs_dir: config.corpus.docs_dir.clone(),
            paths: ArtifactPaths {
                chunk_cache: config.storage.chunk_cache_path.clone(),
                index: config.storage.index_path.clone(),
            },
            chunker,
            embedder,
            readers,
            batch_size: config.ollama.embed_batch_size,
            kb: KnowledgeBase {
                chunks: Vec::new(),
                index: FlatIndex::new(0),
                build_id: String::new(),
                embed_model: String::new(),
                built_at: String::new(),
            },
        })
    }

    /// Rebuild chunk cache and index from the documents directory, replacing both the
    /// persisted artifacts and the in-memory state. Nothing is replaced on failure.
    pub fn build(&mut self) -> Result<BuildReport, AppError> {
        let corpus = load_corpus(&self.docs_dir, &self.readers)?;

        let mut chunks: Vec<String> = Vec::new();
        for doc in corpus.documents.iter() {
            let produced = self.chunker.chunk_texts(&doc.text);
            tracing::debug!(document = %doc.name, chunks = produced.len(), "document chunked");
            chunks.extend(produced);
        }

        let vectors = self.embed_all(&chunks)?;
        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        let mut index = FlatIndex::new(dims);
        index.add(&vectors).map_err(|e| {
            AppError::new(
                "RAG_DIMENSION_MISMATCH",
                "Embedding dimension mismatch across chunks",
            )
            .with_details(e.details.unwrap_or_default())
        })?;

        let index_bytes = index.to_bytes()?;
        let built_at = now_rfc3339_utc()?;
        let cache = ChunkCache::new(chunks, &index_bytes, self.embedder.model(), dims, built_at);
        artifacts::publish(&self.paths, &cache, &index_bytes)?;

        let report = BuildReport {
            documents: corpus.documents.len(),
            skipped_documents: corpus.skipped.len(),
            chunk_count: cache.chunks.len(),
            dims,
            build_id: cache.build_id.clone(),
        };
        tracing::info!(
            documents = report.documents,
            skipped = report.skipped_documents,
            chunks = report.chunk_count,
            dims = report.dims,
            "knowledge base built"
        );

        self.kb = KnowledgeBase {
            chunks: cache.chunks,
            index,
            build_id: cache.build_id,
            embed_model: cache.embed_model,
            built_at: cache.built_at,
        };
        Ok(report)
    }

    fn embed_all(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let mut out = Vec::with_capacity(chunks.len());
        for (n, batch) in chunks.chunks(self.batch_size).enumerate() {
            let vectors = self.embedder.embed(batch)?;
            if vectors.len() != batch.len() {
                return Err(AppError::new(
                    "RAG_EMBEDDINGS_FAILED",
                    "Embedder returned a different number of vectors than inputs",
                )
                .with_details(format!("batch={n}; inputs={}; vectors={}", batch.len(), vectors.len())));
            }
            out.extend(vectors);
        }
        Ok(out)
    }

    /// Chunk texts nearest to `query`, nearest first. At most `k`; none when the
    /// knowledge base is empty.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<String>, AppError> {
        Ok(self
            .search_hits(query, k)?
            .into_iter()
            .map(|h| h.text)
            .collect())
    }

    pub fn search_hits(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new("RAG_QUERY_INVALID", "Query must not be empty"));
        }
        if self.kb.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut vectors = self.embedder.embed(&[q.to_string()])?;
        let qv = match vectors.pop() {
            Some(v) if vectors.is_empty() => v,
            _ => {
                return Err(AppError::new(
                    "RAG_EMBEDDINGS_FAILED",
                    "Embedder must return exactly one vector for a query",
                ))
            }
        };

        let neighbors = self.kb.index.search(&qv, k)?;
        let mut out = Vec::with_capacity(neighbors.len());
        for n in neighbors {
            let text = self.kb.chunks.get(n.id).ok_or_else(|| {
                AppError::new(
                    "RAG_ARTIFACT_MISALIGNED",
                    "Index entry has no corresponding chunk",
                )
                .with_details(format!("id={}; chunks={}", n.id, self.kb.chunks.len()))
            })?;
            out.push(RetrievedChunk {
                position: n.id,
                distance: n.distance,
                text: text.clone(),
            });
        }
        tracing::debug!(
            k,
            hits = out.len(),
            nearest = %out.first().map(|h| snippet(&h.text, 80)).unwrap_or_default(),
            "search completed"
        );
        Ok(out)
    }

    pub fn chunks(&self) -> &[String] {
        &self.kb.chunks
    }

    pub fn len(&self) -> usize {
        self.kb.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kb.chunks.is_empty()
    }

    pub fn status(&self) -> StoreStatus {
        StoreStatus {
            chunk_count: self.kb.chunks.len(),
            dims: self.kb.index.dims(),
            build_id: self.kb.build_id.clone(),
            embed_model: self.kb.embed_model.clone(),
            built_at: self.kb.built_at.clone(),
            chunk_cache_path: self.paths.chunk_cache.display().to_string(),
            index_path: self.paths.index.display().to_string(),
        }
    }
}

fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
        AppError::new("RAG_ARTIFACT_WRITE_FAILED", "Failed to format build time")
            .with_details(e.to_string())
    })
}
