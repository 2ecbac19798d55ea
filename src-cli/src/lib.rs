use std::path::Path;

use lawqa_core::config::LawQaConfig;
use lawqa_core::error::AppError;
use lawqa_rag::answer::answer_question;
use lawqa_rag::embeddings::{Embedder, OllamaEmbedder};
use lawqa_rag::llm::{Llm, OllamaChat};
use lawqa_rag::ollama::OllamaClient;
use lawqa_rag::store::{BuildReport, RetrievalStore, StoreStatus};

#[derive(Debug, serde::Serialize)]
pub struct SearchHit {
    pub position: usize,
    pub distance: f32,
    pub text: String,
}

#[derive(Debug, serde::Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, serde::Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct AiHealthStatus {
    pub ok: bool,
    pub message: String,
}

/// Read the config file (defaults when absent). Relative paths inside it resolve
/// against the file's directory.
pub fn load_config(path: &Path) -> Result<LawQaConfig, AppError> {
    let cfg = LawQaConfig::load_or_default(path)?;
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(base) if path.exists() => Ok(cfg.rooted_at(base)),
        _ => Ok(cfg),
    }
}

pub fn ai_health_check(config: &LawQaConfig) -> Result<AiHealthStatus, AppError> {
    let client = OllamaClient::new(&config.ollama.base_url)?;
    client.health_check()?;
    Ok(AiHealthStatus {
        ok: true,
        message: format!("Ollama reachable at {}", client.base_url()),
    })
}

/// The retrieval store and chat model for one invocation.
pub struct App {
    config: LawQaConfig,
    store: RetrievalStore,
    llm: Box<dyn Llm>,
}

fn ollama_parts(config: &LawQaConfig) -> Result<(Box<dyn Embedder>, Box<dyn Llm>), AppError> {
    let client = OllamaClient::new(&config.ollama.base_url)?;
    let embedder: Box<dyn Embedder> = Box::new(OllamaEmbedder::new(
        client.clone(),
        config.ollama.embed_model.clone(),
    ));
    let llm: Box<dyn Llm> = Box::new(OllamaChat::new(client, config.ollama.chat_model.clone()));
    Ok((embedder, llm))
}

impl App {
    pub fn open(config: LawQaConfig) -> Result<Self, AppError> {
        let (embedder, llm) = ollama_parts(&config)?;
        Self::with_parts(config, embedder, llm)
    }

    /// Open for `lawqa build`: skips loading (and any automatic build) so the
    /// corpus is embedded once.
    pub fn rebuild(config: LawQaConfig) -> Result<(Self, BuildReport), AppError> {
        let (embedder, llm) = ollama_parts(&config)?;
        Self::rebuild_with_parts(config, embedder, llm)
    }

    pub fn with_parts(
        config: LawQaConfig,
        embedder: Box<dyn Embedder>,
        llm: Box<dyn Llm>,
    ) -> Result<Self, AppError> {
        let store = RetrievalStore::open(&config, embedder)?;
        Ok(Self { config, store, llm })
    }

    pub fn rebuild_with_parts(
        config: LawQaConfig,
        embedder: Box<dyn Embedder>,
        llm: Box<dyn Llm>,
    ) -> Result<(Self, BuildReport), AppError> {
        let (store, report) = RetrievalStore::rebuild(&config, embedder)?;
        Ok((Self { config, store, llm }, report))
    }

    fn top_k(&self, top_k: Option<usize>) -> usize {
        top_k.unwrap_or(self.config.retrieval.top_k)
    }

    pub fn search(&self, query: &str, top_k: Option<usize>) -> Result<SearchResponse, AppError> {
        let hits = self
            .store
            .search_hits(query, self.top_k(top_k))?
            .into_iter()
            .map(|h| SearchHit {
                position: h.position,
                distance: h.distance,
                text: h.text,
            })
            .collect();
        Ok(SearchResponse {
            query: query.trim().to_string(),
            hits,
        })
    }

    pub fn ask(&self, question: &str, top_k: Option<usize>) -> Result<AskResponse, AppError> {
        let answer = answer_question(&self.store, self.llm.as_ref(), question, self.top_k(top_k))?;
        Ok(AskResponse {
            answer: answer.text,
            sources: answer.context,
        })
    }

    pub fn status(&self) -> StoreStatus {
        self.store.status()
    }
}
