use std::time::Duration;

use lawqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::{upstream_unreachable, OllamaClient};

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.client.endpoint("api/embed");
        let req = EmbedRequest {
            model: &self.model,
            input: inputs,
        };
        let resp = ureq::post(&url)
            .timeout(Duration::from_secs(60))
            .send_json(req);

        let resp = match resp {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                let body = r.into_string().unwrap_or_default();
                return Err(AppError::new("RAG_EMBEDDINGS_FAILED", "Embeddings request failed")
                    .with_details(format!("status={code}; model={}; body={body}", self.model)));
            }
            Err(e) => return Err(upstream_unreachable(&url, e)),
        };

        let v: EmbedResponse = resp.into_json().map_err(|e| {
            AppError::new("RAG_EMBEDDINGS_FAILED", "Failed to decode embeddings response")
                .with_details(e.to_string())
        })?;
        if v.embeddings.len() != inputs.len() {
            return Err(AppError::new(
                "RAG_EMBEDDINGS_FAILED",
                "Embeddings response count does not match inputs",
            )
            .with_details(format!("inputs={}; vectors={}", inputs.len(), v.embeddings.len())));
        }
        if v.embeddings.iter().any(|e| e.is_empty()) {
            return Err(AppError::new(
                "RAG_EMBEDDINGS_FAILED",
                "Embeddings response contained an empty vector",
            ));
        }
        Ok(v.embeddings)
    }
}
