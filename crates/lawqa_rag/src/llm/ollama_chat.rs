use std::time::Duration;

use lawqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Llm;
use crate::ollama::{upstream_unreachable, OllamaClient};

#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: OllamaClient,
    model: String,
}

impl OllamaChat {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatReply {
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

impl Llm for OllamaChat {
    fn chat(&self, system_prompt: &str, user_message: &str) -> Result<String, AppError> {
        let url = self.client.endpoint("api/chat");
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            stream: false,
        };

        let resp = match ureq::post(&url)
            .timeout(Duration::from_secs(120))
            .send_json(req)
        {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                let body = r.into_string().unwrap_or_default();
                return Err(AppError::new("LLM_CHAT_FAILED", "Chat request failed")
                    .with_details(format!("status={code}; model={}; body={body}", self.model)));
            }
            Err(e) => return Err(upstream_unreachable(&url, e)),
        };

        let v: ChatResponse = resp.into_json().map_err(|e| {
            AppError::new("LLM_CHAT_FAILED", "Failed to decode chat response")
                .with_details(e.to_string())
        })?;
        if v.message.content.trim().is_empty() {
            return Err(AppError::new("LLM_CHAT_FAILED", "Chat response was empty"));
        }
        Ok(v.message.content)
    }
}
