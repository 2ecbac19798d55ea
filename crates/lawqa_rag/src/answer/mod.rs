use lawqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::llm::Llm;
use crate::store::RetrievalStore;

mod prompts;

pub use prompts::{user_prompt, SYSTEM_PROMPT};

/// Separator between retrieved chunks in the context handed to the model.
pub const CONTEXT_JOINER: &str = "\n\n";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// Retrieved chunks, nearest first, exactly as sent to the model.
    pub context: Vec<String>,
}

/// Retrieve the `k` chunks closest to `question` and ask the model to answer from them.
///
/// Upstream failures (embedder or model unreachable) come back as retryable errors.
pub fn answer_question(
    store: &RetrievalStore,
    llm: &dyn Llm,
    question: &str,
    k: usize,
) -> Result<Answer, AppError> {
    let context = store.search(question, k)?;
    if context.is_empty() {
        tracing::warn!("no context retrieved; asking the model without grounding passages");
    }
    let joined = context.join(CONTEXT_JOINER);
    tracing::debug!(chunks = context.len(), context_chars = joined.chars().count(), "context assembled");

    let prompt = user_prompt(&joined, question.trim());
    let text = llm.chat(SYSTEM_PROMPT, &prompt).map_err(|e| {
        if e.has_code("RAG_UPSTREAM_UNAVAILABLE") {
            e
        } else {
            let retryable = e.retryable;
            AppError::new("LLM_CHAT_FAILED", "The language model did not return an answer")
                .with_details(e.describe())
                .with_retryable(retryable)
        }
    })?;
    if text.trim().is_empty() {
        return Err(AppError::new("LLM_CHAT_FAILED", "Chat response was empty"));
    }

    Ok(Answer { text, context })
}
