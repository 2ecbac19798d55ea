use std::cell::RefCell;
use std::fs;

use lawqa_core::config::LawQaConfig;
use lawqa_core::error::AppError;
use lawqa_rag::answer::{answer_question, SYSTEM_PROMPT};
use lawqa_rag::embeddings::Embedder;
use lawqa_rag::llm::Llm;
use lawqa_rag::store::RetrievalStore;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

/// Two-dimensional embedding: occurrences of "cồn" and of "mũ".
struct TwoWordEmbedder;

impl Embedder for TwoWordEmbedder {
    fn model(&self) -> &str {
        "mock-two"
    }

    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        Ok(inputs
            .iter()
            .map(|t| vec![t.matches("cồn").count() as f32, t.matches("mũ").count() as f32])
            .collect())
    }
}

struct RecordingLlm {
    reply: Result<String, AppError>,
    seen: RefCell<Vec<(String, String)>>,
}

impl RecordingLlm {
    fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn failing(err: AppError) -> Self {
        Self {
            reply: Err(err),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Llm for RecordingLlm {
    fn chat(&self, system_prompt: &str, user_message: &str) -> Result<String, AppError> {
        self.seen
            .borrow_mut()
            .push((system_prompt.to_string(), user_message.to_string()));
        self.reply.clone()
    }
}

fn store_with(docs: &[(&str, &str)]) -> (tempfile::TempDir, RetrievalStore) {
    let dir = tempdir().expect("tempdir");
    let cfg = LawQaConfig::default().rooted_at(dir.path());
    fs::create_dir_all(&cfg.corpus.docs_dir).expect("docs dir");
    for (name, text) in docs {
        fs::write(cfg.corpus.docs_dir.join(name), text).expect("write doc");
    }
    let store = RetrievalStore::open(&cfg, Box::new(TwoWordEmbedder)).expect("open");
    (dir, store)
}

#[test]
fn passes_joined_context_and_question_to_the_model() {
    let (_dir, store) = store_with(&[(
        "nd168.txt",
        "Điều 1. Phạt tiền khi có nồng độ cồn.\nĐiều 2. Phạt tiền khi không đội mũ.\nĐiều 3. Quy định chung.",
    )]);
    let llm = RecordingLlm::replying("Theo Điều 1 Nghị định 168, mức phạt là ...");

    let answer = answer_question(&store, &llm, "  Uống rượu có cồn bị phạt bao nhiêu?  ", 2).expect("answer");
    assert_eq!(answer.text, "Theo Điều 1 Nghị định 168, mức phạt là ...");
    assert_eq!(
        answer.context,
        vec![
            "Điều 1. Phạt tiền khi có nồng độ cồn.".to_string(),
            "Điều 3. Quy định chung.".to_string(),
        ]
    );

    let seen = llm.seen.borrow();
    assert_eq!(seen.len(), 1);
    let (system, user) = &seen[0];
    assert_eq!(system, SYSTEM_PROMPT);
    assert!(user.contains("Điều 1. Phạt tiền khi có nồng độ cồn.\n\nĐiều 3. Quy định chung."));
    assert!(!user.contains("đội mũ"));
    assert!(user.trim_end().ends_with("Uống rượu có cồn bị phạt bao nhiêu?"));
}

#[test]
fn empty_corpus_still_asks_the_model() {
    let (_dir, store) = store_with(&[]);
    let llm = RecordingLlm::replying("Nghị định 168 không quy định cụ thể trường hợp này.");
    let answer = answer_question(&store, &llm, "Câu hỏi bất kỳ", 3).expect("answer");
    assert!(answer.context.is_empty());
    assert_eq!(llm.seen.borrow().len(), 1);
}

#[test]
fn unreachable_model_is_a_retryable_error() {
    let (_dir, store) = store_with(&[("a.txt", "Điều 1. Nội dung về cồn.")]);
    let llm = RecordingLlm::failing(
        AppError::new("RAG_UPSTREAM_UNAVAILABLE", "Cannot reach Ollama").with_retryable(true),
    );
    let err = answer_question(&store, &llm, "cồn", 3).expect_err("should fail");
    assert_eq!(err.code, "RAG_UPSTREAM_UNAVAILABLE");
    assert!(err.retryable);
}

#[test]
fn other_model_failures_are_wrapped_with_details() {
    let (_dir, store) = store_with(&[("a.txt", "Điều 1. Nội dung về cồn.")]);
    let llm = RecordingLlm::failing(
        AppError::new("LLM_CHAT_FAILED", "Chat request failed").with_details("status=500"),
    );
    let err = answer_question(&store, &llm, "cồn", 3).expect_err("should fail");
    assert_eq!(err.code, "LLM_CHAT_FAILED");
    assert!(err.details.as_deref().unwrap_or_default().contains("status=500"));
}

#[test]
fn blank_model_reply_is_rejected() {
    let (_dir, store) = store_with(&[("a.txt", "Điều 1. Nội dung về cồn.")]);
    let llm = RecordingLlm::replying("   \n");
    let err = answer_question(&store, &llm, "cồn", 3).expect_err("blank");
    assert_eq!(err.code, "LLM_CHAT_FAILED");
}
