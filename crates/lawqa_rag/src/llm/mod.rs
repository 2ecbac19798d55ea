use lawqa_core::error::AppError;

/// One stateless chat turn: a system prompt and a user message in, the reply out.
pub trait Llm {
    fn chat(&self, system_prompt: &str, user_message: &str) -> Result<String, AppError>;
}

pub mod ollama_chat;

pub use ollama_chat::OllamaChat;
