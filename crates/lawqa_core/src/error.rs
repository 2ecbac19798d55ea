use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error shared by the core, retrieval and CLI layers.
///
/// `code` is a stable machine-readable identifier (`RAG_*`, `LLM_*`, `CONFIG_*`);
/// `message` is for humans; `details` carries paths, counts and upstream error text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code == code
    }

    /// One-line rendering including details, used by the CLI.
    pub fn describe(&self) -> String {
        match self.details.as_deref() {
            Some(d) if !d.is_empty() => format!("[{}] {} ({})", self.code, self.message, d),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
