use std::time::Duration;

use lawqa_core::error::AppError;

const LOCAL_HOSTS: [&str; 2] = ["127.0.0.1", "localhost"];

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    /// Create a client for a local Ollama server.
    ///
    /// Accepts `http://127.0.0.1[:port]` and `http://localhost[:port]` only; a trailing
    /// slash is trimmed, any other path is rejected.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let reject = || {
            AppError::new(
                "RAG_REMOTE_NOT_ALLOWED",
                "Ollama base URL must be http://127.0.0.1 or http://localhost",
            )
            .with_details(format!("base_url={base_url}"))
        };

        let authority = base_url.strip_prefix("http://").ok_or_else(reject)?;
        let (host, port) = match authority.split_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (authority, None),
        };
        if !LOCAL_HOSTS.contains(&host) {
            return Err(reject());
        }
        if let Some(p) = port {
            let valid = !p.is_empty()
                && p.bytes().all(|b| b.is_ascii_digit())
                && matches!(p.parse::<u16>(), Ok(n) if n > 0);
            if !valid {
                return Err(reject());
            }
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = self.endpoint("api/tags");
        match ureq::get(&url).timeout(Duration::from_millis(800)).call() {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => Err(AppError::new(
                "RAG_UPSTREAM_UNAVAILABLE",
                "Ollama health check failed",
            )
            .with_details(format!("status={code}"))),
            Err(e) => Err(upstream_unreachable(&url, e)),
        }
    }
}

/// Transport-level failure talking to Ollama; always retryable.
pub(crate) fn upstream_unreachable(url: &str, err: ureq::Error) -> AppError {
    AppError::new(
        "RAG_UPSTREAM_UNAVAILABLE",
        "Cannot reach Ollama; make sure `ollama serve` is running",
    )
    .with_details(format!("url={url}; err={err}"))
    .with_retryable(true)
}
