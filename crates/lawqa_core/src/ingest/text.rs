use std::path::Path;

use crate::error::AppError;
use crate::normalize::text::normalize_newlines;

use super::{has_extension, read_bytes, DocumentReader};

/// UTF-8 `.txt` and `.md` files, read verbatim (newlines normalized).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["txt", "md"])
    }

    fn read(&self, path: &Path) -> Result<String, AppError> {
        let bytes = read_bytes(path)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            AppError::new("RAG_DOCS_READ_FAILED", "Document is not valid UTF-8")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Ok(normalize_newlines(text.trim_start_matches('\u{feff}')))
    }
}
