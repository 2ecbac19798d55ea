use std::panic;
use std::path::Path;

use crate::error::AppError;
use crate::normalize::text::normalize_newlines;

use super::{has_extension, read_bytes, DocumentReader};

/// Text layer of `.pdf` files. Scanned PDFs without a text layer yield no text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

impl DocumentReader for PdfReader {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    fn read(&self, path: &Path) -> Result<String, AppError> {
        let bytes = read_bytes(path)?;
        // pdf-extract panics on some malformed files instead of returning an error.
        let extracted = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes)).map_err(|_| {
            AppError::new("RAG_DOCS_READ_FAILED", "PDF text extraction aborted")
                .with_details(format!("path={}", path.display()))
        })?;
        let text = extracted.map_err(|e| {
            AppError::new("RAG_DOCS_READ_FAILED", "Failed to extract PDF text")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Ok(normalize_newlines(&text).replace('\u{c}', "\n"))
    }
}
