//! Corpus loading: list a documents directory and turn each supported file into raw text.
//!
//! Format readers are pluggable through [`DocumentReader`]; files no reader claims are
//! skipped silently, files a reader fails on are skipped and counted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub mod docx;
pub mod pdf;
pub mod text;

pub use docx::DocxReader;
pub use pdf::PdfReader;
pub use text::PlainTextReader;

/// Produces raw text from one source file.
pub trait DocumentReader {
    fn supports(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> Result<String, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub error: AppError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedDocument>,
}

/// Readers for every format this build can handle.
pub fn default_readers() -> Vec<Box<dyn DocumentReader>> {
    vec![Box::new(PlainTextReader), Box::new(PdfReader), Box::new(DocxReader)]
}

/// Read every supported file directly under `dir`, in file-name order.
///
/// A missing directory is an empty corpus, not an error.
pub fn load_corpus(dir: &Path, readers: &[Box<dyn DocumentReader>]) -> Result<LoadedCorpus, AppError> {
    if !dir.exists() {
        tracing::warn!(dir = %dir.display(), "documents directory does not exist; corpus is empty");
        return Ok(LoadedCorpus::default());
    }

    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::new("RAG_DOCS_LIST_FAILED", "Failed to list documents directory")
            .with_details(format!("path={}; err={}", dir.display(), e))
    })?;

    let (paths, unlisted) = partition_entries(dir, entries.map(|ent| ent.map(|e| e.path())));
    let mut corpus = LoadedCorpus {
        documents: Vec::new(),
        skipped: unlisted,
    };
    for path in paths {
        let Some(reader) = readers.iter().find(|r| r.supports(&path)) else {
            tracing::debug!(path = %path.display(), "unsupported document format; skipping");
            continue;
        };
        match reader.read(&path) {
            Ok(text) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                corpus.documents.push(Document { name, text });
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to read document; skipping");
                corpus.skipped.push(SkippedDocument { path, error });
            }
        }
    }

    tracing::info!(
        documents = corpus.documents.len(),
        skipped = corpus.skipped.len(),
        "corpus loaded"
    );
    Ok(corpus)
}

/// Sorted regular files among `entries`; entries that could not be read are
/// reported as skipped against `dir`.
fn partition_entries(
    dir: &Path,
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
) -> (Vec<PathBuf>, Vec<SkippedDocument>) {
    let mut paths = Vec::new();
    let mut skipped = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(dir = %dir.display(), err = %e, "unreadable directory entry; skipping");
                skipped.push(SkippedDocument {
                    path: dir.to_path_buf(),
                    error: AppError::new("RAG_DOCS_READ_FAILED", "Failed to read directory entry")
                        .with_details(format!("path={}; err={}", dir.display(), e)),
                });
            }
        }
    }
    paths.sort();
    (paths, skipped)
}

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, AppError> {
    fs::read(path).map_err(|e| {
        AppError::new("RAG_DOCS_READ_FAILED", "Failed to read document")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| allowed.iter().any(|a| ext.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn entry_errors_are_counted_as_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let b = dir.path().join("b.txt");
        let a = dir.path().join("a.txt");
        fs::write(&a, "a").expect("write a");
        fs::write(&b, "b").expect("write b");

        let entries = vec![
            Ok(b.clone()),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            Ok(a.clone()),
            Ok(dir.path().join("absent.txt")),
        ];
        let (paths, skipped) = partition_entries(dir.path(), entries);
        assert_eq!(paths, vec![a, b]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path, dir.path().to_path_buf());
        assert_eq!(skipped[0].error.code, "RAG_DOCS_READ_FAILED");
        assert!(skipped[0].error.details.as_deref().unwrap_or_default().contains("denied"));
    }
}
