//! Structural-then-size-bounded chunking of legal text.
//!
//! A document is first cut into sections at every line that opens an Article
//! (`Điều N.` by default). Sections that fit in `size` words are kept whole; longer
//! ones are packed line by line, and single lines longer than `size` are cut into
//! overlapping word windows. Any piece that lost sight of its Article header gets the
//! header prepended so it can be read on its own.

use lawqa_core::config::{ChunkingConfig, DEFAULT_MARKER_PATTERN};
use lawqa_core::error::AppError;
use lawqa_core::normalize::text::{normalize_newlines, word_count};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

mod packer;
mod sections;

pub use packer::{classify_line, PackStep};

/// Separator placed between a prepended header and the chunk body.
pub const CONTEXT_SEPARATOR: &str = "\n...\n";
/// Marks a header prepended to a window cut from an oversized line.
pub const CONTINUATION_MARK: &str = " (tiếp)";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// A whole section that fit within the size cap.
    Section,
    /// Consecutive lines of an oversized section.
    Packed,
    /// A sliding-window slice of a single oversized line.
    Window,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Section header prepended to `text` for context, if any.
    pub header: Option<String>,
    pub kind: ChunkKind,
}

impl Chunk {
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }

    /// Words of the body alone, excluding any prepended header.
    pub fn body_word_count(&self) -> usize {
        match self.header.as_deref() {
            Some(h) => {
                let overhead = word_count(h) + word_count(CONTEXT_SEPARATOR);
                let overhead = match self.kind {
                    ChunkKind::Window => overhead + word_count(CONTINUATION_MARK),
                    _ => overhead,
                };
                self.word_count().saturating_sub(overhead)
            }
            None => self.word_count(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    size: usize,
    overlap: usize,
    marker: Regex,
}

impl Chunker {
    pub fn new(cfg: &ChunkingConfig) -> Result<Self, AppError> {
        Self::with_pattern(cfg.size, cfg.overlap, &cfg.marker_pattern)
    }

    pub fn with_size(size: usize, overlap: usize) -> Result<Self, AppError> {
        Self::with_pattern(size, overlap, DEFAULT_MARKER_PATTERN)
    }

    pub fn with_pattern(size: usize, overlap: usize, pattern: &str) -> Result<Self, AppError> {
        if size == 0 {
            return Err(AppError::new(
                "RAG_CHUNKER_CONFIG_INVALID",
                "Chunk size must be at least one word",
            ));
        }
        let marker = RegexBuilder::new(pattern)
            .multi_line(true)
            .build()
            .map_err(|e| {
                AppError::new("RAG_CHUNKER_CONFIG_INVALID", "Invalid section marker pattern")
                    .with_details(format!("pattern={pattern}; err={e}"))
            })?;
        Ok(Self {
            size,
            overlap,
            marker,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Advance between sliding windows; never zero.
    pub fn step(&self) -> usize {
        self.size.saturating_sub(self.overlap).max(1)
    }

    /// Chunk one document. Output order follows the document.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let normalized = normalize_newlines(text);
        let mut out = Vec::new();
        for section in sections::split_sections(&normalized, &self.marker) {
            if word_count(section) <= self.size {
                out.push(Chunk {
                    text: section.to_string(),
                    header: None,
                    kind: ChunkKind::Section,
                });
                continue;
            }
            out.extend(packer::pack_section(section, self.size, self.step()));
        }
        out
    }

    /// Chunk texts only, as stored in the chunk cache.
    pub fn chunk_texts(&self, text: &str) -> Vec<String> {
        self.chunk(text).into_iter().map(|c| c.text).collect()
    }
}
