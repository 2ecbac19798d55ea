use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::AppError;

use super::{has_extension, read_bytes, DocumentReader};

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph text of `.docx` files, one paragraph per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxReader;

impl DocumentReader for DocxReader {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["docx"])
    }

    fn read(&self, path: &Path) -> Result<String, AppError> {
        let bytes = read_bytes(path)?;
        let fail = |msg: &str, err: String| {
            AppError::new("RAG_DOCS_READ_FAILED", msg)
                .with_details(format!("path={}; err={}", path.display(), err))
        };

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| fail("Document is not a DOCX archive", e.to_string()))?;
        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| fail("DOCX archive has no main document part", e.to_string()))?
            .read_to_string(&mut xml)
            .map_err(|e| fail("Failed to read DOCX document part", e.to_string()))?;

        paragraphs_text(&xml).map_err(|e| fail("Failed to parse DOCX document part", e))
    }
}

/// Concatenate `w:t` runs, one line per `w:p`; `w:tab` and `w:br` map to `\t` and `\n`.
fn paragraphs_text(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
