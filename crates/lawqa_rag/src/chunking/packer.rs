use lawqa_core::normalize::text::word_count;

use super::{Chunk, ChunkKind, CONTEXT_SEPARATOR, CONTINUATION_MARK};

/// Boundary decision for one line of an oversized section.
///
/// `FinalFlush` is never returned by [`classify_line`]; it is the step taken once
/// the line sequence is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackStep {
    Accumulate,
    FlushOnLimit,
    FlushOnOversizedLine,
    FinalFlush,
}

/// Decide what a line of `line_words` words does to an accumulation of
/// `current_words` words under a cap of `size`.
pub fn classify_line(current_words: usize, line_words: usize, size: usize) -> PackStep {
    if line_words > size {
        PackStep::FlushOnOversizedLine
    } else if current_words + line_words > size {
        PackStep::FlushOnLimit
    } else {
        PackStep::Accumulate
    }
}

/// Split one oversized section (its first line is the header) into chunks.
pub(super) fn pack_section(section: &str, size: usize, step: usize) -> Vec<Chunk> {
    let mut lines = section.split('\n');
    let header = lines.next().unwrap_or_default();
    let mut packer = SectionPacker::new(header, size, step);
    packer.feed(0, header);
    for (i, line) in lines.enumerate() {
        packer.feed(i + 1, line);
    }
    packer.finish()
}

struct SectionPacker<'a> {
    header: &'a str,
    size: usize,
    step: usize,
    current: Vec<&'a str>,
    current_words: usize,
    out: Vec<Chunk>,
}

impl<'a> SectionPacker<'a> {
    fn new(header: &'a str, size: usize, step: usize) -> Self {
        Self {
            header,
            size,
            step,
            current: Vec::new(),
            current_words: 0,
            out: Vec::new(),
        }
    }

    fn feed(&mut self, index: usize, line: &'a str) {
        let line_words = word_count(line);
        match classify_line(self.current_words, line_words, self.size) {
            PackStep::Accumulate => {
                self.current.push(line);
                self.current_words += line_words;
            }
            PackStep::FlushOnLimit => {
                self.flush(index > 0);
                self.current.push(line);
                self.current_words = line_words;
            }
            PackStep::FlushOnOversizedLine => {
                self.flush(index > 0);
                self.push_windows(index, line);
            }
            PackStep::FinalFlush => unreachable!("classify_line never yields FinalFlush"),
        }
    }

    fn finish(mut self) -> Vec<Chunk> {
        // The tail always carries the header, even when it started on line 0.
        self.flush(true);
        self.out
    }

    fn flush(&mut self, may_prefix: bool) {
        if self.current.is_empty() {
            return;
        }
        let body = self.current.join("\n");
        self.current.clear();
        self.current_words = 0;
        if body.trim().is_empty() {
            return;
        }

        if may_prefix && !body.contains(self.header) {
            self.out.push(Chunk {
                text: format!("{}{CONTEXT_SEPARATOR}{body}", self.header),
                header: Some(self.header.to_string()),
                kind: ChunkKind::Packed,
            });
        } else {
            self.out.push(Chunk {
                text: body,
                header: None,
                kind: ChunkKind::Packed,
            });
        }
    }

    fn push_windows(&mut self, index: usize, line: &str) {
        let words: Vec<&str> = line.split_whitespace().collect();
        for start in (0..words.len()).step_by(self.step) {
            let end = (start + self.size).min(words.len());
            let body = words[start..end].join(" ");
            if index > 0 && !body.contains(self.header) {
                self.out.push(Chunk {
                    text: format!("{}{CONTINUATION_MARK}{CONTEXT_SEPARATOR}{body}", self.header),
                    header: Some(self.header.to_string()),
                    kind: ChunkKind::Window,
                });
            } else {
                self.out.push(Chunk {
                    text: body,
                    header: None,
                    kind: ChunkKind::Window,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(prefix: &str, n: usize) -> String {
        (0..n)
            .map(|i| format!("{prefix}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn classify_covers_each_boundary() {
        assert_eq!(classify_line(0, 5, 5), PackStep::Accumulate);
        assert_eq!(classify_line(3, 2, 5), PackStep::Accumulate);
        assert_eq!(classify_line(3, 3, 5), PackStep::FlushOnLimit);
        assert_eq!(classify_line(0, 6, 5), PackStep::FlushOnOversizedLine);
        assert_eq!(classify_line(4, 6, 5), PackStep::FlushOnOversizedLine);
    }

    #[test]
    fn packs_lines_and_prefixes_continuations() {
        // header (2 words) + three 3-word lines under a 5-word cap.
        let section = "Điều 9.\na b c\nd e f\ng h i";
        let got = pack_section(section, 5, 4);
        let texts: Vec<&str> = got.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Điều 9.\na b c",
                "Điều 9.\n...\nd e f",
                "Điều 9.\n...\ng h i",
            ]
        );
        assert_eq!(got[0].header, None);
        assert_eq!(got[1].header.as_deref(), Some("Điều 9."));
        assert!(got.iter().all(|c| c.kind == ChunkKind::Packed));
    }

    #[test]
    fn oversized_line_becomes_overlapping_windows() {
        let long = words("w", 10);
        let section = format!("Điều 4. Tiêu đề\n{long}");
        let got = pack_section(&section, 6, 4);
        let texts: Vec<&str> = got.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Điều 4. Tiêu đề",
                "Điều 4. Tiêu đề (tiếp)\n...\nw0 w1 w2 w3 w4 w5",
                "Điều 4. Tiêu đề (tiếp)\n...\nw4 w5 w6 w7 w8 w9",
                "Điều 4. Tiêu đề (tiếp)\n...\nw8 w9",
            ]
        );
        assert_eq!(got[0].kind, ChunkKind::Packed);
        assert!(got[1..].iter().all(|c| c.kind == ChunkKind::Window));
    }

    #[test]
    fn oversized_header_line_windows_are_not_prefixed() {
        let header = format!("Điều 1. {}", words("h", 8));
        let got = pack_section(&format!("{header}\nđuôi"), 5, 5);
        assert_eq!(got[0].text, "Điều 1. h0 h1 h2");
        assert_eq!(got[0].header, None);
        assert_eq!(got[1].text, "h3 h4 h5 h6 h7");
        assert_eq!(got[1].header, None);
        // The tail is flushed with the header even though it follows line 0's windows.
        assert_eq!(got.last().map(|c| c.text.as_str()), Some(format!("{header}\n...\nđuôi").as_str()));
    }

    #[test]
    fn blank_only_accumulation_is_not_emitted() {
        let long = words("x", 7);
        let section = format!("Điều 2.\n{long}\n\n");
        let got = pack_section(&section, 5, 5);
        assert!(got.iter().all(|c| !c.text.trim().is_empty()));
        assert!(got.iter().all(|c| c.kind == ChunkKind::Window || c.text.starts_with("Điều 2.")));
        assert_eq!(got.len(), 3);
    }
}
