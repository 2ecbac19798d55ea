/// Collapse `\r\n` and lone `\r` into `\n` so line-based splitting behaves the
/// same for files produced on any platform.
pub fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Number of whitespace-separated words.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// First `max_chars` characters of the trimmed text, with a trailing `...` when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let t = text.trim();
    match t.char_indices().nth(max_chars) {
        None => t.to_string(),
        Some((byte_idx, _)) => {
            let mut s = t[..byte_idx].to_string();
            s.push_str("...");
            s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_crlf_and_cr() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn counts_words_across_mixed_whitespace() {
        assert_eq!(word_count("  Điều 1.\tPhạt   tiền\n500.000 đồng. "), 6);
        assert_eq!(word_count(" \n\t "), 0);
    }

    #[test]
    fn snippet_cuts_on_char_boundaries() {
        assert_eq!(snippet("  Điều 1  ", 20), "Điều 1");
        assert_eq!(snippet("Điều 1. Phạt", 4), "Điều...");
    }
}
