use regex::Regex;

/// Cut `text` before every line that matches `marker`; each section keeps its marker
/// line as the first line. Sections are trimmed and blank ones dropped. Text ahead of
/// the first marker (a preamble) is its own section.
pub(super) fn split_sections<'a>(text: &'a str, marker: &Regex) -> Vec<&'a str> {
    let bytes = text.as_bytes();
    let mut cuts: Vec<usize> = marker
        .find_iter(text)
        .map(|m| m.start())
        .filter(|&start| start == 0 || bytes[start - 1] == b'\n')
        .collect();
    cuts.dedup();

    let mut bounds = Vec::with_capacity(cuts.len() + 2);
    bounds.push(0);
    bounds.extend(cuts.into_iter().filter(|&c| c > 0));
    bounds.push(text.len());

    bounds
        .windows(2)
        .map(|w| text[w[0]..w[1]].trim())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::RegexBuilder;

    fn marker() -> Regex {
        RegexBuilder::new(r"^Điều \d+\.")
            .multi_line(true)
            .build()
            .expect("regex")
    }

    #[test]
    fn splits_at_line_leading_markers_only() {
        let text = "Điều 1. A\ntheo Điều 2. không cắt\nĐiều 3. B";
        assert_eq!(
            split_sections(text, &marker()),
            vec!["Điều 1. A\ntheo Điều 2. không cắt", "Điều 3. B"]
        );
    }

    #[test]
    fn keeps_preamble_and_drops_blank_sections() {
        let text = "NGHỊ ĐỊNH 168\n\nĐiều 1. A\n   \nĐiều 2. B\n";
        assert_eq!(
            split_sections(text, &marker()),
            vec!["NGHỊ ĐỊNH 168", "Điều 1. A", "Điều 2. B"]
        );
    }

    #[test]
    fn marker_without_number_is_not_a_boundary() {
        let text = "Điều 1. A\nĐiều khoản thi hành.";
        assert_eq!(split_sections(text, &marker()), vec![text]);
    }

    #[test]
    fn empty_text_has_no_sections() {
        assert!(split_sections("", &marker()).is_empty());
    }
}
