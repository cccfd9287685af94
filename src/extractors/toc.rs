// src/extractors/toc.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// A line that starts with a section number ("3", "2.1", "4.2.7.") followed by a title
static TOC_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d+(?:\.\d+)*)\.?[ \t]+([^\r\n]*\S)")
        .expect("Failed to compile TOC_LINE_RE")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub section: String,
    pub title: String,
}

impl TocEntry {
    pub fn new(section: impl Into<String>, title: impl Into<String>) -> Self {
        Self { section: section.into(), title: title.into() }
    }
}

/// Every numbered line of `text`, in order. Duplicates and odd numbering pass through untouched.
pub fn extract_table_of_contents(text: &str) -> Vec<TocEntry> {
    let entries: Vec<TocEntry> = TOC_LINE_RE
        .captures_iter(text)
        .map(|caps| TocEntry::new(&caps[1], caps[2].trim()))
        .collect();

    tracing::debug!("Found {} table of contents entries", entries.len());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_lines_become_entries() {
        let entries = extract_table_of_contents("1 Introduction\nSome body\n2.1 Details\n");
        assert_eq!(entries, vec![TocEntry::new("1", "Introduction"), TocEntry::new("2.1", "Details")]);
    }

    #[test]
    fn test_entry_count_matches_numbered_lines() {
        let mut text = String::new();
        let mut expected = Vec::new();
        for i in 1..=25 {
            text.push_str(&format!("{}.{} Section number {}  \n", i, i % 4, i));
            text.push_str("body text without a number\n\n");
            expected.push(TocEntry::new(format!("{}.{}", i, i % 4), format!("Section number {}", i)));
        }
        assert_eq!(extract_table_of_contents(&text), expected);
    }

    #[test]
    fn test_duplicates_and_deep_numbers_pass_through() {
        let text = "1 Intro\n1 Intro\n3.2.1. Deep part\n  4\tIndented\n";
        let entries = extract_table_of_contents(text);
        assert_eq!(entries, vec![
            TocEntry::new("1", "Intro"),
            TocEntry::new("1", "Intro"),
            TocEntry::new("3.2.1", "Deep part"),
            TocEntry::new("4", "Indented"),
        ]);
    }

    #[test]
    fn test_non_matching_lines() {
        let text = "Chapter 1 Intro\n2023\n12345678\n7 \nplain\r\n";
        assert!(extract_table_of_contents(text).is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let entries = extract_table_of_contents("1 First\r\n2 Second\r\n");
        assert_eq!(entries, vec![TocEntry::new("1", "First"), TocEntry::new("2", "Second")]);
    }
}
