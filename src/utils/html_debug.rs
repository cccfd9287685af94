// src/utils/html_debug.rs
use crate::utils::error::AppError;
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// What a highlighted span of the raw page was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// Opening tag of a `p`/`div` whose class looks like document text
    Content,
    /// Image with an absolute URL, downloaded by the extractor
    Image,
    /// Image the extractor ignores (inline data or relative URL)
    Skipped,
}

impl Highlight {
    fn css_class(self) -> &'static str {
        match self {
            Highlight::Content => "highlight-content",
            Highlight::Image => "highlight-image",
            Highlight::Skipped => "highlight-skipped",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Highlight::Content => "content",
            Highlight::Image => "image",
            Highlight::Skipped => "skipped",
        }
    }
}

const HIGHLIGHT_CSS: &str = "\
.highlight-content { background-color: #90EE90; outline: 1px solid #228B22; }
.highlight-image { background-color: #ADD8E6; }
.highlight-skipped { background-color: #FFA500; }
";

/// Patterns highlighted in the annotated page saved by `--debug`.
pub const PAGE_DEBUG_PATTERNS: &[(&str, Highlight)] = &[
    (r#"(?i)<(?:p|div)\b[^>]*\bclass\s*=\s*["'][^"']*(?:text|content)[^"']*["'][^>]*>"#, Highlight::Content),
    (r#"(?i)<img\b[^>]*\bsrc\s*=\s*["']https?://[^"']*["'][^>]*>"#, Highlight::Image),
    (r#"(?i)<img\b[^>]*\bsrc\s*=\s*["'](?:data:|/)[^"']*["'][^>]*>"#, Highlight::Skipped),
];

/// Wraps each `(start, end, kind)` byte range of `html` in a styled span.
/// Ranges are applied in start order; one overlapping an earlier range is dropped.
pub fn annotate_html(html: &str, highlights: &[(usize, usize, Highlight)]) -> String {
    let mut sorted = highlights.to_vec();
    sorted.sort_by_key(|&(start, _, _)| start);

    let mut out = format!("<!DOCTYPE html>\n<html>\n<head>\n<style>\n{}</style>\n</head>\n<body>\n", HIGHLIGHT_CSS);
    let mut last_pos = 0;

    for (start, end, kind) in sorted {
        if start < last_pos || end > html.len() {
            tracing::trace!("Dropping overlapping highlight {}-{} ({})", start, end, kind.label());
            continue;
        }

        out.push_str(&html[last_pos..start]);
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "<span class=\"{}\" title=\"Position: {}-{}, Type: {}\">{}</span>",
            kind.css_class(),
            start,
            end,
            kind.label(),
            &html[start..end]
        );
        last_pos = end;
    }

    out.push_str(&html[last_pos..]);
    out.push_str("\n</body>\n</html>");
    out
}

/// Writes `html` to `path` with every match of `patterns` highlighted.
pub fn create_debug_html(html: &str, path: &Path, patterns: &[(&str, Highlight)]) -> Result<(), AppError> {
    let mut highlights = Vec::new();

    for &(pattern, kind) in patterns {
        let re = Regex::new(pattern).map_err(|e| {
            AppError::Config(format!("Invalid regex pattern '{}': {}", pattern, e))
        })?;
        highlights.extend(re.find_iter(html).map(|m| (m.start(), m.end(), kind)));
    }

    tracing::debug!("Collected {} debug highlights", highlights.len());
    fs::write(path, annotate_html(html, &highlights))?;
    tracing::info!("Saved debug HTML to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotates_candidate_elements_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotated.html");
        let html = r#"<div class="page-content"><img src="https://cdn.example.com/a.png"><img src="data:x"></div><p>plain</p>"#;

        create_debug_html(html, &path, PAGE_DEBUG_PATTERNS).unwrap();

        let annotated = std::fs::read_to_string(&path).unwrap();
        assert!(annotated.contains(r#"<span class="highlight-content""#));
        assert!(annotated.contains(r#"<span class="highlight-image""#));
        assert!(annotated.contains(r#"<span class="highlight-skipped""#));
        assert!(annotated.contains("<p>plain</p>"));
    }

    #[test]
    fn test_overlapping_highlights_keep_first() {
        let annotated = annotate_html("abcdefgh", &[(4, 8, Highlight::Image), (0, 6, Highlight::Content)]);

        assert!(annotated.contains("Type: content\">abcdef</span>gh"));
        assert!(!annotated.contains("Type: image"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_debug_html("<p></p>", &dir.path().join("x.html"), &[("(", Highlight::Content)]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
