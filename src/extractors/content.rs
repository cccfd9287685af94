// src/extractors/content.rs

// --- Imports ---
use crate::scribd::client::ImageDownloader;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::path::PathBuf;

// --- Constants ---
/// Class names that usually hold document text on the hosting site.
pub const DEFAULT_CLASS_PATTERN: &str = r"(?i)text|content";

// --- CSS Selectors (Lazy Static) ---
// Only paragraphs and divs are candidates; the class filter happens in Rust
static CANDIDATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p[class], div[class]").expect("Failed to compile CANDIDATE_SELECTOR")
});

static IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img[src]").expect("Failed to compile IMAGE_SELECTOR")
});

// --- Data Structures ---
/// Text and image URLs of one matched element, before any download happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBlock {
    pub text: String,
    pub image_urls: Vec<String>,
}

/// The text blob (one line per matched element) and the images that were saved locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    pub text: String,
    pub images: Vec<PathBuf>,
}

pub struct ContentExtractor {
    class_re: Regex,
}

impl ContentExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_class_pattern(DEFAULT_CLASS_PATTERN)
    }

    pub fn with_class_pattern(pattern: &str) -> Result<Self, ExtractError> {
        Ok(Self { class_re: Regex::new(pattern)? })
    }

    /// Walks the candidate elements in document order.
    /// Nested candidates are visited independently, so their text may appear twice.
    pub fn collect_blocks(&self, html: &str) -> Vec<CandidateBlock> {
        let document = Html::parse_document(html);
        let mut blocks = Vec::new();

        for element in document.select(&CANDIDATE_SELECTOR) {
            let class = element.value().attr("class").unwrap_or_default();
            if !self.class_re.is_match(class) {
                continue;
            }
            tracing::trace!("Candidate <{}> with class '{}'", element.value().name(), class);

            let text = element.text().collect::<String>().trim().to_string();

            let image_urls = element
                .select(&IMAGE_SELECTOR)
                .filter_map(|img| img.value().attr("src"))
                .map(str::trim)
                .filter(|src| is_absolute_http(src))
                .map(str::to_string)
                .collect();

            blocks.push(CandidateBlock { text, image_urls });
        }

        tracing::debug!("Matched {} candidate elements", blocks.len());
        blocks
    }

    /// Builds the text blob and downloads every absolute image, keeping discovery order.
    pub async fn extract(&self, html: &str, downloader: &ImageDownloader) -> ExtractedContent {
        let blocks = self.collect_blocks(html);
        let mut content = ExtractedContent::default();

        for block in blocks {
            if !block.text.is_empty() {
                content.text.push_str(&block.text);
                content.text.push('\n');
            }

            for url in &block.image_urls {
                if let Some(path) = downloader.download_image(url).await {
                    content.images.push(path);
                }
            }
        }

        tracing::info!(
            "Extracted {} bytes of text and {} images",
            content.text.len(),
            content.images.len()
        );
        content
    }
}

fn is_absolute_http(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
