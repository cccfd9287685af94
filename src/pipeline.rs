// src/pipeline.rs
use crate::extractors::{extract_table_of_contents, ContentExtractor};
use crate::render::{render_pdf_from_file, RenderSummary};
use crate::scribd::client::{ImageDownloader, PageFetcher};
use crate::scribd::DocumentRef;
use crate::storage::{RunSummary, StorageManager};
use crate::utils::html_debug::{create_debug_html, PAGE_DEBUG_PATTERNS};
use crate::utils::AppError;
use std::path::PathBuf;

/// Files produced by a successful run.
#[derive(Debug)]
pub struct ScrapeOutputs {
    pub text_path: PathBuf,
    pub pdf_path: PathBuf,
    pub metadata_path: PathBuf,
    pub images: Vec<PathBuf>,
    pub render: RenderSummary,
}

/// Fetch, extract, save, render. One document per call, strictly in that order.
pub struct DocumentScraper<F> {
    fetcher: F,
    downloader: ImageDownloader,
    storage: StorageManager,
    debug: bool,
}

impl<F: PageFetcher> DocumentScraper<F> {
    pub fn new(fetcher: F, downloader: ImageDownloader, storage: StorageManager) -> Self {
        Self { fetcher, downloader, storage, debug: false }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// A page fetch failure returns before anything is written.
    pub async fn scrape(&self, document: &DocumentRef, host: &str) -> Result<ScrapeOutputs, AppError> {
        let source_url = document.url(host);
        tracing::info!("Scraping document {} from {}", document, source_url);

        // 1. Fetch (and render) the page
        let html = self.fetcher.fetch_page(&source_url).await?;
        tracing::info!("Fetched page ({} bytes)", html.len());

        if self.debug {
            self.save_debug_artifacts(&html);
        }

        // 2. Extract text and download images
        let extractor = ContentExtractor::new()?;
        let content = extractor.extract(&html, &self.downloader).await;

        // 3. Persist the text blob
        let stem = document.sanitized_title();
        let text_path = self.storage.save_text(&stem, &content.text)?;

        // 4. Render from the saved file
        let pdf_path = self.storage.pdf_path(&stem);
        let render = render_pdf_from_file(&text_path, &pdf_path, &content.images)?;

        // 5. Record what was produced
        let toc = extract_table_of_contents(&content.text);
        let metadata_path = self.storage.save_metadata(&stem, &RunSummary {
            document,
            source_url: &source_url,
            text_path: &text_path,
            pdf_path: &pdf_path,
            text_length: content.text.len(),
            images: &content.images,
            toc: &toc,
        })?;

        tracing::info!("Document extracted, saved as {} and {}", text_path.display(), pdf_path.display());
        Ok(ScrapeOutputs {
            text_path,
            pdf_path,
            metadata_path,
            images: content.images,
            render,
        })
    }

    fn save_debug_artifacts(&self, html: &str) {
        match self.storage.save_debug_page(html) {
            Ok(debug_dir) => {
                let annotated = debug_dir.join("page_annotated.html");
                if let Err(e) = create_debug_html(html, &annotated, PAGE_DEBUG_PATTERNS) {
                    tracing::warn!("Failed to create debug HTML: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to save raw page for debugging: {}", e),
        }
    }
}
