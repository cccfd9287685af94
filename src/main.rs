// src/main.rs
mod utils;
mod scribd;
mod extractors;
mod storage;
mod render;
mod pipeline;

use clap::Parser;
use pipeline::DocumentScraper;
use scribd::client::{self, HttpPageFetcher, ImageDownloader, PageFetcher};
use scribd::DocumentRef;
use storage::StorageManager;
use utils::error::FetchError;
use utils::AppError;

/// Fetches a hosted document and saves its text and images as a PDF with a table of contents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Document to fetch, in the form `document_id/title`
    url: DocumentRef,

    /// Output directory for the text, PDF and metadata files
    #[arg(short, long, default_value = ".")]
    output_dir: String,

    /// Directory for downloaded images (relative paths live under the output directory)
    #[arg(long, default_value = "images")]
    images_dir: String,

    /// Host serving `/document/<id>/<title>`
    #[arg(long, default_value = "www.scribd.com")]
    host: String,

    /// Seconds to wait for client-side scripts to finish rendering the page
    #[arg(long, default_value_t = 30)]
    render_timeout: u64,

    /// Fetch the raw markup without running client-side scripts
    #[arg(long)]
    no_render: bool,

    /// Debug mode - save the raw and annotated page HTML
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Initialize storage (creates the output and images directories)
    let storage = StorageManager::new(&args.output_dir, &args.images_dir)?;

    // 4. Shared HTTP client for page and image downloads
    let http = client::build_http_client().map_err(FetchError::from)?;
    let downloader = ImageDownloader::new(http.clone(), storage.images_dir());
    tracing::debug!("Images will be saved to {}", downloader.images_dir().display());

    // 5. Pick how the page is fetched and run
    #[cfg(feature = "browser")]
    {
        if !args.no_render {
            let fetcher = client::BrowserPageFetcher::new(std::time::Duration::from_secs(args.render_timeout));
            return run(&args, fetcher, downloader, storage).await;
        }
    }

    #[cfg(not(feature = "browser"))]
    {
        if !args.no_render {
            tracing::warn!("Built without the `browser` feature; fetching the page without running scripts");
        }
    }

    run(&args, HttpPageFetcher::new(http), downloader, storage).await
}

async fn run<F: PageFetcher>(
    args: &Args,
    fetcher: F,
    downloader: ImageDownloader,
    storage: StorageManager,
) -> Result<(), AppError> {
    let scraper = DocumentScraper::new(fetcher, downloader, storage).with_debug(args.debug);

    match scraper.scrape(&args.url, &args.host).await {
        Ok(outputs) => {
            tracing::info!(
                "Processing finished. Text: {}, PDF: {}, metadata: {}, images: {}, pages: {}",
                outputs.text_path.display(),
                outputs.pdf_path.display(),
                outputs.metadata_path.display(),
                outputs.images.len(),
                outputs.render.pages
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scraping failed, no output produced: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["scribd_extractor", "123456/Some-Title"]).unwrap();
        assert_eq!(args.url, DocumentRef { id: "123456".into(), title: "Some-Title".into() });
        assert_eq!(args.output_dir, ".");
        assert_eq!(args.images_dir, "images");
        assert_eq!(args.host, "www.scribd.com");
        assert_eq!(args.render_timeout, 30);
        assert!(!args.no_render);
        assert!(!args.debug);
    }

    #[test]
    fn test_args_reject_missing_slash() {
        assert!(Args::try_parse_from(["scribd_extractor", "123456"]).is_err());
        assert!(Args::try_parse_from(["scribd_extractor"]).is_err());
    }

    #[test]
    fn test_args_flags() {
        let args = Args::try_parse_from([
            "scribd_extractor", "1/t", "-o", "out", "--render-timeout", "5", "--no-render", "-d",
        ])
        .unwrap();
        assert_eq!(args.output_dir, "out");
        assert_eq!(args.render_timeout, 5);
        assert!(args.no_render);
        assert!(args.debug);
    }
}
