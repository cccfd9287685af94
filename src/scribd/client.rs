// src/scribd/client.rs
use crate::utils::error::FetchError;
use reqwest::header;
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = concat!("scribd_extractor/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 60;
#[cfg(feature = "browser")]
const BROWSER_EXIT_GRACE: Duration = Duration::from_secs(5);

/// Creates a reqwest client shared by page and image downloads.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Source of page markup. The pipeline only needs the final HTML.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain GET, no script execution.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        tracing::info!("Downloading page from: {}", url);

        let response = self.client.get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*")
            .send()
            .await?; // Propagates reqwest::Error as FetchError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            return Err(FetchError::Http(status, url.to_string()));
        }

        let body = response.text().await?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

        Ok(body)
    }
}

/// Loads the page in headless Chrome so client-side scripts run before the markup is read.
#[cfg(feature = "browser")]
pub struct BrowserPageFetcher {
    timeout: Duration,
}

#[cfg(feature = "browser")]
impl BrowserPageFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[cfg(feature = "browser")]
impl PageFetcher for BrowserPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        use chromiumoxide::browser::{Browser, BrowserConfig};
        use chromiumoxide::error::CdpError;
        use futures::StreamExt;

        tracing::info!("Rendering page in headless browser: {} (timeout {}s)", url, self.timeout.as_secs());

        let config = BrowserConfig::builder()
            .request_timeout(self.timeout)
            .build()
            .map_err(FetchError::Browser)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        // The handler must be polled for the browser connection to make progress
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let rendered = tokio::time::timeout(self.timeout, async {
            let page = browser.new_page(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, CdpError>(page.content().await?)
        })
        .await;

        // Tear the browser down on every path before reporting the outcome
        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        match tokio::time::timeout(BROWSER_EXIT_GRACE, browser.wait()).await {
            Ok(Err(e)) => tracing::warn!("Failed to wait for browser exit: {}", e),
            Err(_) => tracing::warn!("Browser did not exit within {:?}, dropping it", BROWSER_EXIT_GRACE),
            Ok(Ok(_)) => {}
        }
        events.abort();

        match rendered {
            Err(_) => Err(FetchError::Timeout(self.timeout.as_secs())),
            Ok(Err(e)) => Err(FetchError::Browser(e.to_string())),
            Ok(Ok(html)) => {
                tracing::debug!("Rendered page is {} bytes", html.len());
                Ok(html)
            }
        }
    }
}

/// Downloads images into a fixed directory. Failures are expected and reported as `None`.
pub struct ImageDownloader {
    client: reqwest::Client,
    images_dir: PathBuf,
}

impl ImageDownloader {
    pub fn new(client: reqwest::Client, images_dir: impl Into<PathBuf>) -> Self {
        Self { client, images_dir: images_dir.into() }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// GETs `url` and stores the body as `<images_dir>/<basename>` when the status is 200.
    pub async fn download_image(&self, url: &str) -> Option<PathBuf> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Error downloading image {}: {}", url, e);
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!("Error downloading image {}: HTTP {}", url, response.status());
            return None;
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Error reading image body {}: {}", url, e);
                return None;
            }
        };

        let path = self.images_dir.join(image_file_name(url));
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            tracing::warn!("Error saving image {} to {}: {}", url, path.display(), e);
            return None;
        }

        tracing::debug!("Saved image {} ({} bytes) to {}", url, bytes.len(), path.display());
        Some(path)
    }
}

/// Last non-empty path segment of the URL, ignoring query and fragment.
pub fn image_file_name(url: &str) -> String {
    let parsed = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return "image".to_string(),
    };

    let name = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string);

    name.unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_image_file_name() {
        assert_eq!(image_file_name("https://cdn.example.com/img/page-1.png"), "page-1.png");
        assert_eq!(image_file_name("https://cdn.example.com/img/page-1.png?w=300#top"), "page-1.png");
        assert_eq!(image_file_name("https://cdn.example.com/img/"), "img");
        assert_eq!(image_file_name("https://cdn.example.com/"), "image");
        assert_eq!(image_file_name("not a url"), "image");
    }

    #[tokio::test]
    async fn test_download_image_saves_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/img/cover.jpg")
            .with_status(200)
            .with_body(b"fake-jpeg-bytes")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(build_http_client().unwrap(), dir.path());

        let path = downloader.download_image(&format!("{}/img/cover.jpg", server.url())).await;

        mock.assert_async().await;
        let path = path.expect("image should be downloaded");
        assert_eq!(path, dir.path().join("cover.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"fake-jpeg-bytes");
    }

    #[tokio::test]
    async fn test_download_image_non_200_is_absent() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server.mock("GET", "/missing.png").with_status(404).create_async().await;
        let _moved = server.mock("GET", "/moved.png").with_status(204).create_async().await;
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(build_http_client().unwrap(), dir.path());

        assert!(downloader.download_image(&format!("{}/missing.png", server.url())).await.is_none());
        assert!(downloader.download_image(&format!("{}/moved.png", server.url())).await.is_none());
        assert!(!dir.path().join("missing.png").exists());
    }

    #[tokio::test]
    async fn test_download_image_unreachable_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(build_http_client().unwrap(), dir.path());
        assert!(downloader.download_image("http://127.0.0.1:1/a.png").await.is_none());
    }

    #[tokio::test]
    async fn test_download_image_unwritable_dir_is_absent() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server.mock("GET", "/a.png").with_status(200).with_body("png").create_async().await;
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(build_http_client().unwrap(), dir.path().join("nope"));
        assert!(downloader.download_image(&format!("{}/a.png", server.url())).await.is_none());
    }

    #[tokio::test]
    async fn test_http_page_fetcher() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server.mock("GET", "/document/1/Doc")
            .with_status(200)
            .with_body("<html><body><p class='text'>hi</p></body></html>")
            .create_async()
            .await;
        let _gone = server.mock("GET", "/document/2/Gone").with_status(404).create_async().await;
        let fetcher = HttpPageFetcher::new(build_http_client().unwrap());

        let html = assert_ok!(fetcher.fetch_page(&format!("{}/document/1/Doc", server.url())).await);
        assert!(html.contains("class='text'"));

        let err = assert_err!(fetcher.fetch_page(&format!("{}/document/2/Gone", server.url())).await);
        assert!(matches!(err, FetchError::Http(status, _) if status == reqwest::StatusCode::NOT_FOUND));
    }
}
