// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};
use crate::extractors::TocEntry;
use crate::scribd::DocumentRef;
use crate::utils::error::StorageError;

/// Owns the output layout: `<base>/<stem>_sinfotos.txt`, `<base>/<stem>.pdf`,
/// `<base>/<stem>_meta.json`, the images directory and `<base>/debug/`.
pub struct StorageManager {
    base_dir: PathBuf,
    images_dir: PathBuf,
}

/// Everything the metadata file records about one run.
pub struct RunSummary<'a> {
    pub document: &'a DocumentRef,
    pub source_url: &'a str,
    pub text_path: &'a Path,
    pub pdf_path: &'a Path,
    pub text_length: usize,
    pub images: &'a [PathBuf],
    pub toc: &'a [TocEntry],
}

impl StorageManager {
    /// Creates the base and images directories. A relative `images_dir` lives under `base_dir`.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(base_dir: P, images_dir: Q) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();
        let images_path = base_path.join(images_dir.as_ref());

        for dir in [&base_path, &images_path] {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .map_err(StorageError::IoError)?;
            }
        }

        Ok(Self { base_dir: base_path, images_dir: images_path })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn text_path(&self, stem: &str) -> PathBuf {
        self.base_dir.join(format!("{}_sinfotos.txt", stem))
    }

    pub fn pdf_path(&self, stem: &str) -> PathBuf {
        self.base_dir.join(format!("{}.pdf", stem))
    }

    pub fn metadata_path(&self, stem: &str) -> PathBuf {
        self.base_dir.join(format!("{}_meta.json", stem))
    }

    /// Writes the extracted text blob as UTF-8
    pub fn save_text(&self, stem: &str, text: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.text_path(stem);

        fs::write(&file_path, text.as_bytes())
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved text to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the run in JSON format
    pub fn save_metadata(&self, stem: &str, summary: &RunSummary<'_>) -> Result<PathBuf, StorageError> {
        let file_path = self.metadata_path(stem);

        let images: Vec<String> = summary.images.iter()
            .map(|p| p.display().to_string())
            .collect();

        let metadata = serde_json::json!({
            "document_id": summary.document.id,
            "title": summary.document.title,
            "source_url": summary.source_url,
            "text_file": summary.text_path.display().to_string(),
            "pdf_file": summary.pdf_path.display().to_string(),
            "text_length": summary.text_length,
            "images": images,
            "table_of_contents": summary.toc,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves the fetched markup under `<base>/debug/`, returning the directory.
    pub fn save_debug_page(&self, html: &str) -> Result<PathBuf, StorageError> {
        let debug_dir = self.base_dir.join("debug");
        fs::create_dir_all(&debug_dir)
            .map_err(StorageError::IoError)?;

        let raw_path = debug_dir.join("raw_page.html");
        fs::write(&raw_path, html)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved raw page to: {}", raw_path.display());
        Ok(debug_dir)
    }
}
