// src/extractors/mod.rs
pub mod content;
pub mod toc;

// Re-export key extraction types for convenience
pub use content::ContentExtractor;
pub use toc::{extract_table_of_contents, TocEntry};
