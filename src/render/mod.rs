// src/render/mod.rs
pub mod metrics;
pub mod pdf;
pub mod story;

pub use pdf::{render_pdf_from_file, RenderSummary};
