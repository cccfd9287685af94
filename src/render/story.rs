// src/render/story.rs
use crate::extractors::{extract_table_of_contents, TocEntry};
use std::path::PathBuf;

pub const TOC_HEADING: &str = "Table of Contents";
pub const TOC_HEADER_ROW: (&str, &str) = ("Section", "Title");

pub const SPACE_AFTER_HEADING: f32 = 12.0;
pub const SPACE_AFTER_TOC: f32 = 20.0;
pub const SPACE_AFTER_PARAGRAPH: f32 = 6.0;
pub const SPACE_AFTER_IMAGE: f32 = 12.0;

/// One flowable element of the output, laid out top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    TocTable(Vec<TocEntry>),
    Paragraph(String),
    Image(PathBuf),
    Spacer(f32),
}

/// Orders the document: table of contents (when any numbered lines exist), one paragraph
/// per non-blank line, then the images.
pub fn build_story(text: &str, images: &[PathBuf]) -> Vec<Block> {
    let mut story = Vec::new();

    let toc = extract_table_of_contents(text);
    if !toc.is_empty() {
        story.push(Block::Heading(TOC_HEADING.to_string()));
        story.push(Block::Spacer(SPACE_AFTER_HEADING));
        story.push(Block::TocTable(toc));
        story.push(Block::Spacer(SPACE_AFTER_TOC));
    }

    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        story.push(Block::Paragraph(line.to_string()));
        story.push(Block::Spacer(SPACE_AFTER_PARAGRAPH));
    }

    for image in images {
        story.push(Block::Image(image.clone()));
        story.push(Block::Spacer(SPACE_AFTER_IMAGE));
    }

    story
}
