// src/render/pdf.rs
use crate::extractors::TocEntry;
use crate::render::metrics::wrap_text;
use crate::render::story::{build_story, Block, TOC_HEADER_ROW};
use crate::utils::error::RenderError;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Polygon, Rgb,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};

// --- Page geometry (points) ---
// US Letter with one-inch margins
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const FRAME_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const FRAME_TOP: f32 = PAGE_HEIGHT - MARGIN;
const FRAME_BOTTOM: f32 = MARGIN;

// --- Styles ---
const BODY_SIZE: f32 = 10.0;
const BODY_LEADING: f32 = 12.0;
const HEADING_SIZE: f32 = 14.0;
const HEADING_LEADING: f32 = 16.8;

const TOC_COLUMNS: [f32; 2] = [72.0, 360.0];
const CELL_PAD_X: f32 = 6.0;
const CELL_PAD_Y: f32 = 3.0;
const GRID_THICKNESS: f32 = 1.0;

const IMAGE_WIDTH: f32 = 288.0;
// One pixel per point before scaling
const IMAGE_DPI: f32 = 72.0;

type RgbTriple = (f32, f32, f32);
const BLACK: RgbTriple = (0.0, 0.0, 0.0);
const DARK_BLUE: RgbTriple = (0.0, 0.0, 0.545);
const GREY: RgbTriple = (0.502, 0.502, 0.502);
const WHITE_SMOKE: RgbTriple = (0.961, 0.961, 0.961);
const BEIGE: RgbTriple = (0.961, 0.961, 0.863);

struct RowStyle {
    bold: bool,
    size: f32,
    leading: f32,
    fill: RgbTriple,
    text: RgbTriple,
    bottom_pad: f32,
}

const HEADER_ROW: RowStyle = RowStyle {
    bold: true,
    size: 12.0,
    leading: 14.4,
    fill: GREY,
    text: WHITE_SMOKE,
    bottom_pad: 12.0,
};

const BODY_ROW: RowStyle = RowStyle {
    bold: false,
    size: BODY_SIZE,
    leading: BODY_LEADING,
    fill: BEIGE,
    text: BLACK,
    bottom_pad: CELL_PAD_Y,
};

/// What ended up in the written document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    pub paragraphs: usize,
    pub toc_entries: usize,
    pub images_embedded: usize,
    pub images_skipped: usize,
}

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn color((r, g, b): RgbTriple) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn pdf_error(e: impl std::fmt::Debug) -> RenderError {
    RenderError::Pdf(format!("{:?}", e))
}

/// Top-down flow layout over printpdf pages.
struct PdfLayout {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor: f32,
    summary: RenderSummary,
}

impl PdfLayout {
    fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) = PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: FRAME_TOP,
            summary: RenderSummary { pages: 1, ..Default::default() },
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = FRAME_TOP;
        self.summary.pages += 1;
    }

    /// Starts a new page unless `height` fits below the cursor or the page is still empty.
    fn reserve(&mut self, height: f32) {
        if self.cursor - height < FRAME_BOTTOM && self.cursor < FRAME_TOP {
            self.new_page();
        }
    }

    fn draw_text(&self, text: &str, size: f32, x: f32, baseline: f32, font: &IndirectFontRef, fill: RgbTriple) {
        self.layer.set_fill_color(color(fill));
        self.layer.use_text(text, size, mm(x), mm(baseline), font);
    }

    fn spacer(&mut self, height: f32) {
        self.cursor = (self.cursor - height).max(FRAME_BOTTOM);
    }

    fn heading(&mut self, text: &str) {
        for line in wrap_text(text, HEADING_SIZE, FRAME_WIDTH) {
            self.reserve(HEADING_LEADING);
            self.draw_text(&line, HEADING_SIZE, MARGIN, self.cursor - HEADING_SIZE, &self.bold, DARK_BLUE);
            self.cursor -= HEADING_LEADING;
        }
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap_text(text, BODY_SIZE, FRAME_WIDTH) {
            self.reserve(BODY_LEADING);
            self.draw_text(&line, BODY_SIZE, MARGIN, self.cursor - BODY_SIZE, &self.regular, BLACK);
            self.cursor -= BODY_LEADING;
        }
        self.summary.paragraphs += 1;
    }

    fn toc_table(&mut self, entries: &[TocEntry]) {
        self.table_row([TOC_HEADER_ROW.0, TOC_HEADER_ROW.1], &HEADER_ROW);
        for entry in entries {
            self.table_row([entry.section.as_str(), entry.title.as_str()], &BODY_ROW);
        }
        self.summary.toc_entries += entries.len();
    }

    /// Rows that fit on a fresh page are kept whole; taller rows continue on the next page,
    /// repeating the cell fill and grid for each piece.
    fn table_row(&mut self, cells: [&str; 2], style: &RowStyle) {
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(TOC_COLUMNS)
            .map(|(text, width)| wrap_text(text, style.size, width - 2.0 * CELL_PAD_X))
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let padding = CELL_PAD_Y + style.bottom_pad;

        self.reserve(padding + line_count as f32 * style.leading);

        let mut drawn = 0;
        while drawn < line_count {
            // Small slack so float rounding never lets a piece cross the bottom margin
            let fits = ((self.cursor - FRAME_BOTTOM - padding) / style.leading - 1e-3).floor();
            if fits < 1.0 && self.cursor < FRAME_TOP {
                self.new_page();
                continue;
            }
            let take = (fits.max(1.0) as usize).min(line_count - drawn);
            self.row_piece(&wrapped, drawn..drawn + take, style);
            drawn += take;
        }
    }

    fn row_piece(&mut self, wrapped: &[Vec<String>], lines: Range<usize>, style: &RowStyle) {
        let height = CELL_PAD_Y + lines.len() as f32 * style.leading + style.bottom_pad;
        let top = self.cursor;
        let font = if style.bold { &self.bold } else { &self.regular };

        let mut x = MARGIN;
        for (column, width) in wrapped.iter().zip(TOC_COLUMNS) {
            self.cell(x, top - height, width, height, style.fill);
            let visible = &column[lines.start.min(column.len())..lines.end.min(column.len())];
            let mut baseline = top - CELL_PAD_Y - style.size;
            for line in visible {
                self.draw_text(line, style.size, x + CELL_PAD_X, baseline, font, style.text);
                baseline -= style.leading;
            }
            x += width;
        }

        self.cursor -= height;
        debug_assert!(self.cursor >= FRAME_BOTTOM, "table row drawn below the frame");
    }

    /// Filled cell with a grid border
    fn cell(&self, x: f32, y: f32, width: f32, height: f32, fill: RgbTriple) {
        let corners = vec![
            (Point::new(mm(x), mm(y)), false),
            (Point::new(mm(x + width), mm(y)), false),
            (Point::new(mm(x + width), mm(y + height)), false),
            (Point::new(mm(x), mm(y + height)), false),
        ];

        self.layer.set_fill_color(color(fill));
        self.layer.set_outline_color(color(BLACK));
        self.layer.set_outline_thickness(GRID_THICKNESS);
        self.layer.add_polygon(Polygon {
            rings: vec![corners],
            mode: PaintMode::FillStroke,
            winding_order: WindingOrder::NonZero,
        });
    }

    /// Draws the image 4in wide (or smaller when it would not fit a page). Unreadable files are skipped.
    fn image(&mut self, path: &Path) {
        let decoded = match decode_image(path) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Error adding image {}: {}", path.display(), e);
                self.summary.images_skipped += 1;
                return;
            }
        };

        let (px_width, px_height) = (decoded.width(), decoded.height());
        if px_width == 0 || px_height == 0 {
            tracing::warn!("Error adding image {}: empty image", path.display());
            self.summary.images_skipped += 1;
            return;
        }

        let mut width = IMAGE_WIDTH;
        let mut height = width * px_height as f32 / px_width as f32;
        let frame_height = FRAME_TOP - FRAME_BOTTOM;
        if height > frame_height {
            width *= frame_height / height;
            height = frame_height;
        }

        self.reserve(height);
        let x = MARGIN + (FRAME_WIDTH - width) / 2.0;
        let y = self.cursor - height;

        // printpdf embeds alpha channels poorly, flatten to RGB first
        let flattened = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
        Image::from_dynamic_image(&flattened).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(mm(x)),
                translate_y: Some(mm(y)),
                scale_x: Some(width / px_width as f32),
                scale_y: Some(height / px_height as f32),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );

        self.cursor = y;
        self.summary.images_embedded += 1;
        tracing::debug!("Embedded image {} at {:.0}x{:.0}pt", path.display(), width, height);
    }

    fn save(self, output: &Path) -> Result<RenderSummary, RenderError> {
        let file = File::create(output)?;
        self.doc.save(&mut BufWriter::new(file)).map_err(pdf_error)?;
        Ok(self.summary)
    }
}

/// Decodes by sniffing the file contents, so names without (or with the wrong) extension still load.
fn decode_image(path: &Path) -> Result<image::DynamicImage, image::ImageError> {
    image::io::Reader::open(path)?.with_guessed_format()?.decode()
}

/// Lays out `text` (TOC, paragraphs) followed by `images` and writes the PDF to `output`.
pub fn render_pdf(text: &str, output: &Path, images: &[PathBuf]) -> Result<RenderSummary, RenderError> {
    let title = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let story = build_story(text, images);
    tracing::debug!("Laying out {} blocks", story.len());

    let mut layout = PdfLayout::new(&title)?;
    for block in &story {
        match block {
            Block::Heading(text) => layout.heading(text),
            Block::TocTable(entries) => layout.toc_table(entries),
            Block::Paragraph(text) => layout.paragraph(text),
            Block::Image(path) => layout.image(path),
            Block::Spacer(height) => layout.spacer(*height),
        }
    }

    let summary = layout.save(output)?;
    tracing::info!(
        "PDF created successfully: {} ({} pages, {} TOC entries, {} paragraphs, {} images, {} skipped)",
        output.display(),
        summary.pages,
        summary.toc_entries,
        summary.paragraphs,
        summary.images_embedded,
        summary.images_skipped
    );
    Ok(summary)
}

/// Reads the saved text file back and renders it.
pub fn render_pdf_from_file(input: &Path, output: &Path, images: &[PathBuf]) -> Result<RenderSummary, RenderError> {
    let text = fs::read_to_string(input)?;
    render_pdf(&text, output, images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::from_pixel(width, height, image::Rgba([200, 20, 20, 128]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_render_text_toc_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        let tall = dir.path().join("tall.png");
        let corrupt = dir.path().join("corrupt.png");
        write_png(&good, 40, 20);
        write_png(&tall, 10, 400);
        fs::write(&corrupt, b"not an image").unwrap();
        let output = dir.path().join("doc.pdf");

        let text = "1 Introduction\nSome body\n\n2.1 Details\n";
        let images = vec![good, corrupt, dir.path().join("missing.jpg"), tall];
        let summary = render_pdf(text, &output, &images).unwrap();

        assert_eq!(summary.paragraphs, 3);
        assert_eq!(summary.toc_entries, 2);
        assert_eq!(summary.images_embedded, 2);
        assert_eq!(summary.images_skipped, 2);
        let bytes = fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_images_decoded_by_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.png");
        write_png(&source, 16, 16);
        let bare = dir.path().join("image");
        let mislabelled = dir.path().join("cover.jpg");
        fs::copy(&source, &bare).unwrap();
        fs::copy(&source, &mislabelled).unwrap();

        let summary = render_pdf("Body\n", &dir.path().join("doc.pdf"), &[bare, mislabelled]).unwrap();

        assert_eq!(summary.images_embedded, 2);
        assert_eq!(summary.images_skipped, 0);
    }

    #[test]
    fn test_oversized_toc_row_continues_on_next_page() {
        let title = "word ".repeat(1500);
        let entries = vec![TocEntry::new("1", title.trim()), TocEntry::new("2", "Short")];
        let mut layout = PdfLayout::new("toc").unwrap();
        layout.heading("Table of Contents");

        let mut lowest = layout.cursor;
        layout.table_row([TOC_HEADER_ROW.0, TOC_HEADER_ROW.1], &HEADER_ROW);
        for entry in &entries {
            layout.table_row([entry.section.as_str(), entry.title.as_str()], &BODY_ROW);
            lowest = lowest.min(layout.cursor);
        }

        assert!(lowest >= FRAME_BOTTOM, "cursor dropped to {}", lowest);
        assert!(layout.summary.pages >= 2);

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("toc.pdf");
        let summary = render_pdf(&format!("1 {}\n2 Short\n", title.trim()), &output, &[]).unwrap();
        assert_eq!(summary.toc_entries, 2);
        assert!(summary.pages >= 2);
    }

    #[test]
    fn test_long_text_spans_pages() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("long.pdf");
        let text = "A line of body text that is long enough to matter.\n".repeat(200);

        let summary = render_pdf(&text, &output, &[]).unwrap();

        assert_eq!(summary.paragraphs, 200);
        assert!(summary.pages > 1);
        assert_eq!(summary.toc_entries, 0);
    }

    #[test]
    fn test_empty_text_still_writes_a_page() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("empty.pdf");
        let summary = render_pdf("", &output, &[]).unwrap();
        assert_eq!(summary.pages, 1);
        assert!(output.exists());
    }

    #[test]
    fn test_render_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc_sinfotos.txt");
        let output = dir.path().join("doc.pdf");
        fs::write(&input, "3 Results\nNumbers\n").unwrap();

        let summary = render_pdf_from_file(&input, &output, &[]).unwrap();
        assert_eq!(summary.paragraphs, 2);
        assert_eq!(summary.toc_entries, 1);

        let missing = render_pdf_from_file(&dir.path().join("nope.txt"), &output, &[]);
        assert!(matches!(missing, Err(RenderError::Io(_))));
    }
}
