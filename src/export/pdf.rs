//! PDF rendering
//!
//! HTML is flattened into blocks, wrapped to the A4 text column and laid out
//! top to bottom with the builtin Helvetica faces. Images given as `data:`
//! URIs are decoded and embedded at up to the column width; any other image
//! is shown as an `[image: alt]` placeholder.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument};
use unicode_width::UnicodeWidthStr;

use super::ExportError;
use crate::html::{self, Block, BlockKind};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const PT_TO_MM: f32 = 0.3528;
const MM_PER_INCH: f32 = 25.4;
const LINE_SPACING: f32 = 1.4;
/// Helvetica averages a little over half an em per glyph
const AVG_GLYPH_EM: f32 = 0.52;
/// Pixel density assumed for images that carry no size of their own
const SCREEN_DPI: f32 = 96.0;

const BODY_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 15.0;

/// Drawn size of an embedded image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

/// One laid-out row of a page
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Text { text: String, size: f32, bold: bool },
    /// The `index`th image of the document
    Figure { index: usize, size: FigureSize },
    Gap,
}

impl Line {
    fn is_gap(&self) -> bool {
        matches!(self, Line::Gap)
    }

    pub fn height_mm(&self) -> f32 {
        match self {
            Line::Text { size, .. } => size * PT_TO_MM * LINE_SPACING,
            Line::Figure { size, .. } => size.height_mm,
            Line::Gap => BODY_SIZE / 2.0 * PT_TO_MM * LINE_SPACING,
        }
    }
}

fn text_width_mm() -> f32 {
    PAGE_WIDTH_MM - 2.0 * MARGIN_MM
}

fn text_height_mm() -> f32 {
    PAGE_HEIGHT_MM - 2.0 * MARGIN_MM
}

/// Natural size of a `width` x `height` pixel image, shrunk to fit one page
pub fn fit_figure(width: u32, height: u32) -> Option<FigureSize> {
    if width == 0 || height == 0 {
        return None;
    }
    let natural_w = width as f32 * MM_PER_INCH / SCREEN_DPI;
    let natural_h = height as f32 * MM_PER_INCH / SCREEN_DPI;
    let scale = (text_width_mm() / natural_w)
        .min(text_height_mm() / natural_h)
        .min(1.0);
    Some(FigureSize {
        width_mm: natural_w * scale,
        height_mm: natural_h * scale,
    })
}

/// Columns that fit across the text column at a font size
pub fn columns_for(size: f32) -> usize {
    let glyph_mm = size * PT_TO_MM * AVG_GLYPH_EM;
    ((text_width_mm() / glyph_mm) as usize).max(1)
}

/// Greedy word wrap by display width; overlong words are split
pub fn wrap_text(text: &str, max_cols: usize) -> Vec<String> {
    let max_cols = max_cols.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();

        while word.width() > max_cols {
            let split_at = split_index(&word, max_cols);
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word[..split_at].to_string());
            word = word[split_at..].to_string();
        }

        let needed = if current.is_empty() {
            word.width()
        } else {
            current.width() + 1 + word.width()
        };
        if needed > max_cols && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Byte index where the prefix of `word` reaches `max_cols`; always > 0
fn split_index(word: &str, max_cols: usize) -> usize {
    let mut cols = 0;
    for (idx, ch) in word.char_indices() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols && idx > 0 {
            return idx;
        }
        cols += w;
    }
    word.len()
}

/// Turn blocks into wrapped lines with spacing between blocks
///
/// `figures` holds one entry per image block, in order; images without a
/// size are laid out as placeholder text.
pub fn layout(blocks: &[Block], figures: &[Option<FigureSize>]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut image_index = 0;

    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            lines.push(Line::Gap);
        }

        let (size, bold, text) = match block {
            Block::Image { alt, .. } => {
                let index = image_index;
                image_index += 1;
                if let Some(Some(size)) = figures.get(index) {
                    lines.push(Line::Figure { index, size: *size });
                    continue;
                }
                (BODY_SIZE, false, format!("[image: {}]", alt))
            }
            Block::Text(block) => match block.kind {
                BlockKind::Heading => (HEADING_SIZE, true, block.text.clone()),
                BlockKind::Paragraph => (BODY_SIZE, false, block.text.clone()),
                BlockKind::ListItem => (BODY_SIZE, false, format!("- {}", block.text)),
            },
        };

        for text in wrap_text(&to_win_ansi(&text), columns_for(size)) {
            lines.push(Line::Text { text, size, bold });
        }
    }

    lines
}

/// Split lines into pages that fit `page_height_mm`
///
/// Always yields at least one page. Spacing is dropped at the top of a page.
pub fn paginate(lines: Vec<Line>, page_height_mm: f32) -> Vec<Vec<Line>> {
    let mut pages = vec![Vec::new()];
    let mut used = 0.0;

    for line in lines {
        let height = line.height_mm();
        let page_is_empty = pages.last().is_none_or(|page: &Vec<Line>| page.is_empty());

        if line.is_gap() && page_is_empty {
            continue;
        }
        if used + height > page_height_mm && !page_is_empty {
            if line.is_gap() {
                continue;
            }
            pages.push(Vec::new());
            used = 0.0;
        }

        used += height;
        if let Some(page) = pages.last_mut() {
            page.push(line);
        }
    }

    pages
}

/// Render HTML into PDF bytes
pub fn render_pdf(title: &str, html: &str) -> Result<Vec<u8>, ExportError> {
    let blocks = html::blocks(html);
    let images: Vec<Option<DynamicImage>> = blocks
        .iter()
        .filter_map(|block| match block {
            Block::Image { src, .. } => Some(decode_image(src)),
            Block::Text(_) => None,
        })
        .collect();
    let figures: Vec<Option<FigureSize>> = images
        .iter()
        .map(|image| {
            let (width, height) = image.as_ref()?.dimensions();
            fit_figure(width, height)
        })
        .collect();
    let pages = paginate(layout(&blocks, &figures), text_height_mm());

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    for (index, page_lines) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);

        let mut cursor = PAGE_HEIGHT_MM - MARGIN_MM;
        for line in page_lines {
            cursor -= line.height_mm();
            match line {
                Line::Gap => {}
                Line::Text { text, size, bold: is_bold } => {
                    let font: &IndirectFontRef = if *is_bold { &bold } else { &regular };
                    layer.use_text(text.clone(), *size, Mm(MARGIN_MM), Mm(cursor), font);
                }
                Line::Figure { index, size } => {
                    let Some(image) = images.get(*index).and_then(Option::as_ref) else {
                        continue;
                    };
                    let (width_px, _) = image.dimensions();
                    let dpi = width_px as f32 * MM_PER_INCH / size.width_mm;
                    Image::from_dynamic_image(image).add_to_layer(
                        layer.clone(),
                        ImageTransform {
                            translate_x: Some(Mm(MARGIN_MM)),
                            translate_y: Some(Mm(cursor)),
                            dpi: Some(dpi),
                            ..Default::default()
                        },
                    );
                }
            }
        }
    }

    log::debug!(
        "Rendered {} PDF page(s) with {} embedded image(s)",
        pages.len(),
        figures.iter().flatten().count()
    );
    doc.save_to_bytes()
        .map_err(|e| ExportError::Pdf(e.to_string()))
}

/// Decode a base64 `data:` image; anything else is left to the placeholder
fn decode_image(src: &str) -> Option<DynamicImage> {
    let (meta, payload) = src.strip_prefix("data:")?.split_once(',')?;
    if !meta.ends_with(";base64") {
        log::debug!("Skipping non-base64 data URI image");
        return None;
    }
    let bytes = match STANDARD.decode(payload.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Image data is not valid base64: {}", e);
            return None;
        }
    };
    match image_crate::load_from_memory(&bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("Could not decode image for PDF: {}", e);
            None
        }
    }
}

/// Map text onto what the builtin fonts can show
fn to_win_ansi(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '*',
            '\u{00A0}' => ' ',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

#[cfg(test)]
#[path = "pdf_tests.rs"]
mod pdf_tests;
