//! Pagination of a [`Document`] onto fixed-size pages.
//!
//! Coordinates are in points with the origin at the top-left corner of the
//! page; the PDF writer flips them.

use super::document::{Block, Document, Section};
use crate::charts::drawable::{status_color, Color};
use crate::charts::PlotType;

const BODY_SIZE: f32 = 10.0;
const CODE_SIZE: f32 = 8.0;
const FOOTER_SIZE: f32 = 8.0;
const LEADING: f32 = 1.35;
const BLOCK_GAP: f32 = 6.0;
const IMAGE_MAX_SHARE: f32 = 0.7;

const TEXT: Color = [17, 24, 39];
const MUTED: Color = [107, 114, 128];
const WARNING_TEXT: Color = [146, 64, 14];
const WARNING_FILL: Color = [254, 243, 199];
const CODE_FILL: Color = [243, 244, 246];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// Footer band kept free at the bottom of every page.
    const FOOTER_BAND: f32 = 20.0;

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin - Self::FOOTER_BAND
    }

    fn bottom(&self) -> f32 {
        self.margin + self.content_height()
    }
}

impl Default for PageGeometry {
    /// US Letter with 0.75in margins.
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin: 54.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
    Mono,
}

impl FontFace {
    /// Average glyph advance as a share of the font size.
    fn advance(&self) -> f32 {
        match self {
            FontFace::Regular => 0.5,
            FontFace::Bold => 0.55,
            FontFace::Mono => 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOp {
    Text {
        x: f32,
        /// Baseline position.
        y: f32,
        size: f32,
        face: FontFace,
        color: Color,
        text: String,
    },
    /// Image number `index` in [`Document::images`] order.
    Image {
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<LayoutOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            LayoutOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Greedy word wrap using average glyph widths. Words longer than a line
/// are split.
pub fn wrap_text(text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let max_chars = ((max_width / (face.advance() * size)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for source_line in text.lines() {
        if face == FontFace::Mono {
            // Keep indentation of preformatted text.
            let chars: Vec<char> = source_line.chars().collect();
            if chars.is_empty() {
                lines.push(String::new());
            }
            for chunk in chars.chunks(max_chars) {
                lines.push(chunk.iter().collect());
            }
            continue;
        }

        let mut current = String::new();
        for word in source_line.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Scales an image down to fit the box, never up.
pub fn fit_image(width: u32, height: u32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let (w, h) = (width as f32, height as f32);
    let scale = (max_width / w).min(max_height / h).min(1.0);
    (w * scale, h * scale)
}

/// Vertical flow element with a known height.
#[derive(Debug, Clone)]
enum Item {
    Line {
        text: String,
        face: FontFace,
        size: f32,
        indent: f32,
        color: Color,
        fill: Option<Color>,
    },
    Image {
        index: usize,
        width: f32,
        height: f32,
    },
    Badge {
        label: String,
        color: Color,
    },
    Gap(f32),
}

impl Item {
    fn height(&self) -> f32 {
        match self {
            Item::Line { size, .. } => size * LEADING,
            Item::Image { height, .. } => *height,
            Item::Badge { .. } => BODY_SIZE * LEADING + 4.0,
            Item::Gap(gap) => *gap,
        }
    }
}

fn heading_size(level: u8) -> f32 {
    match level {
        0 | 1 => 20.0,
        2 => 15.0,
        _ => 12.0,
    }
}

struct FlowBuilder<'a> {
    geometry: &'a PageGeometry,
    image_dims: &'a [Option<(u32, u32)>],
    next_image: usize,
}

impl FlowBuilder<'_> {
    #[allow(clippy::too_many_arguments)]
    fn lines(
        &self,
        items: &mut Vec<Item>,
        text: &str,
        face: FontFace,
        size: f32,
        indent: f32,
        color: Color,
        fill: Option<Color>,
    ) {
        let width = self.geometry.content_width() - indent;
        for line in wrap_text(text, face, size, width) {
            items.push(Item::Line {
                text: line,
                face,
                size,
                indent,
                color,
                fill,
            });
        }
    }

    fn section(&mut self, section: &Section) -> Vec<Item> {
        let mut items = Vec::new();
        for block in &section.blocks {
            self.block(&mut items, block);
            items.push(Item::Gap(BLOCK_GAP));
        }
        items
    }

    fn block(&mut self, items: &mut Vec<Item>, block: &Block) {
        match block {
            Block::Heading { text, level } => {
                self.lines(items, text, FontFace::Bold, heading_size(*level), 0.0, TEXT, None)
            }
            Block::Paragraph { text } => {
                self.lines(items, text, FontFace::Regular, BODY_SIZE, 0.0, TEXT, None)
            }
            Block::KeyValue { key, value } => self.lines(
                items,
                &format!("{}: {}", key, value),
                FontFace::Regular,
                BODY_SIZE,
                0.0,
                TEXT,
                None,
            ),
            Block::Warning { text } => self.lines(
                items,
                text,
                FontFace::Bold,
                BODY_SIZE,
                6.0,
                WARNING_TEXT,
                Some(WARNING_FILL),
            ),
            Block::Badge { status } => items.push(Item::Badge {
                label: status.label().to_string(),
                color: status_color(*status),
            }),
            Block::Image { image } => {
                let index = self.next_image;
                self.next_image += 1;
                match self.image_dims.get(index).copied().flatten() {
                    Some((w, h)) => {
                        let (width, height) = fit_image(
                            w,
                            h,
                            self.geometry.content_width(),
                            self.geometry.content_height() * IMAGE_MAX_SHARE,
                        );
                        items.push(Item::Image {
                            index,
                            width,
                            height,
                        });
                    }
                    None => self.lines(
                        items,
                        &match image.plot_type {
                            PlotType::Placeholder => "[chart image unavailable]".to_string(),
                            plot_type => format!("[{} chart image unavailable]", plot_type),
                        },
                        FontFace::Regular,
                        BODY_SIZE,
                        0.0,
                        MUTED,
                        None,
                    ),
                }
            }
            Block::BulletList { items: bullets } => {
                for bullet in bullets {
                    self.lines(
                        items,
                        &format!("- {}", bullet),
                        FontFace::Regular,
                        BODY_SIZE,
                        12.0,
                        TEXT,
                        None,
                    );
                }
            }
            Block::Code { text } => {
                self.lines(items, text, FontFace::Mono, CODE_SIZE, 4.0, TEXT, Some(CODE_FILL))
            }
        }
    }
}

struct Paginator<'a> {
    geometry: &'a PageGeometry,
    pages: Vec<Page>,
    cursor: f32,
}

impl Paginator<'_> {
    fn remaining(&self) -> f32 {
        self.geometry.bottom() - self.cursor
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().map(|p| p.ops.is_empty()).unwrap_or(true)
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = self.geometry.margin;
    }

    fn place(&mut self, item: Item) {
        let height = item.height();
        if let Item::Gap(_) = item {
            // Gaps never start a page.
            if !self.page_is_empty() {
                self.cursor += height;
            }
            return;
        }
        if height > self.remaining() && !self.page_is_empty() {
            self.new_page();
        }

        let x0 = self.geometry.margin;
        let top = self.cursor;
        let content_width = self.geometry.content_width();
        let Some(page) = self.pages.last_mut() else {
            return;
        };

        match item {
            Item::Line {
                text,
                face,
                size,
                indent,
                color,
                fill,
            } => {
                if let Some(fill) = fill {
                    page.ops.push(LayoutOp::Rect {
                        x: x0,
                        y: top,
                        width: content_width,
                        height,
                        color: fill,
                    });
                }
                page.ops.push(LayoutOp::Text {
                    x: x0 + indent,
                    y: top + size,
                    size,
                    face,
                    color,
                    text,
                });
            }
            Item::Image {
                index,
                width,
                height,
            } => page.ops.push(LayoutOp::Image {
                index,
                x: x0,
                y: top,
                width,
                height,
            }),
            Item::Badge { label, color } => {
                let width = label.chars().count() as f32 * FontFace::Bold.advance() * BODY_SIZE + 12.0;
                page.ops.push(LayoutOp::Rect {
                    x: x0,
                    y: top,
                    width,
                    height,
                    color,
                });
                page.ops.push(LayoutOp::Text {
                    x: x0 + 6.0,
                    y: top + BODY_SIZE + 2.0,
                    size: BODY_SIZE,
                    face: FontFace::Bold,
                    color: [255, 255, 255],
                    text: label,
                });
            }
            Item::Gap(_) => {}
        }
        self.cursor += height;
    }
}

/// Lays the document out on pages. `image_dims` holds the pixel size of
/// each image in [`Document::images`] order, or `None` when the image could
/// not be decoded; those are replaced by a text line.
pub fn layout(
    document: &Document,
    image_dims: &[Option<(u32, u32)>],
    geometry: &PageGeometry,
) -> Vec<Page> {
    let mut builder = FlowBuilder {
        geometry,
        image_dims,
        next_image: 0,
    };
    let mut paginator = Paginator {
        geometry,
        pages: Vec::new(),
        cursor: geometry.margin,
    };
    paginator.new_page();

    for section in &document.sections {
        let items = builder.section(section);
        let height: f32 = items.iter().map(Item::height).sum();

        if !paginator.page_is_empty() {
            let fits_on_fresh_page = height <= geometry.content_height();
            if section.page_break_before
                || (section.keep_together && fits_on_fresh_page && height > paginator.remaining())
            {
                paginator.new_page();
            }
        }

        for item in items {
            paginator.place(item);
        }
    }

    let mut pages = paginator.pages;
    let total = pages.len();
    for (n, page) in pages.iter_mut().enumerate() {
        let label = format!("Page {} of {}", n + 1, total);
        let width = label.chars().count() as f32 * FontFace::Regular.advance() * FOOTER_SIZE;
        page.ops.push(LayoutOp::Text {
            x: geometry.width - geometry.margin - width,
            y: geometry.height - geometry.margin,
            size: FOOTER_SIZE,
            face: FontFace::Regular,
            color: MUTED,
            text: label,
        });
    }
    pages
}
