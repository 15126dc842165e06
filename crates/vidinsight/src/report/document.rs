//! Format-independent report document model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::capture::CapturedChartImage;
use crate::charts::ChartStatus;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Cover,
    Metrics,
    Chart,
    Summary,
    RawData,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { text: String, level: u8 },
    Paragraph { text: String },
    KeyValue { key: String, value: String },
    /// Highlighted notice shown as a banner.
    Warning { text: String },
    Badge { status: ChartStatus },
    Image { image: CapturedChartImage },
    BulletList { items: Vec<String> },
    /// Preformatted monospace text.
    Code { text: String },
}

impl Block {
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Block::Heading {
            text: text.into(),
            level,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph { text: text.into() }
    }

    pub fn key_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Block::KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Text content of the block, one entry per visible line of source text.
    fn text_parts(&self) -> Vec<String> {
        match self {
            Block::Heading { text, .. }
            | Block::Paragraph { text }
            | Block::Warning { text }
            | Block::Code { text } => vec![text.clone()],
            Block::KeyValue { key, value } => vec![format!("{}: {}", key, value)],
            Block::Badge { status } => vec![status.label().to_string()],
            Block::Image { image } => vec![format!("[chart image: {}]", image.title)],
            Block::BulletList { items } => items.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub blocks: Vec<Block>,
    /// Start this section on a fresh page.
    pub page_break_before: bool,
    /// Avoid splitting this section across pages when it fits on one.
    pub keep_together: bool,
}

impl Section {
    pub fn new(kind: SectionKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            blocks: Vec::new(),
            page_break_before: false,
            keep_together: false,
        }
    }

    pub fn page_break(mut self) -> Self {
        self.page_break_before = true;
        self
    }

    pub fn keep_together(mut self) -> Self {
        self.keep_together = true;
        self
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn images(&self) -> impl Iterator<Item = &CapturedChartImage> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Image { image } => Some(image),
            _ => None,
        })
    }
}

/// A fully assembled report.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub title: String,
    pub analysis_id: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// Every embedded image, in document order.
    pub fn images(&self) -> impl Iterator<Item = &CapturedChartImage> {
        self.sections.iter().flat_map(|s| s.images())
    }

    /// All visible text, one line per text element.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        for section in &self.sections {
            for block in &section.blocks {
                lines.extend(block.text_parts());
            }
        }
        lines.join("\n")
    }
}
