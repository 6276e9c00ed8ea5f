use serde::{Deserialize, Serialize};

/// Layout block category as reported by the layout detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Formula,
    Table,
    Figure,
    Title,
    #[serde(other)]
    Other,
}

/// One region of a rendered page, with whatever OCR output is attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub bbox: [f32; 4], // [x1, y1, x2, y2]
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_ocr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            bbox: [0.0; 4],
            kind,
            confidence: None,
            raw_ocr: None,
            normalized_text: None,
            latex: None,
            image_path: None,
        }
    }

    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut block = Self::new(id, BlockKind::Text);
        block.normalized_text = Some(text.into());
        block
    }

    pub fn formula(id: impl Into<String>, latex: impl Into<String>) -> Self {
        let mut block = Self::new(id, BlockKind::Formula);
        block.latex = Some(latex.into());
        block
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_raw_ocr(mut self, raw: impl Into<String>) -> Self {
        self.raw_ocr = Some(raw.into());
        self
    }

    /// Annotated text for text-like blocks, empty when OCR produced nothing.
    pub fn text_content(&self) -> &str {
        self.normalized_text.as_deref().unwrap_or("")
    }

    pub fn latex_content(&self) -> &str {
        self.latex.as_deref().unwrap_or("")
    }
}

/// Blocks of one rendered page, in layout reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    pub page_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl LayoutPage {
    pub fn new(page_index: usize, blocks: Vec<Block>) -> Self {
        Self {
            page_index,
            image_path: None,
            blocks,
        }
    }

    /// Drop blocks the layout detector was not confident about.
    /// Blocks without a score are kept.
    pub fn retain_confident(&mut self, min_confidence: f32) -> usize {
        let before = self.blocks.len();
        self.blocks
            .retain(|b| b.confidence.is_none_or(|c| c >= min_confidence));
        before - self.blocks.len()
    }
}

/// A source document after layout detection: ordered pages, indexed from 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub pages: Vec<LayoutPage>,
}

impl SourceDocument {
    pub fn new(doc_id: impl Into<String>, pages: Vec<LayoutPage>) -> Self {
        Self {
            doc_id: doc_id.into(),
            source: None,
            pages,
        }
    }
}
