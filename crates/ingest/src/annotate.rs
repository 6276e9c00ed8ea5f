use async_trait::async_trait;
use thiserror::Error;

use crate::page::{BlockKind, LayoutPage};

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("Recognizer failed on page {page}: {message}")]
    Recognizer { page: usize, message: String },
    #[error("Recognizer unavailable: {0}")]
    Unavailable(String),
}

/// OCR and math recognition over the blocks of one layout page.
///
/// Implementations fill `normalized_text` for text-like blocks and `latex`
/// for formula blocks. An error aborts the document being processed.
#[async_trait]
pub trait BlockAnnotator: Send + Sync {
    async fn annotate(&self, page: LayoutPage) -> Result<LayoutPage, AnnotateError>;
}

/// Uses the OCR text the layout stage already attached to each block.
/// Existing annotations are left as they are.
#[derive(Debug, Default, Clone)]
pub struct RawOcrAnnotator;

#[async_trait]
impl BlockAnnotator for RawOcrAnnotator {
    async fn annotate(&self, mut page: LayoutPage) -> Result<LayoutPage, AnnotateError> {
        for block in &mut page.blocks {
            let raw = block.raw_ocr.clone().unwrap_or_default();
            match block.kind {
                BlockKind::Text | BlockKind::Table | BlockKind::Title => {
                    block.normalized_text.get_or_insert(raw);
                }
                BlockKind::Formula => {
                    block.latex.get_or_insert(raw);
                }
                BlockKind::Figure | BlockKind::Other => {}
            }
        }
        Ok(page)
    }
}
