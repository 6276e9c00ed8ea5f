pub mod annotate;
pub mod chunk;
pub mod chunker;
pub mod cleaner;
pub mod page;
pub mod reader;

pub use annotate::{AnnotateError, BlockAnnotator, RawOcrAnnotator};
pub use chunk::{Chunk, ChunkKind, estimate_tokens, new_id};
pub use chunker::{Chunker, ChunkerConfig};
pub use cleaner::{TextFormulaCleaner, formula_body, is_blank_formula};
pub use page::{Block, BlockKind, LayoutPage, SourceDocument};
pub use reader::DocumentReader;

use sha2::{Digest, Sha256};

/// Generate a stable document ID from file path
pub fn generate_doc_id(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Clean every block of a page in place: OCR text for text-like blocks,
/// LaTeX for formula blocks.
pub fn clean_page(cleaner: &TextFormulaCleaner, page: &mut LayoutPage) {
    for block in &mut page.blocks {
        match block.kind {
            BlockKind::Text | BlockKind::Table | BlockKind::Title => {
                let raw = block.normalized_text.as_deref().unwrap_or("");
                block.normalized_text = Some(cleaner.clean_text(raw));
            }
            BlockKind::Formula => {
                let raw = block.latex.as_deref().unwrap_or("");
                block.latex = Some(cleaner.clean_latex(raw));
            }
            BlockKind::Figure | BlockKind::Other => {}
        }
    }
}
