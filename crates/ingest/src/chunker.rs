use crate::chunk::{Chunk, ChunkKind, estimate_tokens};
use crate::cleaner::is_blank_formula;
use crate::page::{BlockKind, LayoutPage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Advisory: a single block larger than this still becomes one chunk.
    pub max_tokens: usize,
    pub keep_formula_with_paragraph: bool,
    pub keep_tables: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            keep_formula_with_paragraph: true,
            keep_tables: true,
        }
    }
}

pub struct Chunker {
    config: ChunkerConfig,
}

/// Paragraph text being accumulated, with the section it started under.
struct Buffer {
    text: String,
    section: Option<String>,
}

impl Buffer {
    fn flush(&mut self, page: usize, chunks: &mut Vec<Chunk>) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        chunks.push(Chunk::paragraph(text, page, self.section.clone()));
    }
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Chunk one page of cleaned blocks.
    ///
    /// Paragraph chunks come first, then one chunk per formula block, then
    /// table chunks, each group in block order.
    pub fn chunk_page(&self, page: &LayoutPage) -> Vec<Chunk> {
        let page_index = page.page_index;
        let mut chunks = Vec::new();

        let mut current_section: Option<String> = None;
        let mut buffer = Buffer {
            text: String::new(),
            section: None,
        };

        for block in &page.blocks {
            match block.kind {
                BlockKind::Title => {
                    let title = block.text_content().trim();
                    if !title.is_empty() {
                        current_section = Some(title.to_string());
                    }
                }
                BlockKind::Text => {
                    let text = block.text_content().trim();
                    if text.is_empty() {
                        continue;
                    }

                    let est_tokens_after = estimate_tokens(&buffer.text) + estimate_tokens(text);
                    if est_tokens_after > self.config.max_tokens && !buffer.text.is_empty() {
                        buffer.flush(page_index, &mut chunks);
                    }

                    if buffer.text.is_empty() {
                        buffer.section = current_section.clone();
                    } else {
                        buffer.text.push(' ');
                    }
                    buffer.text.push_str(text);
                }
                _ => {}
            }
        }
        buffer.flush(page_index, &mut chunks);

        let last_paragraph = chunks.last().map(|c| c.id.clone());

        for block in page.blocks.iter().filter(|b| b.kind == BlockKind::Formula) {
            let latex = block.latex_content();
            if is_blank_formula(latex) {
                continue;
            }

            let mut chunk = Chunk::new(latex.to_string(), page_index, ChunkKind::Formula)
                .with_meta("block_id", block.id.as_str());
            if self.config.keep_formula_with_paragraph {
                if let Some(paragraph_id) = &last_paragraph {
                    chunk = chunk.with_meta("paragraph_id", paragraph_id.as_str());
                }
            }
            chunks.push(chunk);
        }

        if self.config.keep_tables {
            for block in page.blocks.iter().filter(|b| b.kind == BlockKind::Table) {
                let text = block.text_content().trim();
                if text.is_empty() {
                    continue;
                }
                chunks.push(
                    Chunk::new(text.to_string(), page_index, ChunkKind::Table)
                        .with_meta("block_id", block.id.as_str()),
                );
            }
        }

        tracing::debug!(page = page_index, chunks = chunks.len(), "Chunked page");
        chunks
    }
}
