use ingest::new_id;
use std::sync::Arc;

use crate::labels::{Label, LabelSet};
use crate::normalizer::NameNormalizer;
use crate::schema::{ChemicalEntity, Span};

/// Turns per-token BIO predictions into chemical-entity spans.
pub struct EntityDecoder {
    labels: LabelSet,
    normalizer: Arc<dyn NameNormalizer>,
}

/// Char-offset view over a text, for slicing by character positions.
struct CharIndex<'a> {
    text: &'a str,
    /// Byte offset of every char boundary, including the end of the text.
    boundaries: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Slice by char offsets. `end` is clamped to the text; tokens left
    /// empty by that are rejected.
    fn slice(&self, start: usize, end: usize) -> Option<(usize, &'a str)> {
        let end = end.min(self.char_len());
        if start >= end {
            return None;
        }
        let from = *self.boundaries.get(start)?;
        let to = *self.boundaries.get(end)?;
        Some((end, self.text.get(from..to)?))
    }
}

impl EntityDecoder {
    pub fn new(labels: LabelSet, normalizer: Arc<dyn NameNormalizer>) -> Self {
        Self { labels, normalizer }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn open_span(
        &self,
        surface: &str,
        entity_type: &str,
        (start, end): (usize, usize),
        page: usize,
        context_id: &str,
    ) -> ChemicalEntity {
        let normalized = self.normalizer.normalize(surface);
        ChemicalEntity {
            id: new_id(),
            text: surface.to_string(),
            canonical_id: normalized.canonical_id,
            entity_type: entity_type.to_lowercase(),
            span: Span { start, end },
            context_id: context_id.to_string(),
            page,
        }
    }

    /// Decode one chunk's tagger output.
    ///
    /// `offsets` are character offsets into `text`; `(0, 0)` marks special
    /// tokens, which are skipped without closing an open span. Every other
    /// token goes through its label, even when it covers no text: `O` still
    /// closes the open span, and `B-` closes it without opening a new one.
    /// Spans come out left to right and never overlap.
    pub fn decode(
        &self,
        text: &str,
        labels: &[u32],
        offsets: &[(usize, usize)],
        page: usize,
        context_id: &str,
    ) -> Vec<ChemicalEntity> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let index = CharIndex::new(text);
        let mut entities = Vec::new();
        let mut current: Option<ChemicalEntity> = None;

        for (&label_id, &(start, end)) in labels.iter().zip(offsets) {
            if start == 0 && end == 0 {
                continue;
            }

            let (etype, extends) = match self.labels.get(label_id) {
                Label::Outside => {
                    entities.extend(current.take());
                    continue;
                }
                Label::Inside(etype) => {
                    let matches = current
                        .as_ref()
                        .is_some_and(|open| open.entity_type == etype.to_lowercase());
                    (etype, matches)
                }
                Label::Begin(etype) => (etype, false),
            };

            // Zero-width or out-of-range tokens carry no text to add
            let Some((end, span_text)) = index.slice(start, end) else {
                tracing::debug!(
                    start,
                    end,
                    text_len = index.char_len(),
                    context_id,
                    "Token has no text in chunk"
                );
                if !extends {
                    entities.extend(current.take());
                }
                continue;
            };

            if extends {
                if let Some(open) = current.as_mut() {
                    open.text.push_str(span_text);
                    open.span.end = end;
                }
                continue;
            }

            // I- without a matching open span starts a new one
            entities.extend(current.take());
            current = Some(self.open_span(span_text, etype, (start, end), page, context_id));
        }

        entities.extend(current);
        entities
    }
}
