use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Paragraph,
    Formula,
    Table,
}

impl ChunkKind {
    /// Chunk kinds that go through chemical-entity recognition.
    pub fn is_decodable(self) -> bool {
        matches!(self, Self::Paragraph | Self::Formula)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub page: usize,
    pub section: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl Chunk {
    pub fn new(text: String, page: usize, kind: ChunkKind) -> Self {
        Self {
            id: new_id(),
            text,
            page,
            section: None,
            kind,
            meta: BTreeMap::new(),
        }
    }

    pub fn paragraph(text: String, page: usize, section: Option<String>) -> Self {
        Self {
            section,
            ..Self::new(text, page, ChunkKind::Paragraph)
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    /// Whitespace-split token estimate used for chunk budgeting
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.text)
    }

    /// Length of `text` in characters; span offsets are measured in these.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Opaque, never-reused record identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_json_shape() {
        let chunk = Chunk::new("$x$".into(), 2, ChunkKind::Formula).with_meta("block_id", "p2_b0");
        let value = serde_json::to_value(&chunk).unwrap();

        assert_eq!(value["type"], "formula");
        assert_eq!(value["section"], serde_json::Value::Null);
        assert_eq!(value["meta"]["block_id"], "p2_b0");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Chunk::new("a".into(), 0, ChunkKind::Paragraph);
        let b = Chunk::new("a".into(), 0, ChunkKind::Paragraph);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_estimated_tokens() {
        let chunk = Chunk::paragraph("alpha  beta\ngamma".into(), 0, None);
        assert_eq!(chunk.estimated_tokens(), 3);
        assert_eq!(chunk.char_len(), 17);
    }
}
