use extract::{ChemicalEntity, FormulaEntity, PropertyFunction, ReactionRelation};
use ingest::Chunk;
use serde::{Deserialize, Serialize};

/// Everything extracted from one source document; one dataset record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentExample {
    pub doc_id: String,
    pub chunks: Vec<Chunk>,
    pub chemicals: Vec<ChemicalEntity>,
    pub formulas: Vec<FormulaEntity>,
    pub reactions: Vec<ReactionRelation>,
    pub functions: Vec<PropertyFunction>,
}

impl DocumentExample {
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            ..Default::default()
        }
    }

    pub fn chunk(&self, id: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.id == id)
    }

    pub fn chemical(&self, id: &str) -> Option<&ChemicalEntity> {
        self.chemicals.iter().find(|c| c.id == id)
    }

    pub fn formula(&self, id: &str) -> Option<&FormulaEntity> {
        self.formulas.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{FormulaKind, Span};
    use ingest::ChunkKind;

    #[test]
    fn test_record_shape() {
        let mut example = DocumentExample::new("doc-1");
        let chunk = Chunk::new("PS".to_string(), 0, ChunkKind::Paragraph);
        example.chemicals.push(ChemicalEntity {
            id: "e-1".into(),
            text: "PS".into(),
            canonical_id: None,
            entity_type: "polymer".into(),
            span: Span { start: 0, end: 2 },
            context_id: chunk.id.clone(),
            page: 0,
        });
        example.formulas.push(FormulaEntity {
            id: "f-1".into(),
            latex: "$x$".into(),
            context_id: chunk.id.clone(),
            page: 0,
            kind: FormulaKind::Other,
        });
        example.chunks.push(chunk);

        let value = serde_json::to_value(&example).unwrap();

        assert_eq!(value["doc_id"], "doc-1");
        assert_eq!(value["chunks"][0]["type"], "paragraph");
        assert!(value["chunks"][0]["section"].is_null());
        assert!(value["chemicals"][0]["canonical_id"].is_null());
        assert_eq!(value["chemicals"][0]["span"]["end"], 2);
        assert_eq!(value["formulas"][0]["type"], "other");
        assert_eq!(value["reactions"], serde_json::json!([]));
        assert_eq!(value["functions"], serde_json::json!([]));
    }

    #[test]
    fn test_lookups_by_id() {
        let mut example = DocumentExample::new("doc-1");
        let chunk = Chunk::new("text".to_string(), 0, ChunkKind::Paragraph);
        let id = chunk.id.clone();
        example.chunks.push(chunk);

        assert_eq!(example.chunk(&id).map(|c| c.text.as_str()), Some("text"));
        assert!(example.chunk("missing").is_none());
        assert!(example.chemical("missing").is_none());
        assert!(example.formula("missing").is_none());
    }
}
