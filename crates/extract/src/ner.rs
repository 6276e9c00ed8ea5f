use ingest::Chunk;
use std::sync::Arc;

use crate::decoder::EntityDecoder;
use crate::error::TaggerError;
use crate::schema::ChemicalEntity;
use crate::tagger::TokenTagger;

/// Chemical named-entity recognition over chunks: tag, then decode.
pub struct ChemicalRecognizer {
    tagger: Arc<dyn TokenTagger>,
    decoder: EntityDecoder,
}

impl ChemicalRecognizer {
    pub fn new(tagger: Arc<dyn TokenTagger>, decoder: EntityDecoder) -> Self {
        Self { tagger, decoder }
    }

    pub fn decoder(&self) -> &EntityDecoder {
        &self.decoder
    }

    pub async fn recognize(&self, chunk: &Chunk) -> Result<Vec<ChemicalEntity>, TaggerError> {
        if chunk.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tagged = self.tagger.tag(&chunk.text).await?;
        let entities = self.decoder.decode(
            &chunk.text,
            &tagged.labels,
            &tagged.offsets,
            chunk.page,
            &chunk.id,
        );

        tracing::debug!(
            chunk_id = %chunk.id,
            tokens = tagged.len(),
            entities = entities.len(),
            "Decoded chunk"
        );
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelSet;
    use crate::normalizer::LookupNormalizer;
    use crate::tagger::{GazetteerTagger, TaggedText};
    use async_trait::async_trait;
    use ingest::ChunkKind;

    struct Unreachable;

    #[async_trait]
    impl TokenTagger for Unreachable {
        async fn tag(&self, _text: &str) -> Result<TaggedText, TaggerError> {
            Err(TaggerError::Status(500))
        }
    }

    fn decoder() -> EntityDecoder {
        EntityDecoder::new(
            LabelSet::chemical(),
            Arc::new(LookupNormalizer::from_entries([("styrene", "C=Cc1ccccc1")])),
        )
    }

    #[tokio::test]
    async fn test_recognize_with_gazetteer() {
        let tagger = GazetteerTagger::new(
            [("styrene", "MONOMER"), ("polystyrene", "POLYMER")],
            &LabelSet::chemical(),
        )
        .unwrap();
        let recognizer = ChemicalRecognizer::new(Arc::new(tagger), decoder());
        let chunk = Chunk::new(
            "Styrene gives polystyrene.".to_string(),
            1,
            ChunkKind::Paragraph,
        );

        let entities = recognizer.recognize(&chunk).await.unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].text, "Styrene");
        assert_eq!(entities[0].entity_type, "monomer");
        assert_eq!(entities[0].canonical_id.as_deref(), Some("C=Cc1ccccc1"));
        assert_eq!((entities[1].span.start, entities[1].span.end), (14, 25));
        assert!(entities.iter().all(|e| e.context_id == chunk.id && e.page == 1));
    }

    #[tokio::test]
    async fn test_blank_chunk_skips_tagger() {
        let recognizer = ChemicalRecognizer::new(Arc::new(Unreachable), decoder());
        let chunk = Chunk::new("   ".to_string(), 0, ChunkKind::Paragraph);

        assert!(recognizer.recognize(&chunk).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tagger_failure_propagates() {
        let recognizer = ChemicalRecognizer::new(Arc::new(Unreachable), decoder());
        let chunk = Chunk::new("styrene".to_string(), 0, ChunkKind::Paragraph);

        assert!(matches!(
            recognizer.recognize(&chunk).await,
            Err(TaggerError::Status(500))
        ));
    }
}
