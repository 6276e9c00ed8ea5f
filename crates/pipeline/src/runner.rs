use extract::{
    ChemicalRecognizer, EntityDecoder, FormulaEntity, FormulaKind, FunctionExtractor,
    NameNormalizer, ReactionExtractor, TokenTagger,
};
use futures::stream::{self, StreamExt};
use ingest::{
    BlockAnnotator, BlockKind, Chunk, ChunkKind, Chunker, LayoutPage, RawOcrAnnotator,
    SourceDocument, TextFormulaCleaner, clean_page, is_blank_formula, new_id,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::PipelineConfig;
use crate::document::DocumentExample;
use crate::error::{ConfigError, DatasetError, PipelineError};
use crate::metrics::{PipelineMetrics, TimedOperation};
use crate::writer::DatasetSink;

/// A document that could not be processed, with enough to find it again.
#[derive(Debug)]
pub struct DocumentFailure {
    /// Position in the input batch
    pub index: usize,
    pub doc_id: String,
    pub source: Option<String>,
    pub error: PipelineError,
}

#[derive(Debug, Default)]
pub struct BatchOutput {
    /// Successful documents, in input order
    pub examples: Vec<DocumentExample>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchOutput {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Pipeline {
    cleaner: TextFormulaCleaner,
    chunker: Chunker,
    min_block_confidence: f32,
    annotator: Arc<dyn BlockAnnotator>,
    recognizer: ChemicalRecognizer,
    reactions: ReactionExtractor,
    functions: FunctionExtractor,
    concurrency: usize,
    metrics: Arc<PipelineMetrics>,
}

/// Context for a formula: the first formula chunk on its page containing the
/// latex, else the page's first chunk, else a fresh id.
fn resolve_context(page_chunks: &[Chunk], latex: &str) -> String {
    page_chunks
        .iter()
        .find(|c| c.kind == ChunkKind::Formula && c.text.contains(latex))
        .or_else(|| page_chunks.first())
        .map(|c| c.id.clone())
        .unwrap_or_else(new_id)
}

impl Pipeline {
    /// Build from a validated configuration with explicit collaborators.
    pub fn new(
        config: &PipelineConfig,
        tagger: Arc<dyn TokenTagger>,
        normalizer: Arc<dyn NameNormalizer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let decoder = EntityDecoder::new(config.label_set()?, normalizer);
        Ok(Self {
            cleaner: config.cleaner(),
            chunker: Chunker::new(config.chunk.clone()),
            min_block_confidence: config.layout.min_block_confidence,
            annotator: Arc::new(RawOcrAnnotator),
            recognizer: ChemicalRecognizer::new(tagger, decoder),
            reactions: config.reaction_extractor()?,
            functions: config.function_extractor()?,
            concurrency: config.batch.concurrency,
            metrics: PipelineMetrics::new(),
        })
    }

    /// Build with the tagger and normalizer the configuration names.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Self::new(config, config.tagger()?, config.normalizer()?)
    }

    pub fn with_annotator(mut self, annotator: Arc<dyn BlockAnnotator>) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Annotate, clean and chunk one page, then register its formulas.
    async fn process_page(
        &self,
        doc_id: &str,
        mut page: LayoutPage,
        example: &mut DocumentExample,
    ) -> Result<(), PipelineError> {
        let dropped = page.retain_confident(self.min_block_confidence);
        if dropped > 0 {
            debug!(doc_id, page = page.page_index, dropped, "Dropped low-confidence blocks");
        }

        let mut page = self
            .annotator
            .annotate(page)
            .await
            .map_err(|source| PipelineError::Annotate {
                doc_id: doc_id.to_string(),
                source,
            })?;
        clean_page(&self.cleaner, &mut page);

        let page_chunks = self.chunker.chunk_page(&page);

        for block in page.blocks.iter().filter(|b| b.kind == BlockKind::Formula) {
            let latex = block.latex_content();
            if is_blank_formula(latex) {
                continue;
            }

            let kind = if self.reactions.is_reaction(latex) {
                FormulaKind::Reaction
            } else {
                FormulaKind::Other
            };
            example.formulas.push(FormulaEntity {
                id: new_id(),
                latex: latex.to_string(),
                context_id: resolve_context(&page_chunks, latex),
                page: page.page_index,
                kind,
            });
        }

        example.chunks.extend(page_chunks);
        Ok(())
    }

    /// Run every stage over one document.
    ///
    /// Chemical recognition starts only once all pages are chunked, and
    /// reaction/function extraction only once every chunk is decoded.
    pub async fn process_document(
        &self,
        document: SourceDocument,
    ) -> Result<DocumentExample, PipelineError> {
        let timer = TimedOperation::start();
        let doc_id = document.doc_id;
        info!(doc_id = %doc_id, pages = document.pages.len(), "Processing document");

        let mut example = DocumentExample::new(doc_id.as_str());

        for page in document.pages {
            self.process_page(&doc_id, page, &mut example).await?;
        }

        for chunk in example.chunks.iter().filter(|c| c.kind.is_decodable()) {
            let entities =
                self.recognizer
                    .recognize(chunk)
                    .await
                    .map_err(|source| PipelineError::Tagger {
                        doc_id: doc_id.clone(),
                        source,
                    })?;
            example.chemicals.extend(entities);
        }

        for formula in &example.formulas {
            if let Some(reaction) = self.reactions.extract(formula, &example.chemicals) {
                example.reactions.push(reaction);
            }
            if let Some(function) = self.functions.extract(formula) {
                example.functions.push(function);
            }
        }

        let elapsed = timer.elapsed();
        self.metrics.record_document(&example, elapsed);
        info!(
            doc_id = %doc_id,
            chunks = example.chunks.len(),
            chemicals = example.chemicals.len(),
            formulas = example.formulas.len(),
            reactions = example.reactions.len(),
            functions = example.functions.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Processed document"
        );
        Ok(example)
    }

    /// Process documents concurrently, keeping input order.
    ///
    /// A failing document is reported in `failures` and does not affect the
    /// others.
    pub async fn process_batch(&self, documents: Vec<SourceDocument>) -> BatchOutput {
        let total = documents.len();
        info!(documents = total, concurrency = self.concurrency, "Processing batch");

        let results: Vec<_> = stream::iter(documents.into_iter().enumerate())
            .map(|(index, document)| async move {
                let doc_id = document.doc_id.clone();
                let source = document.source.clone();
                (index, doc_id, source, self.process_document(document).await)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut output = BatchOutput::default();
        for (index, doc_id, source, result) in results {
            match result {
                Ok(example) => output.examples.push(example),
                Err(err) => {
                    self.metrics.record_failure();
                    error!(index, doc_id = %doc_id, source = ?source, error = %err, "Document failed");
                    output.failures.push(DocumentFailure {
                        index,
                        doc_id,
                        source,
                        error: err,
                    });
                }
            }
        }

        info!(
            documents = total,
            succeeded = output.examples.len(),
            failed = output.failures.len(),
            "Batch complete"
        );
        output
    }

    /// Process a batch and hand the successful records to `sink`.
    pub async fn build_dataset(
        &self,
        documents: Vec<SourceDocument>,
        sink: &dyn DatasetSink,
    ) -> Result<BatchOutput, DatasetError> {
        let output = self.process_batch(documents).await;
        sink.write_examples(&output.examples)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{GazetteerTagger, LabelSet, LookupNormalizer};
    use ingest::Block;

    fn pipeline() -> Pipeline {
        let tagger = GazetteerTagger::new(
            [("A", "MONOMER"), ("B", "MONOMER"), ("C", "POLYMER")],
            &LabelSet::chemical(),
        )
        .unwrap();
        Pipeline::new(
            &PipelineConfig::default(),
            Arc::new(tagger),
            Arc::new(LookupNormalizer::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_context_fallbacks() {
        let paragraph = Chunk::paragraph("text".to_string(), 0, None);
        let formula = Chunk::new("$x = y$".to_string(), 0, ChunkKind::Formula);
        let chunks = vec![paragraph.clone(), formula.clone()];

        assert_eq!(resolve_context(&chunks, "$x = y$"), formula.id);
        assert_eq!(resolve_context(&chunks, "$z$"), paragraph.id);

        let fresh = resolve_context(&[], "$z$");
        assert!(!fresh.is_empty());
        assert_ne!(fresh, resolve_context(&[], "$z$"));
    }

    #[tokio::test]
    async fn test_reaction_formula_end_to_end() {
        let page = LayoutPage::new(
            0,
            vec![
                Block::text("t1", "We mix A and B."),
                Block::formula("f1", r"A + B \rightarrow C"),
            ],
        );

        let example = pipeline()
            .process_document(SourceDocument::new("doc", vec![page]))
            .await
            .unwrap();

        assert_eq!(example.chunks.len(), 2);
        assert_eq!(example.formulas.len(), 1);
        let formula = &example.formulas[0];
        assert_eq!(formula.latex, r"$A + B \rightarrow C$");
        assert_eq!(formula.kind, FormulaKind::Reaction);
        assert_eq!(formula.context_id, example.chunks[1].id);

        assert_eq!(example.reactions.len(), 1);
        let reaction = &example.reactions[0];
        let names = |ids: &[String]| -> Vec<String> {
            ids.iter()
                .map(|id| example.chemical(id).unwrap().text.clone())
                .collect()
        };
        assert_eq!(names(&reaction.reactants), vec!["A", "B"]);
        assert_eq!(names(&reaction.products), vec!["C"]);
        assert_eq!(reaction.formula_id.as_deref(), Some(formula.id.as_str()));
    }

    #[tokio::test]
    async fn test_empty_document() {
        let example = pipeline()
            .process_document(SourceDocument::new("empty", vec![]))
            .await
            .unwrap();

        assert_eq!(example, DocumentExample::new("empty"));
    }
}
