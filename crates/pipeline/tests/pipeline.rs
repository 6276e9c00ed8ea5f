use async_trait::async_trait;
use extract::{FormulaKind, GazetteerTagger, LabelSet, LookupNormalizer};
use ingest::{AnnotateError, Block, BlockAnnotator, BlockKind, ChunkKind, LayoutPage, SourceDocument};
use pipeline::{
    DatasetSink, DocumentExample, JsonlDatasetWriter, Pipeline, PipelineConfig, PipelineError,
    read_jsonl,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.chunk.max_tokens = 12;
    config
}

fn pipeline_with(config: &PipelineConfig) -> Pipeline {
    let tagger = GazetteerTagger::new(
        [
            ("styrene", "MONOMER"),
            ("methyl methacrylate", "MONOMER"),
            ("polystyrene", "POLYMER"),
            ("PS", "POLYMER"),
            ("St", "MONOMER"),
            ("AIBN", "ADDITIVE"),
        ],
        &LabelSet::chemical(),
    )
    .unwrap();
    let normalizer = LookupNormalizer::from_entries([
        ("styrene", "C=Cc1ccccc1"),
        ("AIBN", "CC(C)(C#N)N=NC(C)(C)C#N"),
    ]);
    Pipeline::new(config, Arc::new(tagger), Arc::new(normalizer)).unwrap()
}

fn paper(doc_id: &str) -> SourceDocument {
    let page0 = LayoutPage::new(
        0,
        vec![
            Block::new("t0", BlockKind::Title).with_raw_ocr("Synthesis"),
            Block::text(
                "b0",
                "Styrene was polymerized with AIBN   at 70 C.\nPage 3 of 12",
            ),
            Block::text("b1", "The resulting polystyrene was washed in methanol."),
            Block::formula("f0", r"St \rightarrow PS"),
            Block::text("noise", "stray caption").with_confidence(0.1),
        ],
    );
    let page1 = LayoutPage::new(
        1,
        vec![
            Block::text("b2", "The glass transition of PS was measured."),
            Block::formula("f1", r"T_g = \mathrm{f}(M_n)"),
            Block::formula("f2", "$  $"),
            Block::new("tab", BlockKind::Table).with_raw_ocr("Sample | T_g"),
        ],
    );
    SourceDocument::new(doc_id, vec![page0, page1])
}

#[tokio::test]
async fn test_document_record() {
    let example = pipeline_with(&config())
        .process_document(paper("paper-1"))
        .await
        .unwrap();

    assert_eq!(example.doc_id, "paper-1");

    let kinds: Vec<_> = example.chunks.iter().map(|c| (c.page, c.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (0, ChunkKind::Paragraph),
            (0, ChunkKind::Paragraph),
            (0, ChunkKind::Formula),
            (1, ChunkKind::Paragraph),
            (1, ChunkKind::Formula),
            (1, ChunkKind::Table),
        ]
    );
    assert_eq!(
        example.chunks[0].text,
        "Styrene was polymerized with AIBN at 70 C."
    );
    assert_eq!(example.chunks[0].section.as_deref(), Some("Synthesis"));
    assert!(example.chunks.iter().all(|c| c.text != "stray caption"));

    // Blank formula "$  $" is dropped
    assert_eq!(example.formulas.len(), 2);
    assert_eq!(example.formulas[0].kind, FormulaKind::Reaction);
    assert_eq!(example.formulas[0].latex, r"$St \rightarrow PS$");
    assert_eq!(example.formulas[0].context_id, example.chunks[2].id);
    assert_eq!(example.formulas[1].kind, FormulaKind::Other);
    assert_eq!(example.formulas[1].latex, r"$T_g = \text{f}(M_n)$");
    assert_eq!(example.formulas[1].context_id, example.chunks[4].id);

    let styrene = example
        .chemicals
        .iter()
        .find(|c| c.text == "Styrene")
        .unwrap();
    assert_eq!(styrene.entity_type, "monomer");
    assert_eq!(styrene.canonical_id.as_deref(), Some("C=Cc1ccccc1"));
    assert_eq!(styrene.context_id, example.chunks[0].id);

    // Table chunks are never tagged
    let table_id = &example.chunks[5].id;
    assert!(example.chemicals.iter().all(|c| &c.context_id != table_id));

    assert_eq!(example.reactions.len(), 1);
    let reaction = &example.reactions[0];
    let reactants: Vec<_> = reaction
        .reactants
        .iter()
        .map(|id| example.chemical(id).unwrap().text.as_str())
        .collect();
    let products: Vec<_> = reaction
        .products
        .iter()
        .map(|id| example.chemical(id).unwrap().text.as_str())
        .collect();
    assert_eq!(reactants, vec!["St"]);
    assert_eq!(products, vec!["PS"]);

    assert_eq!(example.functions.len(), 1);
    let function = &example.functions[0];
    assert_eq!(function.target_property, "T_g");
    assert_eq!(function.formula_id, example.formulas[1].id);
    assert_eq!(function.context_id, example.formulas[1].context_id);
    // Macro names are matched letter by letter
    let expected: BTreeSet<String> = ["t", "e", "x", "f", "M_n"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(function.variables, expected);
}

#[tokio::test]
async fn test_ids_unique_and_spans_in_bounds() {
    let example = pipeline_with(&config())
        .process_document(paper("paper-2"))
        .await
        .unwrap();

    let chunk_ids: HashSet<_> = example.chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(chunk_ids.len(), example.chunks.len());

    let mut ids = HashSet::new();
    for id in example
        .chemicals
        .iter()
        .map(|c| &c.id)
        .chain(example.formulas.iter().map(|f| &f.id))
        .chain(example.reactions.iter().map(|r| &r.id))
        .chain(example.functions.iter().map(|f| &f.id))
    {
        assert!(ids.insert(id.clone()), "duplicate id {id}");
    }

    for entity in &example.chemicals {
        let chunk = example.chunk(&entity.context_id).unwrap();
        assert!(entity.span.start <= entity.span.end);
        assert!(entity.span.end <= chunk.text.chars().count());
        assert_eq!(entity.page, chunk.page);
    }
}

#[tokio::test]
async fn test_lone_formula_anchors_to_its_own_chunk() {
    let page = LayoutPage::new(0, vec![Block::formula("f", "x")]);

    let example = pipeline_with(&config())
        .process_document(SourceDocument::new("d", vec![page]))
        .await
        .unwrap();

    assert_eq!(example.chunks.len(), 1);
    assert_eq!(example.chunks[0].text, "$x$");
    assert_eq!(example.formulas[0].context_id, example.chunks[0].id);
}

struct FailingAnnotator {
    fail_on_page: usize,
}

#[async_trait]
impl BlockAnnotator for FailingAnnotator {
    async fn annotate(&self, page: LayoutPage) -> Result<LayoutPage, AnnotateError> {
        if page.page_index == self.fail_on_page {
            return Err(AnnotateError::Recognizer {
                page: page.page_index,
                message: "math model crashed".to_string(),
            });
        }
        Ok(page)
    }
}

#[tokio::test]
async fn test_annotator_failure_aborts_document() {
    let pipeline =
        pipeline_with(&config()).with_annotator(Arc::new(FailingAnnotator { fail_on_page: 1 }));

    let err = pipeline.process_document(paper("broken")).await.unwrap_err();

    assert!(matches!(err, PipelineError::Annotate { .. }));
    assert_eq!(err.doc_id(), "broken");
}

struct FailOnDoc(&'static str);

#[async_trait]
impl BlockAnnotator for FailOnDoc {
    async fn annotate(&self, page: LayoutPage) -> Result<LayoutPage, AnnotateError> {
        let poisoned = page
            .blocks
            .iter()
            .any(|b| b.text_content().contains(self.0));
        if poisoned {
            return Err(AnnotateError::Unavailable("ocr service down".to_string()));
        }
        Ok(page)
    }
}

#[tokio::test]
async fn test_batch_keeps_order_and_reports_failures() {
    let mut config = config();
    config.batch.concurrency = 2;
    let pipeline = pipeline_with(&config).with_annotator(Arc::new(FailOnDoc("POISON")));

    let mut bad = SourceDocument::new(
        "bad",
        vec![LayoutPage::new(0, vec![Block::text("x", "POISON")])],
    );
    bad.source = Some("papers/bad.json".to_string());

    let documents = vec![paper("first"), bad, SourceDocument::new("empty", vec![]), paper("last")];
    let output = pipeline.process_batch(documents).await;

    let ids: Vec<_> = output.examples.iter().map(|e| e.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "empty", "last"]);
    assert!(!output.is_complete());

    assert_eq!(output.failures.len(), 1);
    let failure = &output.failures[0];
    assert_eq!(failure.index, 1);
    assert_eq!(failure.doc_id, "bad");
    assert_eq!(failure.source.as_deref(), Some("papers/bad.json"));

    // An empty document is a valid, empty record
    assert_eq!(output.examples[1], DocumentExample::new("empty"));

    let snapshot = pipeline.metrics().snapshot();
    assert_eq!(snapshot.documents_processed, 3);
    assert_eq!(snapshot.documents_failed, 1);
}

#[tokio::test]
async fn test_dataset_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset/train.jsonl");
    let sink = JsonlDatasetWriter::new(&path);
    let pipeline = pipeline_with(&config());

    let output = pipeline
        .build_dataset(vec![paper("a"), paper("b")], &sink)
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
    for line in content.lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        for key in ["doc_id", "chunks", "chemicals", "formulas", "reactions", "functions"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    let parsed = read_jsonl(&path).unwrap();
    assert_eq!(parsed, output.examples);
}

struct CountingSink(std::sync::Mutex<usize>);

impl DatasetSink for CountingSink {
    fn write_examples(&self, examples: &[DocumentExample]) -> Result<usize, pipeline::DatasetError> {
        *self.0.lock().unwrap() += examples.len();
        Ok(examples.len())
    }
}

#[tokio::test]
async fn test_build_dataset_writes_only_successes() {
    let pipeline = pipeline_with(&config()).with_annotator(Arc::new(FailOnDoc("POISON")));
    let sink = CountingSink(std::sync::Mutex::new(0));
    let bad = SourceDocument::new(
        "bad",
        vec![LayoutPage::new(0, vec![Block::text("x", "POISON")])],
    );

    let output = pipeline
        .build_dataset(vec![paper("ok"), bad], &sink)
        .await
        .unwrap();

    assert_eq!(output.examples.len(), 1);
    assert_eq!(*sink.0.lock().unwrap(), 1);
}

#[test]
fn test_config_file_drives_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.toml");
    std::fs::write(
        &path,
        r#"
        [chunk]
        max_tokens = 3

        [layout]
        min_block_confidence = 0.9

        [batch]
        concurrency = 1
        "#,
    )
    .unwrap();

    let config = PipelineConfig::from_toml_file(&path).unwrap();
    assert_eq!(config.chunk.max_tokens, 3);
    assert_eq!(config.layout.min_block_confidence, 0.9);
    assert!(Pipeline::from_config(&config).is_ok());
}
