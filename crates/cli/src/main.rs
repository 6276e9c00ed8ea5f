use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ingest::{DocumentReader, SourceDocument};
use pipeline::{JsonlDatasetWriter, Pipeline, PipelineConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "polymer-dataset",
    about = "Build chemistry training records from OCR'd papers",
    version
)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process documents into a JSONL dataset
    Run {
        /// Document JSON file, or a directory searched recursively
        #[arg(short, long)]
        input: PathBuf,
        /// Output dataset (.jsonl)
        #[arg(short, long)]
        output: PathBuf,
        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Lexicon for the offline tagger: {"term": "ENTITY_TYPE"}
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// Canonical id dictionary: {"surface name": "canonical id"}
        #[arg(long)]
        dictionary: Option<PathBuf>,
        /// Remote tagger base URL; overrides the lexicon
        #[arg(long)]
        tagger_endpoint: Option<String>,
        #[arg(long)]
        max_tokens: Option<usize>,
        /// Documents processed at once
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Print the effective configuration as TOML
    ShowConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {:?}", path)),
        None => Ok(PipelineConfig::default()),
    }
}

/// Documents under `input`, plus the number of files that could not be read.
async fn read_documents(input: &Path) -> Result<(Vec<SourceDocument>, usize)> {
    if input.is_file() {
        let document = DocumentReader::read_file(input).await?;
        return Ok((vec![document], 0));
    }

    let mut documents = Vec::new();
    let mut unreadable = 0;
    for (path, result) in DocumentReader::read_directory(input).await? {
        match result {
            Ok(document) => documents.push(document),
            Err(e) => {
                unreadable += 1;
                error!(path = ?path, error = %format!("{e:#}"), "Failed to read document");
            }
        }
    }
    Ok((documents, unreadable))
}

#[allow(clippy::too_many_arguments)]
async fn run(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    lexicon: Option<PathBuf>,
    dictionary: Option<PathBuf>,
    tagger_endpoint: Option<String>,
    max_tokens: Option<usize>,
    concurrency: Option<usize>,
) -> Result<bool> {
    let mut config = load_config(config)?;
    if lexicon.is_some() {
        config.ner.lexicon_path = lexicon;
    }
    if dictionary.is_some() {
        config.normalizer.dictionary_path = dictionary;
    }
    if tagger_endpoint.is_some() {
        config.ner.endpoint = tagger_endpoint;
    }
    if let Some(max_tokens) = max_tokens {
        config.chunk.max_tokens = max_tokens;
    }
    if let Some(concurrency) = concurrency {
        config.batch.concurrency = concurrency;
    }

    let pipeline = Pipeline::from_config(&config).context("Invalid pipeline configuration")?;

    let (documents, unreadable) = read_documents(input).await?;
    info!(input = ?input, documents = documents.len(), unreadable, "Loaded documents");

    let sink = JsonlDatasetWriter::new(output);
    let batch = pipeline.build_dataset(documents, &sink).await?;

    let snapshot = pipeline.metrics().snapshot();
    info!(
        metrics = %serde_json::to_string(&snapshot)?,
        output = ?output,
        "Dataset complete"
    );

    for failure in &batch.failures {
        error!(
            doc_id = %failure.doc_id,
            source = ?failure.source,
            error = %failure.error,
            "Document skipped"
        );
    }

    Ok(batch.is_complete() && unreadable == 0)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            config,
            lexicon,
            dictionary,
            tagger_endpoint,
            max_tokens,
            concurrency,
        } => {
            run(
                &input,
                &output,
                config.as_deref(),
                lexicon,
                dictionary,
                tagger_endpoint,
                max_tokens,
                concurrency,
            )
            .await
        }
        Commands::ShowConfig { config } => load_config(config.as_deref())
            .and_then(|c| Ok(c.to_toml_string()?))
            .map(|rendered| {
                println!("{rendered}");
                true
            }),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{e:#}"), "polymer-dataset failed");
            ExitCode::FAILURE
        }
    }
}
