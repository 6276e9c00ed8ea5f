use extract::{TaggerError, VocabError};
use ingest::AnnotateError;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid configuration, raised when components are built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chunk.max_tokens must be greater than zero")]
    ZeroTokenBudget,
    #[error("batch.concurrency must be greater than zero")]
    ZeroConcurrency,
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f32 },
    #[error("Invalid vocabulary: {0}")]
    Vocab(#[from] VocabError),
    #[error("Invalid tagger setup: {0}")]
    Tagger(#[from] TaggerError),
    #[error("Failed to load {what}: {message}")]
    Resource { what: &'static str, message: String },
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// A collaborator failure that aborted one document.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Document {doc_id}: block annotation failed: {source}")]
    Annotate {
        doc_id: String,
        #[source]
        source: AnnotateError,
    },
    #[error("Document {doc_id}: entity tagging failed: {source}")]
    Tagger {
        doc_id: String,
        #[source]
        source: TaggerError,
    },
}

impl PipelineError {
    pub fn doc_id(&self) -> &str {
        match self {
            Self::Annotate { doc_id, .. } | Self::Tagger { doc_id, .. } => doc_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize record for {doc_id}: {source}")]
    Serialize {
        doc_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid record at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
