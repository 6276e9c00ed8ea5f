pub mod config;
pub mod document;
pub mod error;
pub mod metrics;
pub mod runner;
pub mod writer;

pub use config::PipelineConfig;
pub use document::DocumentExample;
pub use error::{ConfigError, DatasetError, PipelineError};
pub use metrics::{MetricsSnapshot, PipelineMetrics, TimedOperation};
pub use runner::{BatchOutput, DocumentFailure, Pipeline};
pub use writer::{DatasetSink, JsonlDatasetWriter, read_jsonl};
