use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::document::DocumentExample;
use crate::error::DatasetError;

/// Destination for finished dataset records.
pub trait DatasetSink: Send + Sync {
    /// Persist `examples` in order; returns the number of records written.
    fn write_examples(&self, examples: &[DocumentExample]) -> Result<usize, DatasetError>;
}

/// Newline-delimited JSON file, one record per document.
#[derive(Debug, Clone)]
pub struct JsonlDatasetWriter {
    path: PathBuf,
}

impl JsonlDatasetWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> DatasetError {
        DatasetError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl DatasetSink for JsonlDatasetWriter {
    fn write_examples(&self, examples: &[DocumentExample]) -> Result<usize, DatasetError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);

        for example in examples {
            serde_json::to_writer(&mut writer, example).map_err(|source| {
                DatasetError::Serialize {
                    doc_id: example.doc_id.clone(),
                    source,
                }
            })?;
            writer.write_all(b"\n").map_err(|e| self.io_error(e))?;
        }
        writer.flush().map_err(|e| self.io_error(e))?;

        tracing::info!(path = ?self.path, records = examples.len(), "Wrote dataset");
        Ok(examples.len())
    }
}

/// Read a dataset written by [`JsonlDatasetWriter`]. Blank lines are skipped.
pub fn read_jsonl(path: &Path) -> Result<Vec<DocumentExample>, DatasetError> {
    let io_error = |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_error)?);

    let mut examples = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(io_error)?;
        if line.trim().is_empty() {
            continue;
        }
        let example = serde_json::from_str(&line).map_err(|source| DatasetError::Parse {
            line: index + 1,
            source,
        })?;
        examples.push(example);
    }
    Ok(examples)
}
