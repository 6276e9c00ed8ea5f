use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::generate_doc_id;
use crate::page::SourceDocument;

/// Reads layout/OCR exports: one JSON document per file.
pub struct DocumentReader;

impl DocumentReader {
    pub async fn read_file(path: &Path) -> Result<SourceDocument> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "json" => {
                let content = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read file: {:?}", path))?;
                let mut document: SourceDocument = serde_json::from_str(&content)
                    .context(format!("Failed to parse document: {:?}", path))?;

                let path_str = path.to_string_lossy().to_string();
                if document.doc_id.trim().is_empty() {
                    document.doc_id = generate_doc_id(&path_str);
                }
                document.source.get_or_insert(path_str);
                document.pages.sort_by_key(|p| p.page_index);

                Ok(document)
            }
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    /// `.json` files under `dir`, recursively, sorted by path.
    pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.context(format!("Failed to walk directory: {:?}", dir))?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "json") {
                paths.push(path.to_path_buf());
            }
        }
        Ok(paths)
    }

    /// Every document under `dir`. Each file is read independently so one
    /// bad export does not hide the rest.
    pub async fn read_directory(dir: &Path) -> Result<Vec<(PathBuf, Result<SourceDocument>)>> {
        let mut documents = Vec::new();
        for path in Self::list_documents(dir)? {
            let document = Self::read_file(&path).await;
            documents.push((path, document));
        }
        Ok(documents)
    }
}
